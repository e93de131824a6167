use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, debug_span};

use fusion_observability::{log_cache, FusionEvent};

use super::cache::{CacheKey, CacheStats, ResultCache};
use super::normalizer::{EmbeddingNormalizer, NormalizationMode};
use super::strategies::{FusionInput, FusionStrategy, StrategyContext, StrategyRegistry};
use crate::config::FusionConfig;
use crate::error::{ConfigError, FusionError, Result};
use crate::models::{Embedding, FusedResult, FusionRequest, Modality};

/// A request that passed validation, with embeddings in priority order.
struct ValidatedRequest<'a> {
    tag: String,
    strategy: Arc<dyn FusionStrategy>,
    embeddings: Vec<&'a Embedding>,
    weights: Vec<f32>,
}

/// Validates, normalizes and fuses per-modality embeddings.
///
/// Holds no per-call state; the optional result cache is the only shared
/// mutable structure, so one engine can serve concurrent callers.
pub struct FusionEngine {
    config: Arc<FusionConfig>,
    normalizer: EmbeddingNormalizer,
    registry: StrategyRegistry,
    cache: Option<ResultCache>,
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> std::result::Result<Self, ConfigError> {
        Self::with_registry(config, StrategyRegistry::with_defaults())
    }

    pub fn with_registry(
        config: FusionConfig,
        registry: StrategyRegistry,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        if !registry.contains(&config.default_strategy) {
            return Err(ConfigError::Invalid(format!(
                "default strategy '{}' is not registered",
                config.default_strategy
            )));
        }

        let normalizer = EmbeddingNormalizer::new(NormalizationMode::from(&config.normalization));
        let cache = config
            .cache
            .enabled
            .then(|| ResultCache::from_config(&config.cache));

        debug!(
            modalities = config.modalities.len(),
            strategies = ?registry.tags(),
            default_strategy = %config.default_strategy,
            cache_enabled = cache.is_some(),
            "Fusion engine initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            normalizer,
            registry,
            cache,
        })
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    pub fn strategies(&self) -> Vec<String> {
        self.registry.tags()
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(ResultCache::stats)
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Shape-check and normalize a single embedding as the pipeline would.
    pub fn normalize(&self, embedding: &Embedding) -> Result<Vec<f32>> {
        embedding.check_shape()?;
        self.normalizer.normalize(embedding)
    }

    pub fn fuse(&self, request: &FusionRequest) -> Result<FusedResult> {
        let start = Instant::now();
        let span = debug_span!(
            "fuse",
            strategy = request
                .strategy
                .as_deref()
                .unwrap_or(&self.config.default_strategy)
        );
        let _enter = span.enter();

        let event = FusionEvent::new(request.embeddings.len())
            .strategy(
                request
                    .strategy
                    .clone()
                    .unwrap_or_else(|| self.config.default_strategy.clone()),
            )
            .request_id(request.request_id.as_deref());

        match self.run_pipeline(request) {
            Ok((result, cache_hit)) => {
                event
                    .success(result.dimension, cache_hit)
                    .duration_ms(start.elapsed().as_secs_f64() * 1000.0)
                    .emit();
                Ok(result)
            }
            Err(err) => {
                event
                    .failure(err.kind(), err.to_string())
                    .duration_ms(start.elapsed().as_secs_f64() * 1000.0)
                    .emit();
                Err(err)
            }
        }
    }

    /// Fuse independent requests in parallel. Output order matches input order.
    pub fn fuse_batch(&self, requests: &[FusionRequest]) -> Vec<Result<FusedResult>> {
        requests.par_iter().map(|request| self.fuse(request)).collect()
    }

    fn run_pipeline(&self, request: &FusionRequest) -> Result<(FusedResult, bool)> {
        let validated = self.validate(request)?;

        let key = self.cache.as_ref().map(|_| {
            let entries: Vec<(&Embedding, f32)> = validated
                .embeddings
                .iter()
                .copied()
                .zip(validated.weights.iter().copied())
                .collect();
            CacheKey::derive(&validated.tag, &entries)
        });

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                log_cache!(hit, key.as_str());
                // Same value, but each call gets its own id and timestamp
                let result = FusedResult::new(hit.vector.clone(), hit.modalities.clone(), hit.strategy.clone());
                return Ok((result, true));
            }
            log_cache!(miss, key.as_str());
        }

        let normalized = validated
            .embeddings
            .iter()
            .map(|embedding| self.normalizer.normalize(embedding))
            .collect::<Result<Vec<Vec<f32>>>>()?;

        let inputs: Vec<FusionInput<'_>> = validated
            .embeddings
            .iter()
            .zip(normalized.iter())
            .zip(validated.weights.iter())
            .map(|((embedding, vector), &weight)| FusionInput {
                modality: embedding.modality,
                vector,
                weight,
            })
            .collect();

        let ctx = StrategyContext::from_config(&self.config);
        let vector = validated.strategy.fuse(&inputs, &ctx)?;
        if let Some(first) = inputs.first() {
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(FusionError::degenerate(
                    first.modality,
                    format!("{} produced a non-finite fused vector", validated.tag),
                ));
            }
        }

        let modalities: Vec<Modality> = validated.embeddings.iter().map(|e| e.modality).collect();
        let result = FusedResult::new(vector, modalities, validated.tag);

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            let key_str = key.as_str().to_string();
            match cache.put(key, Arc::new(result.clone())) {
                Ok(()) => {
                    log_cache!(set, key_str.as_str());
                }
                Err(err) => {
                    log_cache!(set_failed, key_str.as_str(), err);
                }
            }
        }

        Ok((result, false))
    }

    fn validate<'a>(&self, request: &'a FusionRequest) -> Result<ValidatedRequest<'a>> {
        if request.embeddings.is_empty() {
            return Err(FusionError::validation("request contains no embeddings"));
        }

        // Fixed modality order keeps the reported fault deterministic
        let entries = Modality::ALL
            .iter()
            .filter_map(|m| request.embeddings.get_key_value(m));
        for (modality, embedding) in entries {
            if embedding.modality != *modality {
                return Err(FusionError::validation(format!(
                    "embedding keyed as {} is tagged {}",
                    modality, embedding.modality
                )));
            }
            if !self.config.is_registered(*modality) {
                return Err(FusionError::validation(format!(
                    "modality {} is not registered",
                    modality
                )));
            }
            embedding.check_shape()?;
        }

        let tag = request
            .strategy
            .clone()
            .unwrap_or_else(|| self.config.default_strategy.clone());
        let strategy = self.registry.get(&tag)?;

        // Registry order is the priority order handed to strategies
        let embeddings: Vec<&Embedding> = self
            .config
            .registered_modalities()
            .filter_map(|m| request.embeddings.get(&m))
            .collect();

        let weights = self.resolve_weights(request, &embeddings)?;

        Ok(ValidatedRequest {
            tag,
            strategy,
            embeddings,
            weights,
        })
    }

    /// Request weights, else configured defaults, else uniform; summing to one.
    fn resolve_weights(&self, request: &FusionRequest, embeddings: &[&Embedding]) -> Result<Vec<f32>> {
        let raw: Vec<f32> = match &request.weights {
            Some(weights) => {
                if let Some((modality, weight)) =
                    weights.iter().find(|(_, w)| !w.is_finite() || **w < 0.0)
                {
                    return Err(FusionError::validation(format!(
                        "weight for {} must be finite and non-negative, got {}",
                        modality, weight
                    )));
                }
                embeddings
                    .iter()
                    .map(|e| {
                        weights.get(&e.modality).copied().ok_or_else(|| {
                            FusionError::validation(format!("missing weight for {}", e.modality))
                        })
                    })
                    .collect::<Result<Vec<f32>>>()?
            }
            None => match &self.config.default_weights {
                Some(defaults) => embeddings
                    .iter()
                    .map(|e| defaults.get(&e.modality).copied().unwrap_or(1.0))
                    .collect(),
                None => vec![1.0; embeddings.len()],
            },
        };

        let total: f32 = raw.iter().sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(FusionError::validation(
                "at least one present modality needs a positive weight",
            ));
        }
        Ok(raw.into_iter().map(|w| w / total).collect())
    }
}
