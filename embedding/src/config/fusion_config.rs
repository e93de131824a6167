use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::models::Modality;

/// Immutable engine configuration, injected at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Registered modalities with their expected dimension. Order is priority order.
    pub modalities: Vec<ModalityDimension>,
    pub default_strategy: String,
    /// Weights used when a request carries none; unlisted modalities weigh 1.0.
    pub default_weights: Option<HashMap<Modality, f32>>,
    pub normalization: NormalizationConfig,
    /// Concatenation zero-pads absent modalities when true (stable output
    /// dimension) and omits them when false (compact, variable dimension).
    pub pad_missing: bool,
    pub attention_temperature: f32,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalityDimension {
    pub modality: Modality,
    pub dimension: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum NormalizationConfig {
    #[default]
    L2,
    /// Per-dimension standardization with externally computed statistics.
    Standardize {
        stats: HashMap<Modality, DimensionStats>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionStats {
    pub mean: Vec<f32>,
    pub std: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    #[default]
    Lru,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
    pub ttl_seconds: Option<u64>,
    /// Results longer than this are not cached.
    pub max_entry_dimension: usize,
    pub eviction: EvictionPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1024,
            ttl_seconds: Some(300), // 5 minutes
            max_entry_dimension: 65_536,
            eviction: EvictionPolicy::Lru,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_seconds.map(Duration::from_secs)
    }
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            modalities: vec![
                ModalityDimension { modality: Modality::Text, dimension: 384 },
                ModalityDimension { modality: Modality::Image, dimension: 512 },
                ModalityDimension { modality: Modality::Audio, dimension: 384 },
            ],
            default_strategy: "weighted_average".to_string(),
            default_weights: None,
            normalization: NormalizationConfig::L2,
            pad_missing: true,
            attention_temperature: 1.0,
            cache: CacheConfig::default(),
        }
    }
}

impl FusionConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: FusionConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_modalities(mut self, modalities: &[(Modality, usize)]) -> Self {
        self.modalities = modalities
            .iter()
            .map(|&(modality, dimension)| ModalityDimension { modality, dimension })
            .collect();
        self
    }

    pub fn with_default_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.default_strategy = strategy.into();
        self
    }

    pub fn with_pad_missing(mut self, pad_missing: bool) -> Self {
        self.pad_missing = pad_missing;
        self
    }

    pub fn with_attention_temperature(mut self, temperature: f32) -> Self {
        self.attention_temperature = temperature;
        self
    }

    pub fn with_normalization(mut self, normalization: NormalizationConfig) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    pub fn expected_dimension(&self, modality: Modality) -> Option<usize> {
        self.modalities
            .iter()
            .find(|m| m.modality == modality)
            .map(|m| m.dimension)
    }

    pub fn is_registered(&self, modality: Modality) -> bool {
        self.expected_dimension(modality).is_some()
    }

    pub fn registered_modalities(&self) -> impl Iterator<Item = Modality> + '_ {
        self.modalities.iter().map(|m| m.modality)
    }

    /// Sum of every registered expected dimension.
    pub fn total_dimension(&self) -> usize {
        self.modalities.iter().map(|m| m.dimension).sum()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modalities.is_empty() {
            return Err(ConfigError::Invalid("no modalities registered".to_string()));
        }

        let mut seen = HashSet::new();
        for entry in &self.modalities {
            if !seen.insert(entry.modality) {
                return Err(ConfigError::Invalid(format!(
                    "modality {} registered more than once",
                    entry.modality
                )));
            }
            if entry.dimension == 0 {
                return Err(ConfigError::Invalid(format!(
                    "modality {} has zero dimension",
                    entry.modality
                )));
            }
        }

        if self.default_strategy.trim().is_empty() {
            return Err(ConfigError::Invalid("default strategy is empty".to_string()));
        }

        // Subnormal temperatures push scaled scores past f32::MAX
        if !self.attention_temperature.is_normal() || self.attention_temperature < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "attention temperature must be a positive normal float, got {}",
                self.attention_temperature
            )));
        }

        if let Some(weights) = &self.default_weights {
            if weights.values().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(ConfigError::Invalid(
                    "default weights must be finite and non-negative".to_string(),
                ));
            }
            let any_positive = self
                .registered_modalities()
                .any(|m| weights.get(&m).copied().unwrap_or(1.0) > 0.0);
            if !any_positive {
                return Err(ConfigError::Invalid(
                    "default weights leave no registered modality with positive weight".to_string(),
                ));
            }
        }

        if let NormalizationConfig::Standardize { stats } = &self.normalization {
            for entry in &self.modalities {
                let s = stats.get(&entry.modality).ok_or_else(|| {
                    ConfigError::Invalid(format!(
                        "missing standardization stats for {}",
                        entry.modality
                    ))
                })?;
                if s.mean.len() != entry.dimension || s.std.len() != entry.dimension {
                    return Err(ConfigError::Invalid(format!(
                        "standardization stats for {} must have {} entries",
                        entry.modality, entry.dimension
                    )));
                }
                if s.mean.iter().any(|m| !m.is_finite())
                    || s.std.iter().any(|d| !d.is_finite() || *d <= 0.0)
                {
                    return Err(ConfigError::Invalid(format!(
                        "standardization stats for {} must be finite with positive std",
                        entry.modality
                    )));
                }
            }
        }

        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(ConfigError::Invalid(
                "cache is enabled with zero capacity".to_string(),
            ));
        }

        Ok(())
    }
}
