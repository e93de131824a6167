//! Fusion strategies and the registry the engine dispatches through.
//!
//! Every strategy receives its inputs in registry priority order, already
//! normalized, and returns a single fused vector. Adding a strategy means
//! implementing [`FusionStrategy`] and registering it; the engine never
//! branches on strategy kind.

pub mod attention;
pub mod concatenation;
pub mod weighted_average;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{FusionConfig, ModalityDimension};
use crate::error::{FusionError, Result};
use crate::models::Modality;

pub use attention::{attention_weights, AttentionFusion};
pub use concatenation::Concatenation;
pub use weighted_average::WeightedAverage;

pub const CONCATENATION: &str = "concatenation";
pub const WEIGHTED_AVERAGE: &str = "weighted_average";
pub const ATTENTION: &str = "attention";

/// One normalized vector handed to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct FusionInput<'a> {
    pub modality: Modality,
    pub vector: &'a [f32],
    pub weight: f32,
}

/// Read-only slice of the engine configuration that strategies may consult.
#[derive(Debug, Clone, Copy)]
pub struct StrategyContext<'a> {
    pub modalities: &'a [ModalityDimension],
    pub pad_missing: bool,
    pub attention_temperature: f32,
}

impl<'a> StrategyContext<'a> {
    pub fn from_config(config: &'a FusionConfig) -> Self {
        Self {
            modalities: &config.modalities,
            pad_missing: config.pad_missing,
            attention_temperature: config.attention_temperature,
        }
    }
}

pub trait FusionStrategy: Send + Sync {
    fn tag(&self) -> &str;

    fn fuse(&self, inputs: &[FusionInput<'_>], ctx: &StrategyContext<'_>) -> Result<Vec<f32>>;
}

/// Strategies keyed by tag, built once at startup.
#[derive(Clone, Default)]
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn FusionStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenation, weighted average and attention fusion.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Concatenation));
        registry.register(Arc::new(WeightedAverage));
        registry.register(Arc::new(AttentionFusion));
        registry
    }

    /// Registers a strategy under its own tag, replacing any previous holder.
    pub fn register(&mut self, strategy: Arc<dyn FusionStrategy>) -> &mut Self {
        self.strategies.insert(strategy.tag().to_string(), strategy);
        self
    }

    pub fn get(&self, tag: &str) -> Result<Arc<dyn FusionStrategy>> {
        self.strategies
            .get(tag)
            .cloned()
            .ok_or_else(|| FusionError::UnknownStrategy(tag.to_string()))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.strategies.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.strategies.keys().cloned().collect();
        tags.sort();
        tags
    }
}

/// Shared dimension of all inputs, or a mismatch naming the first offender.
pub(crate) fn common_dimension(inputs: &[FusionInput<'_>], strategy: &str) -> Result<usize> {
    let first = inputs
        .first()
        .ok_or_else(|| FusionError::validation("no embeddings to fuse"))?;
    let expected = first.vector.len();
    for input in &inputs[1..] {
        if input.vector.len() != expected {
            return Err(FusionError::dimension_mismatch(
                format!("{} ({} vs {})", strategy, first.modality, input.modality),
                expected,
                input.vector.len(),
            ));
        }
    }
    Ok(expected)
}

/// `sum_i weights[i] * vectors[i]`, accumulated in input order.
pub(crate) fn weighted_sum(inputs: &[FusionInput<'_>], weights: &[f32], dimension: usize) -> Vec<f32> {
    let mut result = vec![0.0; dimension];
    for (input, &weight) in inputs.iter().zip(weights.iter()) {
        for (acc, &val) in result.iter_mut().zip(input.vector.iter()) {
            *acc += val * weight;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant;

    impl FusionStrategy for Constant {
        fn tag(&self) -> &str {
            "constant"
        }

        fn fuse(&self, _inputs: &[FusionInput<'_>], _ctx: &StrategyContext<'_>) -> Result<Vec<f32>> {
            Ok(vec![42.0])
        }
    }

    #[test]
    fn test_default_registry() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(
            registry.tags(),
            vec![ATTENTION.to_string(), CONCATENATION.to_string(), WEIGHTED_AVERAGE.to_string()]
        );
        assert!(registry.get(WEIGHTED_AVERAGE).is_ok());
    }

    #[test]
    fn test_unknown_strategy() {
        let registry = StrategyRegistry::with_defaults();
        let err = registry.get("max_pool").err().unwrap();
        assert_eq!(err, FusionError::UnknownStrategy("max_pool".to_string()));
    }

    #[test]
    fn test_custom_strategy_registration() {
        let mut registry = StrategyRegistry::with_defaults();
        registry.register(Arc::new(Constant));
        assert!(registry.contains("constant"));

        let config = FusionConfig::default();
        let ctx = StrategyContext::from_config(&config);
        let out = registry.get("constant").unwrap().fuse(&[], &ctx).unwrap();
        assert_eq!(out, vec![42.0]);
    }

    #[test]
    fn test_common_dimension_mismatch() {
        let a = [1.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let inputs = [
            FusionInput { modality: Modality::Text, vector: &a, weight: 0.5 },
            FusionInput { modality: Modality::Image, vector: &b, weight: 0.5 },
        ];
        let err = common_dimension(&inputs, WEIGHTED_AVERAGE).unwrap_err();
        assert!(matches!(err, FusionError::DimensionMismatch { expected: 2, actual: 3, .. }));
    }
}
