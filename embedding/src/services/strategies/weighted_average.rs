use super::{common_dimension, weighted_sum, FusionInput, FusionStrategy, StrategyContext, WEIGHTED_AVERAGE};
use crate::error::{FusionError, Result};

/// `sum_i w_i * v_i` with weights renormalized to sum to one.
///
/// All inputs must share one dimension; no implicit projection is done.
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedAverage;

impl WeightedAverage {
    pub(crate) fn renormalize(inputs: &[FusionInput<'_>]) -> Result<Vec<f32>> {
        let total: f32 = inputs.iter().map(|i| i.weight).sum();
        if !total.is_finite() || total <= 0.0 {
            return Err(FusionError::validation(format!(
                "weights must sum to a positive finite value, got {}",
                total
            )));
        }
        Ok(inputs.iter().map(|i| i.weight / total).collect())
    }
}

impl FusionStrategy for WeightedAverage {
    fn tag(&self) -> &str {
        WEIGHTED_AVERAGE
    }

    fn fuse(&self, inputs: &[FusionInput<'_>], _ctx: &StrategyContext<'_>) -> Result<Vec<f32>> {
        let dimension = common_dimension(inputs, WEIGHTED_AVERAGE)?;
        let weights = Self::renormalize(inputs)?;
        Ok(weighted_sum(inputs, &weights, dimension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::models::Modality;

    fn inputs<'a>(a: &'a [f32], b: &'a [f32], wa: f32, wb: f32) -> [FusionInput<'a>; 2] {
        [
            FusionInput { modality: Modality::Text, vector: a, weight: wa },
            FusionInput { modality: Modality::Image, vector: b, weight: wb },
        ]
    }

    #[test]
    fn test_weighted_average() {
        let config = FusionConfig::default();
        let ctx = StrategyContext::from_config(&config);
        let a = [1.0, 2.0];
        let b = [3.0, 4.0];

        let fused = WeightedAverage.fuse(&inputs(&a, &b, 0.3, 0.7), &ctx).unwrap();

        assert!((fused[0] - (0.3 * 1.0 + 0.7 * 3.0)).abs() < 1e-6);
        assert!((fused[1] - (0.3 * 2.0 + 0.7 * 4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_weights_are_renormalized() {
        let config = FusionConfig::default();
        let ctx = StrategyContext::from_config(&config);
        let a = [0.6, 0.8];
        let b = [1.0, 0.0];

        let scaled = WeightedAverage.fuse(&inputs(&a, &b, 2.0, 2.0), &ctx).unwrap();
        let unit = WeightedAverage.fuse(&inputs(&a, &b, 1.0, 1.0), &ctx).unwrap();

        for (x, y) in scaled.iter().zip(unit.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
        assert!((unit[0] - 0.8).abs() < 1e-6);
        assert!((unit[1] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_identical_inputs_are_idempotent() {
        let config = FusionConfig::default();
        let ctx = StrategyContext::from_config(&config);
        let v = [0.6, 0.0, -0.8];

        let fused = WeightedAverage.fuse(&inputs(&v, &v, 0.25, 0.75), &ctx).unwrap();

        for (x, y) in fused.iter().zip(v.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn test_dimension_mismatch() {
        let config = FusionConfig::default();
        let ctx = StrategyContext::from_config(&config);
        let a = [1.0, 2.0];
        let b = [3.0, 4.0, 5.0];

        let err = WeightedAverage.fuse(&inputs(&a, &b, 1.0, 1.0), &ctx).unwrap_err();
        assert!(matches!(err, FusionError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_zero_total_weight() {
        let config = FusionConfig::default();
        let ctx = StrategyContext::from_config(&config);
        let a = [1.0];
        let b = [2.0];

        let err = WeightedAverage.fuse(&inputs(&a, &b, 0.0, 0.0), &ctx).unwrap_err();
        assert!(matches!(err, FusionError::Validation(_)));
    }
}
