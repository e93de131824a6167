use super::{common_dimension, weighted_sum, FusionInput, FusionStrategy, StrategyContext, ATTENTION};
use crate::error::Result;
use crate::models::cosine_similarity;

/// Similarity-driven weighting with no learned parameters.
///
/// Each modality is scored by its mean cosine similarity to the other present
/// vectors; a temperature-scaled softmax turns scores into weights, which are
/// then applied as in a weighted average. Supplied request weights are ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttentionFusion;

impl FusionStrategy for AttentionFusion {
    fn tag(&self) -> &str {
        ATTENTION
    }

    fn fuse(&self, inputs: &[FusionInput<'_>], ctx: &StrategyContext<'_>) -> Result<Vec<f32>> {
        let dimension = common_dimension(inputs, ATTENTION)?;
        let vectors: Vec<&[f32]> = inputs.iter().map(|i| i.vector).collect();
        let weights = attention_weights(&vectors, ctx.attention_temperature);
        Ok(weighted_sum(inputs, &weights, dimension))
    }
}

/// Softmax weights over mean pairwise cosine similarity.
///
/// A single vector gets weight 1.0. The result always sums to one: when the
/// temperature is so small that scaled scores leave the f32 range, the weights
/// collapse to the zero-temperature limit (uniform over the top scores).
pub fn attention_weights(vectors: &[&[f32]], temperature: f32) -> Vec<f32> {
    let n = vectors.len();
    if n == 0 {
        return Vec::new();
    }
    if n == 1 {
        return vec![1.0];
    }

    let scores: Vec<f32> = (0..n)
        .map(|i| {
            let total: f32 = (0..n)
                .filter(|&j| j != i)
                .map(|j| cosine_similarity(vectors[i], vectors[j]))
                .sum();
            total / (n - 1) as f32
        })
        .collect();

    softmax_with_temperature(&scores, temperature)
}

fn softmax_with_temperature(scores: &[f32], temperature: f32) -> Vec<f32> {
    let scaled: Vec<f32> = scores.iter().map(|&s| s / temperature).collect();
    if scaled.iter().any(|s| !s.is_finite()) {
        return hard_max(scores);
    }

    // Numerical stability: subtract max
    let max_score = scaled.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exp_values: Vec<f32> = scaled.iter().map(|&s| (s - max_score).exp()).collect();
    let exp_sum: f32 = exp_values.iter().sum();
    if !exp_sum.is_finite() || exp_sum <= 0.0 {
        return hard_max(scores);
    }

    exp_values.into_iter().map(|e| e / exp_sum).collect()
}

/// Equal weight over every score tied for the maximum.
fn hard_max(scores: &[f32]) -> Vec<f32> {
    let max_score = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let winners = scores.iter().filter(|&&s| s == max_score).count();
    if winners == 0 {
        return vec![1.0 / scores.len() as f32; scores.len()];
    }
    scores
        .iter()
        .map(|&s| if s == max_score { 1.0 / winners as f32 } else { 0.0 })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FusionConfig;
    use crate::error::FusionError;
    use crate::models::Modality;

    #[test]
    fn test_weights_sum_to_one() {
        let a = [1.0, 0.0, 0.0];
        let b = [0.6, 0.8, 0.0];
        let c = [0.0, 0.0, 1.0];
        for temperature in [0.05, 0.5, 1.0, 4.0, 100.0] {
            let weights = attention_weights(&[&a, &b, &c], temperature);
            let total: f32 = weights.iter().sum();
            assert!((total - 1.0).abs() < 1e-6, "temperature {}", temperature);
            assert!(weights.iter().all(|w| *w > 0.0));
        }
    }

    #[test]
    fn test_outlier_gets_less_weight() {
        let a = [1.0, 0.0];
        let b = [0.995, 0.0998];
        let outlier = [-1.0, 0.0];

        let weights = attention_weights(&[&a, &b, &outlier], 1.0);

        assert!(weights[2] < weights[0]);
        assert!(weights[2] < weights[1]);
    }

    #[test]
    fn test_lower_temperature_sharpens() {
        let a = [1.0, 0.0];
        let b = [0.8, 0.6];
        let c = [0.0, 1.0];

        let soft = attention_weights(&[&a, &b, &c], 10.0);
        let sharp = attention_weights(&[&a, &b, &c], 0.1);

        let spread = |w: &[f32]| {
            w.iter().copied().fold(f32::MIN, f32::max) - w.iter().copied().fold(f32::MAX, f32::min)
        };
        assert!(spread(&sharp) > spread(&soft));
    }

    #[test]
    fn test_two_vectors_get_equal_weight() {
        // Pairwise similarity is symmetric, so both scores coincide.
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let weights = attention_weights(&[&a, &b], 1.0);
        assert!((weights[0] - 0.5).abs() < 1e-6);
        assert!((weights[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_vanishing_temperature_collapses_to_argmax() {
        let a = [1.0, 0.0];
        let b = [0.995, 0.0998];
        let outlier = [-1.0, 0.0];

        for temperature in [1e-40, f32::MIN_POSITIVE, 0.0] {
            let weights = attention_weights(&[&a, &b, &outlier], temperature);
            assert!(weights.iter().all(|w| w.is_finite()), "temperature {}", temperature);
            assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-6);
            assert_eq!(weights[2], 0.0);
        }
    }

    #[test]
    fn test_vanishing_temperature_splits_ties() {
        let a = [1.0, 0.0];
        let b = [0.6, 0.8];
        let weights = attention_weights(&[&a, &b], 1e-40);
        assert_eq!(weights, vec![0.5, 0.5]);
    }

    #[test]
    fn test_large_vectors_keep_finite_weights() {
        let a = [1e20, 5e19];
        let b = [5e19, 1e20];
        let c = [-1e20, 1e20];
        let weights = attention_weights(&[&a, &b, &c], 1.0);
        assert!(weights.iter().all(|w| w.is_finite() && *w > 0.0));
        assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_vector() {
        let a = [0.6, 0.8];
        assert_eq!(attention_weights(&[&a], 1.0), vec![1.0]);
    }

    #[test]
    fn test_attention_fusion_is_deterministic() {
        let config = FusionConfig::default().with_attention_temperature(0.5);
        let ctx = StrategyContext::from_config(&config);
        let a = [1.0, 0.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let c = [0.6, 0.8, 0.0];
        let inputs = [
            FusionInput { modality: Modality::Text, vector: &a, weight: 1.0 },
            FusionInput { modality: Modality::Image, vector: &b, weight: 1.0 },
            FusionInput { modality: Modality::Audio, vector: &c, weight: 1.0 },
        ];

        let first = AttentionFusion.fuse(&inputs, &ctx).unwrap();
        let second = AttentionFusion.fuse(&inputs, &ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[test]
    fn test_attention_ignores_supplied_weights() {
        let config = FusionConfig::default();
        let ctx = StrategyContext::from_config(&config);
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        let heavy = [
            FusionInput { modality: Modality::Text, vector: &a, weight: 100.0 },
            FusionInput { modality: Modality::Image, vector: &b, weight: 1.0 },
        ];
        let light = [
            FusionInput { modality: Modality::Text, vector: &a, weight: 1.0 },
            FusionInput { modality: Modality::Image, vector: &b, weight: 100.0 },
        ];

        assert_eq!(
            AttentionFusion.fuse(&heavy, &ctx).unwrap(),
            AttentionFusion.fuse(&light, &ctx).unwrap()
        );
    }

    #[test]
    fn test_attention_dimension_mismatch() {
        let config = FusionConfig::default();
        let ctx = StrategyContext::from_config(&config);
        let a = [1.0, 0.0];
        let b = [0.0, 1.0, 0.0];
        let inputs = [
            FusionInput { modality: Modality::Text, vector: &a, weight: 1.0 },
            FusionInput { modality: Modality::Audio, vector: &b, weight: 1.0 },
        ];

        assert!(matches!(
            AttentionFusion.fuse(&inputs, &ctx),
            Err(FusionError::DimensionMismatch { .. })
        ));
    }
}
