use std::collections::HashMap;

use crate::config::{DimensionStats, NormalizationConfig};
use crate::error::{FusionError, Result};
use crate::models::{l2_norm, Embedding, Modality};

/// How raw vectors are rescaled before fusion.
#[derive(Debug, Clone)]
pub enum NormalizationMode {
    /// Unit length, so dot products act as cosine similarities.
    L2,
    /// `(x - mean) / std` per dimension, statistics supplied externally.
    Standardize(HashMap<Modality, DimensionStats>),
}

impl From<&NormalizationConfig> for NormalizationMode {
    fn from(config: &NormalizationConfig) -> Self {
        match config {
            NormalizationConfig::L2 => Self::L2,
            NormalizationConfig::Standardize { stats } => Self::Standardize(stats.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingNormalizer {
    mode: NormalizationMode,
}

impl Default for EmbeddingNormalizer {
    fn default() -> Self {
        Self::new(NormalizationMode::L2)
    }
}

impl EmbeddingNormalizer {
    pub fn new(mode: NormalizationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> &NormalizationMode {
        &self.mode
    }

    pub fn normalize(&self, embedding: &Embedding) -> Result<Vec<f32>> {
        Self::reject_degenerate(embedding)?;

        match &self.mode {
            NormalizationMode::L2 => {
                // Rescale by the largest magnitude first so the squared sum
                // neither overflows nor underflows for extreme finite inputs.
                let scale = embedding
                    .vector
                    .iter()
                    .fold(0.0f32, |acc, x| acc.max(x.abs()));
                let scaled: Vec<f32> = embedding.vector.iter().map(|x| x / scale).collect();
                let norm = l2_norm(&scaled);
                Ok(scaled.into_iter().map(|x| x / norm).collect())
            }
            NormalizationMode::Standardize(stats) => {
                let stats = stats.get(&embedding.modality).ok_or_else(|| {
                    FusionError::validation(format!(
                        "no standardization statistics for {}",
                        embedding.modality
                    ))
                })?;
                if stats.mean.len() != embedding.vector.len() {
                    return Err(FusionError::dimension_mismatch(
                        format!("{} standardization", embedding.modality),
                        stats.mean.len(),
                        embedding.vector.len(),
                    ));
                }
                let standardized: Vec<f32> = embedding
                    .vector
                    .iter()
                    .zip(stats.mean.iter().zip(stats.std.iter()))
                    .map(|(x, (mean, std))| (x - mean) / std)
                    .collect();
                if standardized.iter().any(|x| !x.is_finite()) {
                    return Err(FusionError::degenerate(
                        embedding.modality,
                        "standardized vector is not finite",
                    ));
                }
                Ok(standardized)
            }
        }
    }

    fn reject_degenerate(embedding: &Embedding) -> Result<()> {
        if !embedding.is_finite() {
            return Err(FusionError::degenerate(
                embedding.modality,
                "vector contains NaN or infinite values",
            ));
        }
        if embedding.vector.iter().all(|x| *x == 0.0) {
            return Err(FusionError::degenerate(embedding.modality, "vector is all zero"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalization() {
        let normalizer = EmbeddingNormalizer::default();
        let embedding = Embedding::new(Modality::Text, vec![3.0, 4.0]);

        let normalized = normalizer.normalize(&embedding).unwrap();

        assert!((normalized[0] - 0.6).abs() < 1e-6);
        assert!((normalized[1] - 0.8).abs() < 1e-6);
        assert!((l2_norm(&normalized) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_unit_norm_for_varied_inputs() {
        let normalizer = EmbeddingNormalizer::default();
        let inputs = vec![
            vec![1e-3, 0.0, 0.0],
            vec![-5.0, 2.5, 1000.0, 0.001],
            vec![1.0; 512],
            (0..384).map(|i| (i as f32 * 0.37).sin()).collect(),
        ];
        for vector in inputs {
            let normalized = normalizer
                .normalize(&Embedding::new(Modality::Image, vector))
                .unwrap();
            assert!((l2_norm(&normalized) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_zero_vector_is_degenerate() {
        let normalizer = EmbeddingNormalizer::default();
        let err = normalizer
            .normalize(&Embedding::new(Modality::Audio, vec![0.0, 0.0, 0.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            FusionError::DegenerateEmbedding { modality: Modality::Audio, .. }
        ));
    }

    #[test]
    fn test_non_finite_is_degenerate() {
        let normalizer = EmbeddingNormalizer::default();
        for bad in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY] {
            let err = normalizer
                .normalize(&Embedding::new(Modality::Text, vec![1.0, bad]))
                .unwrap_err();
            assert!(matches!(err, FusionError::DegenerateEmbedding { .. }));
        }
    }

    #[test]
    fn test_extreme_magnitudes_normalize() {
        let normalizer = EmbeddingNormalizer::default();
        for vector in [vec![f32::MAX, f32::MAX], vec![1e-30, -1e-30, 0.0]] {
            let normalized = normalizer
                .normalize(&Embedding::new(Modality::Text, vector))
                .unwrap();
            assert!((l2_norm(&normalized) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_standardization() {
        let mut stats = HashMap::new();
        stats.insert(
            Modality::Text,
            DimensionStats { mean: vec![1.0, 2.0], std: vec![2.0, 0.5] },
        );
        let normalizer = EmbeddingNormalizer::new(NormalizationMode::Standardize(stats));

        let normalized = normalizer
            .normalize(&Embedding::new(Modality::Text, vec![3.0, 1.0]))
            .unwrap();

        assert_eq!(normalized, vec![1.0, -2.0]);
    }

    #[test]
    fn test_standardization_dimension_mismatch() {
        let mut stats = HashMap::new();
        stats.insert(
            Modality::Text,
            DimensionStats { mean: vec![0.0], std: vec![1.0] },
        );
        let normalizer = EmbeddingNormalizer::new(NormalizationMode::Standardize(stats));

        let err = normalizer
            .normalize(&Embedding::new(Modality::Text, vec![1.0, 2.0]))
            .unwrap_err();
        assert!(matches!(err, FusionError::DimensionMismatch { expected: 1, actual: 2, .. }));
    }

    #[test]
    fn test_standardization_rejects_zero_input() {
        let mut stats = HashMap::new();
        stats.insert(
            Modality::Text,
            DimensionStats { mean: vec![1.0], std: vec![1.0] },
        );
        let normalizer = EmbeddingNormalizer::new(NormalizationMode::Standardize(stats));
        assert!(normalizer
            .normalize(&Embedding::new(Modality::Text, vec![0.0]))
            .is_err());
    }
}
