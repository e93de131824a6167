use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{FusionError, Result};

/// Supported input modalities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
}

impl Modality {
    pub const ALL: [Modality; 4] = [Modality::Text, Modality::Image, Modality::Audio, Modality::Video];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed-length vector produced by one modality encoder.
///
/// Encoder output is untrusted: `dimension` is the length the encoder claims,
/// and the engine re-checks it (and finiteness) before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub modality: Modality,
    pub vector: Vec<f32>,
    pub dimension: usize,
}

impl Embedding {
    pub fn new(modality: Modality, vector: Vec<f32>) -> Self {
        let dimension = vector.len();
        Self {
            modality,
            vector,
            dimension,
        }
    }

    /// One-hot vector of `dimension` with a 1.0 at `index`.
    pub fn one_hot(modality: Modality, dimension: usize, index: usize) -> Result<Self> {
        if index >= dimension {
            return Err(FusionError::validation(format!(
                "one-hot index {} is out of range for {} dimension {}",
                index, modality, dimension
            )));
        }
        let mut vector = vec![0.0; dimension];
        vector[index] = 1.0;
        Ok(Self::new(modality, vector))
    }

    /// Structural check: non-empty and declared dimension matches the payload.
    pub fn check_shape(&self) -> Result<()> {
        if self.vector.is_empty() {
            return Err(FusionError::validation(format!(
                "{} embedding vector is empty",
                self.modality
            )));
        }
        if self.dimension != self.vector.len() {
            return Err(FusionError::validation(format!(
                "{} embedding declares dimension {} but carries {} values",
                self.modality,
                self.dimension,
                self.vector.len()
            )));
        }
        Ok(())
    }

    pub fn is_finite(&self) -> bool {
        self.vector.iter().all(|x| x.is_finite())
    }

    pub fn norm(&self) -> f32 {
        l2_norm(&self.vector)
    }

    /// SHA-256 over the little-endian bytes of the vector.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        for value in &self.vector {
            hasher.update(value.to_le_bytes());
        }
        hex::encode(hasher.finalize())
    }
}

pub fn l2_norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity in `[-1, 1]`; zero when either vector has zero norm.
///
/// Each vector is rescaled by its largest magnitude before the products are
/// taken, so finite inputs of any size never overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (Some(a), Some(b)) = (unit_scaled(a), unit_scaled(b)) else {
        return 0.0;
    };
    let norm_a = l2_norm(&a);
    let norm_b = l2_norm(&b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let cosine = dot(&a, &b) / (norm_a * norm_b);
    if cosine.is_finite() {
        cosine.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Vector divided by its largest finite magnitude; `None` for all-zero or non-finite input.
fn unit_scaled(vector: &[f32]) -> Option<Vec<f32>> {
    let scale = vector.iter().fold(0.0f32, |acc, x| acc.max(x.abs()));
    if scale == 0.0 || !scale.is_finite() {
        return None;
    }
    Some(vector.iter().map(|x| x / scale).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_creation() {
        let embedding = Embedding::new(Modality::Text, vec![1.0, 2.0, 3.0]);
        assert_eq!(embedding.dimension, 3);
        assert_eq!(embedding.modality, Modality::Text);
        assert!(embedding.check_shape().is_ok());
    }

    #[test]
    fn test_declared_dimension_mismatch() {
        let mut embedding = Embedding::new(Modality::Image, vec![1.0, 2.0]);
        embedding.dimension = 3;
        assert!(matches!(embedding.check_shape(), Err(FusionError::Validation(_))));
    }

    #[test]
    fn test_empty_embedding_rejected() {
        let embedding = Embedding::new(Modality::Audio, vec![]);
        assert!(matches!(embedding.check_shape(), Err(FusionError::Validation(_))));
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = Embedding::new(Modality::Text, vec![0.5, -0.25]);
        let b = Embedding::new(Modality::Image, vec![0.5, -0.25]);
        let c = Embedding::new(Modality::Text, vec![0.5, -0.26]);
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.content_hash(), c.content_hash());
        assert_eq!(a.content_hash().len(), 64);
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_of_large_vectors() {
        // Squared components overflow f32 without rescaling
        let a = [1e20, 5e19];
        let b = [5e19, 1e20];
        let cosine = cosine_similarity(&a, &b);
        assert!((cosine - 0.8).abs() < 1e-6);

        let max = [f32::MAX, f32::MAX];
        assert!((cosine_similarity(&max, &max) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_one_hot() {
        let embedding = Embedding::one_hot(Modality::Image, 4, 2).unwrap();
        assert_eq!(embedding.vector, vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(embedding.dimension, 4);

        assert!(matches!(
            Embedding::one_hot(Modality::Image, 4, 4),
            Err(FusionError::Validation(_))
        ));
    }

    #[test]
    fn test_modality_serde() {
        let json = serde_json::to_string(&Modality::Audio).unwrap();
        assert_eq!(json, "\"audio\"");
        let parsed: Modality = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(parsed, Modality::Video);
    }
}
