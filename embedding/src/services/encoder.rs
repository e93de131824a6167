use std::collections::HashMap;
use std::sync::Arc;

use crate::config::FusionConfig;
use crate::error::EncoderError;
use crate::models::{Embedding, Modality};

/// Turns raw modality input into an embedding. Real encoders live outside
/// this crate; their output is re-validated by the engine.
pub trait ModalityEncoder: Send + Sync {
    fn modality(&self) -> Modality;

    fn dimension(&self) -> usize;

    fn encode(&self, raw: &[u8]) -> Result<Embedding, EncoderError>;
}

/// Reconciles embedding dimensions before a request reaches the engine.
pub trait DimensionAdapter: Send + Sync {
    fn adapt(&self, embeddings: Vec<Embedding>) -> Vec<Embedding>;
}

/// Deterministic stand-in for a pretrained encoder.
///
/// Features are sinusoids seeded by a hash of the input bytes, L2-normalized.
/// Identical input always yields an identical vector.
#[derive(Debug, Clone)]
pub struct ReferenceEncoder {
    modality: Modality,
    dimension: usize,
}

impl ReferenceEncoder {
    pub fn new(modality: Modality, dimension: usize) -> Self {
        Self { modality, dimension }
    }

    fn simple_hash(raw: &[u8]) -> usize {
        raw.iter()
            .fold(0usize, |acc, &b| acc.wrapping_mul(31).wrapping_add(b as usize))
    }

    fn phase(&self) -> (f32, f32) {
        match self.modality {
            Modality::Text => (0.1, 0.01),
            Modality::Image => (0.05, 0.02),
            Modality::Audio => (0.08, 0.03),
            Modality::Video => (0.03, 0.05),
        }
    }
}

impl ModalityEncoder for ReferenceEncoder {
    fn modality(&self) -> Modality {
        self.modality
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, raw: &[u8]) -> Result<Embedding, EncoderError> {
        if raw.is_empty() {
            return Err(EncoderError::EmptyInput(self.modality));
        }
        if self.dimension == 0 {
            return Err(EncoderError::InvalidInput(format!(
                "{} encoder has zero dimension",
                self.modality
            )));
        }

        // Limit hash size to keep the f32 arguments precise
        let seed = Self::simple_hash(raw) % 10_000;
        let (base_freq, jitter_freq) = self.phase();
        let mut vector: Vec<f32> = (0..self.dimension)
            .map(|i| {
                let base = ((seed + i) as f32 * base_freq).sin();
                let jitter = ((seed.wrapping_mul(31).wrapping_add(i) % 100_000) as f32 * jitter_freq)
                    .sin()
                    * 0.1;
                base + jitter
            })
            .collect();

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        } else {
            vector[0] = 1.0;
        }

        Ok(Embedding::new(self.modality, vector))
    }
}

/// Encoders by modality.
#[derive(Clone, Default)]
pub struct EncoderRegistry {
    encoders: HashMap<Modality, Arc<dyn ModalityEncoder>>,
}

impl EncoderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`ReferenceEncoder`] for every registered modality at its expected dimension.
    pub fn reference(config: &FusionConfig) -> Self {
        let mut registry = Self::new();
        for entry in &config.modalities {
            registry.register(Arc::new(ReferenceEncoder::new(entry.modality, entry.dimension)));
        }
        registry
    }

    pub fn register(&mut self, encoder: Arc<dyn ModalityEncoder>) -> &mut Self {
        self.encoders.insert(encoder.modality(), encoder);
        self
    }

    pub fn encode(&self, modality: Modality, raw: &[u8]) -> Result<Embedding, EncoderError> {
        self.encoders
            .get(&modality)
            .ok_or(EncoderError::UnsupportedModality(modality))?
            .encode(raw)
    }
}

/// Cuts every vector to the shortest dimension present.
#[derive(Debug, Default, Clone, Copy)]
pub struct TruncateAdapter;

impl DimensionAdapter for TruncateAdapter {
    fn adapt(&self, embeddings: Vec<Embedding>) -> Vec<Embedding> {
        let Some(min_dim) = embeddings.iter().map(|e| e.vector.len()).min() else {
            return embeddings;
        };
        embeddings
            .into_iter()
            .map(|mut e| {
                e.vector.truncate(min_dim);
                e.dimension = min_dim;
                e
            })
            .collect()
    }
}

/// Zero-extends every vector to the longest dimension present.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZeroPadAdapter;

impl DimensionAdapter for ZeroPadAdapter {
    fn adapt(&self, embeddings: Vec<Embedding>) -> Vec<Embedding> {
        let Some(max_dim) = embeddings.iter().map(|e| e.vector.len()).max() else {
            return embeddings;
        };
        embeddings
            .into_iter()
            .map(|mut e| {
                e.vector.resize(max_dim, 0.0);
                e.dimension = max_dim;
                e
            })
            .collect()
    }
}
