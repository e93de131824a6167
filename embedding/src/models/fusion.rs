use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::embedding::{Embedding, Modality};
use crate::services::encoder::DimensionAdapter;

/// A single fusion call: one embedding per modality plus strategy selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FusionRequest {
    pub embeddings: HashMap<Modality, Embedding>,
    /// Strategy tag; the configured default applies when absent.
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub weights: Option<HashMap<Modality, f32>>,
    /// Caller label, not part of the cache key.
    #[serde(default)]
    pub request_id: Option<String>,
}

impl FusionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an embedding keyed by its own modality, replacing any previous one.
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embeddings.insert(embedding.modality, embedding);
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = Some(strategy.into());
        self
    }

    pub fn with_weight(mut self, modality: Modality, weight: f32) -> Self {
        self.weights
            .get_or_insert_with(HashMap::new)
            .insert(modality, weight);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Reconcile dimensions with an external adapter before the engine sees the request.
    pub fn adapted(mut self, adapter: &dyn DimensionAdapter) -> Self {
        let embeddings: Vec<Embedding> = self.embeddings.drain().map(|(_, e)| e).collect();
        self.embeddings = adapter
            .adapt(embeddings)
            .into_iter()
            .map(|e| (e.modality, e))
            .collect();
        self
    }
}

/// Output of one successful fuse() call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub id: Uuid,
    pub vector: Vec<f32>,
    /// Contributing modalities in registry priority order.
    pub modalities: Vec<Modality>,
    pub strategy: String,
    pub dimension: usize,
    pub timestamp: DateTime<Utc>,
}

impl FusedResult {
    pub fn new(vector: Vec<f32>, modalities: Vec<Modality>, strategy: impl Into<String>) -> Self {
        let dimension = vector.len();
        Self {
            id: Uuid::new_v4(),
            vector,
            modalities,
            strategy: strategy.into(),
            dimension,
            timestamp: Utc::now(),
        }
    }
}
