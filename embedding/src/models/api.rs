use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::embedding::Modality;
use super::fusion::{FusedResult, FusionRequest};
use crate::config::ModalityDimension;
use crate::error::FusionError;

#[derive(Debug, Serialize, Deserialize)]
pub struct PingResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: f64,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub strategies: Vec<String>,
    pub default_strategy: String,
    pub modalities: Vec<ModalityDimension>,
    pub cache_enabled: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StrategiesResponse {
    pub strategies: Vec<String>,
    pub default: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl ErrorResponse {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            kind: None,
        }
    }
}

impl From<&FusionError> for ErrorResponse {
    fn from(err: &FusionError) -> Self {
        Self {
            error: err.to_string(),
            kind: Some(err.kind().to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchFuseRequest {
    pub requests: Vec<FusionRequest>,
}

/// One slot of a batch response; exactly one of `ok` / `error` is set.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchItemResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<FusedResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchFuseResponse {
    pub results: Vec<BatchItemResult>,
    pub successful: usize,
    pub failed: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignMode {
    Truncate,
    Pad,
}

/// Raw inputs for the encode-then-fuse demo endpoint.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MultimodalRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image_base64: Option<String>,
    #[serde(default)]
    pub audio_base64: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub weights: Option<HashMap<Modality, f32>>,
    #[serde(default)]
    pub align: Option<AlignMode>,
}
