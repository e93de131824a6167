use thiserror::Error;

use crate::models::Modality;

/// Errors raised synchronously by [`crate::services::FusionEngine::fuse`].
///
/// A failed call leaves no partial result behind and never touches the cache,
/// so every variant is retryable once the input is corrected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    #[error("Invalid fusion request: {0}")]
    Validation(String),
    #[error("Unknown fusion strategy: {0}")]
    UnknownStrategy(String),
    #[error("Dimension mismatch for {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },
    #[error("Degenerate {modality} embedding: {reason}")]
    DegenerateEmbedding { modality: Modality, reason: String },
}

impl FusionError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn dimension_mismatch(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    pub fn degenerate(modality: Modality, reason: impl Into<String>) -> Self {
        Self::DegenerateEmbedding {
            modality,
            reason: reason.into(),
        }
    }

    /// Stable snake_case name used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::UnknownStrategy(_) => "unknown_strategy",
            Self::DimensionMismatch { .. } => "dimension_mismatch",
            Self::DegenerateEmbedding { .. } => "degenerate_embedding",
        }
    }
}

pub type Result<T> = std::result::Result<T, FusionError>;

/// Invalid or unreadable engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures of a best-effort cache write.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CacheError {
    #[error("Entry too large: dimension {dimension} exceeds limit {limit}")]
    EntryTooLarge { dimension: usize, limit: usize },
    #[error("Cache has zero capacity")]
    Disabled,
}

/// Errors from a [`crate::services::encoder::ModalityEncoder`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncoderError {
    #[error("Empty {0} input")]
    EmptyInput(Modality),
    #[error("No encoder registered for modality: {0}")]
    UnsupportedModality(Modality),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(FusionError::validation("x").kind(), "validation_error");
        assert_eq!(
            FusionError::UnknownStrategy("nope".to_string()).kind(),
            "unknown_strategy"
        );
        assert_eq!(
            FusionError::dimension_mismatch("weighted_average", 3, 4).kind(),
            "dimension_mismatch"
        );
        assert_eq!(
            FusionError::degenerate(Modality::Text, "all zero").kind(),
            "degenerate_embedding"
        );
    }

    #[test]
    fn test_error_messages() {
        let err = FusionError::dimension_mismatch("image", 512, 384);
        assert_eq!(
            err.to_string(),
            "Dimension mismatch for image: expected 512, got 384"
        );

        let err = FusionError::degenerate(Modality::Audio, "vector norm is zero");
        assert_eq!(err.to_string(), "Degenerate audio embedding: vector norm is zero");
    }
}
