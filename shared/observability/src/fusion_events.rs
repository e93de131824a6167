//! Structured logging of fusion outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of a fusion call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FusionOutcome {
    Success,
    Failure,
}

impl std::fmt::Display for FusionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// One fuse() call, as logged under target `fusion_event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionEvent {
    pub timestamp: DateTime<Utc>,
    pub outcome: FusionOutcome,
    pub strategy: Option<String>,
    pub modalities: usize,
    pub dimension: Option<usize>,
    pub duration_ms: f64,
    pub cache_hit: bool,
    pub request_id: Option<String>,
    /// Error kind for failures (e.g. "dimension_mismatch")
    pub error_kind: Option<String>,
    pub error: Option<String>,
}

impl FusionEvent {
    pub fn new(modalities: usize) -> FusionEventBuilder {
        FusionEventBuilder {
            event: FusionEvent {
                timestamp: Utc::now(),
                outcome: FusionOutcome::Success,
                strategy: None,
                modalities,
                dimension: None,
                duration_ms: 0.0,
                cache_hit: false,
                request_id: None,
                error_kind: None,
                error: None,
            },
        }
    }
}

/// Builder for fusion events
pub struct FusionEventBuilder {
    event: FusionEvent,
}

impl FusionEventBuilder {
    pub fn strategy(mut self, strategy: impl Into<String>) -> Self {
        self.event.strategy = Some(strategy.into());
        self
    }

    pub fn request_id(mut self, request_id: Option<&str>) -> Self {
        self.event.request_id = request_id.map(str::to_string);
        self
    }

    pub fn success(mut self, dimension: usize, cache_hit: bool) -> Self {
        self.event.outcome = FusionOutcome::Success;
        self.event.dimension = Some(dimension);
        self.event.cache_hit = cache_hit;
        self
    }

    pub fn failure(mut self, kind: impl Into<String>, error: impl Into<String>) -> Self {
        self.event.outcome = FusionOutcome::Failure;
        self.event.error_kind = Some(kind.into());
        self.event.error = Some(error.into());
        self
    }

    pub fn duration_ms(mut self, ms: f64) -> Self {
        self.event.duration_ms = ms;
        self
    }

    pub fn build(self) -> FusionEvent {
        self.event
    }

    /// Build and emit the event as a log. Failures log at debug: the caller
    /// receives the error and decides whether it matters.
    pub fn emit(self) -> FusionEvent {
        let event = self.build();
        match event.outcome {
            FusionOutcome::Success => tracing::info!(
                target: "fusion_event",
                outcome = %event.outcome,
                strategy = ?event.strategy,
                modalities = event.modalities,
                dimension = ?event.dimension,
                duration_ms = event.duration_ms,
                cache_hit = event.cache_hit,
                request_id = ?event.request_id,
                "fusion completed"
            ),
            FusionOutcome::Failure => tracing::debug!(
                target: "fusion_event",
                outcome = %event.outcome,
                strategy = ?event.strategy,
                modalities = event.modalities,
                duration_ms = event.duration_ms,
                request_id = ?event.request_id,
                error_kind = ?event.error_kind,
                error = ?event.error,
                "fusion failed"
            ),
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_event() {
        let event = FusionEvent::new(2)
            .strategy("attention")
            .request_id(Some("req-7"))
            .success(384, true)
            .duration_ms(0.25)
            .build();

        assert_eq!(event.outcome, FusionOutcome::Success);
        assert_eq!(event.dimension, Some(384));
        assert!(event.cache_hit);
        assert_eq!(event.request_id.as_deref(), Some("req-7"));
    }

    #[test]
    fn test_failure_event_serializes() {
        let event = FusionEvent::new(0)
            .failure("validation_error", "no embeddings")
            .emit();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"], "failure");
        assert_eq!(json["error_kind"], "validation_error");
        assert!(json["dimension"].is_null());
    }
}
