//! Multimodal embedding fusion.
//!
//! [`FusionEngine`] validates per-modality embeddings, normalizes them and
//! combines them with a registered [`FusionStrategy`]. The `handlers` module
//! exposes the engine over HTTP for the `fusion-embedding` binary.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

pub use config::FusionConfig;
pub use error::{CacheError, ConfigError, EncoderError, FusionError, Result};
pub use models::{Embedding, FusedResult, FusionRequest, Modality};
pub use services::{FusionEngine, FusionStrategy, StrategyRegistry};
