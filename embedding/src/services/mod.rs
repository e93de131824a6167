pub mod cache;
pub mod encoder;
pub mod fusion;
pub mod normalizer;
pub mod strategies;

pub use cache::{CacheKey, CacheStats, ResultCache};
pub use encoder::{
    DimensionAdapter, EncoderRegistry, ModalityEncoder, ReferenceEncoder, TruncateAdapter,
    ZeroPadAdapter,
};
pub use fusion::FusionEngine;
pub use normalizer::{EmbeddingNormalizer, NormalizationMode};
pub use strategies::{
    attention_weights, AttentionFusion, Concatenation, FusionInput, FusionStrategy,
    StrategyContext, StrategyRegistry, WeightedAverage,
};
