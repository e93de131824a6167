pub mod fusion_config;

pub use fusion_config::{
    CacheConfig, DimensionStats, EvictionPolicy, FusionConfig, ModalityDimension,
    NormalizationConfig,
};
