pub mod api;
pub mod embedding;
pub mod fusion;

pub use api::{
    AlignMode, BatchFuseRequest, BatchFuseResponse, BatchItemResult, ErrorResponse,
    MultimodalRequest, PingResponse, ReadyResponse, StrategiesResponse,
};
pub use embedding::{cosine_similarity, dot, l2_norm, Embedding, Modality};
pub use fusion::{FusedResult, FusionRequest};
