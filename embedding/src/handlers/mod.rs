pub mod batch;
pub mod fuse;
pub mod health;
pub mod multimodal;

use actix_web::{web, HttpResponse};
use std::sync::Arc;
use std::time::Instant;

use crate::error::FusionError;
use crate::models::ErrorResponse;
use crate::services::{EncoderRegistry, FusionEngine};

pub use batch::batch_fuse_handler;
pub use fuse::{cache_stats_handler, fuse_handler, strategies_handler};
pub use health::{ping_handler, ready_handler};
pub use multimodal::multimodal_handler;

/// Shared state behind every route.
pub struct AppState {
    pub engine: Arc<FusionEngine>,
    pub encoders: EncoderRegistry,
    pub multimodal_enabled: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(engine: Arc<FusionEngine>, encoders: EncoderRegistry, multimodal_enabled: bool) -> Self {
        Self {
            engine,
            encoders,
            multimodal_enabled,
            started_at: Instant::now(),
        }
    }
}

/// Mount all routes under `/api/v1`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/health")
                    .route("/ping", web::get().to(ping_handler))
                    .route("/ready", web::get().to(ready_handler)),
            )
            .service(
                web::scope("/fusion")
                    .route("/fuse", web::post().to(fuse_handler))
                    .route("/batch", web::post().to(batch_fuse_handler))
                    .route("/strategies", web::get().to(strategies_handler))
                    .route("/cache/stats", web::get().to(cache_stats_handler))
                    .route("/multimodal", web::post().to(multimodal_handler)),
            ),
    );
}

pub(crate) fn error_response(err: &FusionError) -> HttpResponse {
    let body = ErrorResponse::from(err);
    match err {
        FusionError::Validation(_) | FusionError::UnknownStrategy(_) => {
            HttpResponse::BadRequest().json(body)
        }
        FusionError::DimensionMismatch { .. } | FusionError::DegenerateEmbedding { .. } => {
            HttpResponse::UnprocessableEntity().json(body)
        }
    }
}
