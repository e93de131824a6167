use actix_web::{web, HttpResponse};

use super::{error_response, AppState};
use crate::models::{ErrorResponse, FusionRequest, StrategiesResponse};

pub async fn fuse_handler(
    req: web::Json<FusionRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let request = req.into_inner();
    let engine = state.engine.clone();

    // Fusion is CPU-bound; keep it off the async workers
    match web::block(move || engine.fuse(&request)).await {
        Ok(Ok(result)) => HttpResponse::Ok().json(result),
        Ok(Err(err)) => error_response(&err),
        Err(e) => {
            tracing::error!(error = %e, "Fusion task failed");
            HttpResponse::InternalServerError().json(ErrorResponse::message("fusion task failed"))
        }
    }
}

pub async fn strategies_handler(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(StrategiesResponse {
        strategies: state.engine.strategies(),
        default: state.engine.config().default_strategy.clone(),
    })
}

pub async fn cache_stats_handler(state: web::Data<AppState>) -> HttpResponse {
    match state.engine.cache_stats() {
        Some(stats) => HttpResponse::Ok().json(stats),
        None => HttpResponse::NotFound().json(ErrorResponse::message("result cache is disabled")),
    }
}
