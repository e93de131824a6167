use actix_web::{web, HttpResponse};
use fusion_observability::log_timed;
use std::time::Instant;

use super::AppState;
use crate::models::{BatchFuseRequest, BatchFuseResponse, BatchItemResult, ErrorResponse};

const MAX_BATCH_REQUESTS: usize = 64;

/// Fuse up to [`MAX_BATCH_REQUESTS`] independent requests; each slot succeeds or fails alone.
pub async fn batch_fuse_handler(
    req: web::Json<BatchFuseRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let start_time = Instant::now();
    let requests = req.into_inner().requests;

    if requests.len() > MAX_BATCH_REQUESTS {
        return HttpResponse::PayloadTooLarge().json(ErrorResponse::message(format!(
            "Batch size exceeds maximum of {}",
            MAX_BATCH_REQUESTS
        )));
    }

    if requests.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse::message("No requests provided"));
    }

    tracing::info!(requests = requests.len(), "Processing fusion batch");

    let engine = state.engine.clone();
    let outcomes = match web::block(move || log_timed!("fuse_batch", engine.fuse_batch(&requests))).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            tracing::error!(error = %e, "Batch fusion task failed");
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::message("batch fusion task failed"));
        }
    };

    let mut successful = 0;
    let mut failed = 0;
    let results: Vec<BatchItemResult> = outcomes
        .into_iter()
        .map(|outcome| match outcome {
            Ok(result) => {
                successful += 1;
                BatchItemResult { ok: Some(result), error: None }
            }
            Err(err) => {
                failed += 1;
                BatchItemResult { ok: None, error: Some(ErrorResponse::from(&err)) }
            }
        })
        .collect();

    let duration = start_time.elapsed().as_millis() as u64;

    tracing::info!(successful, failed, duration_ms = duration, "Batch fusion complete");

    HttpResponse::Ok().json(BatchFuseResponse {
        results,
        successful,
        failed,
        duration_ms: duration,
    })
}
