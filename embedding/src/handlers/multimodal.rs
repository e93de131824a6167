use actix_web::{web, HttpResponse};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use super::{error_response, AppState};
use crate::error::EncoderError;
use crate::models::{AlignMode, Embedding, ErrorResponse, FusionRequest, Modality, MultimodalRequest};
use crate::services::{TruncateAdapter, ZeroPadAdapter};

/// Encode raw text/image/audio with the registered encoders, then fuse.
pub async fn multimodal_handler(
    req: web::Json<MultimodalRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    if !state.multimodal_enabled {
        return HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "error": "Multimodal encoding disabled by feature toggle",
            "feature": "Multimodal",
        }));
    }

    let req = req.into_inner();
    let mut raw_inputs: Vec<(Modality, Vec<u8>)> = Vec::new();

    if let Some(text) = &req.text {
        raw_inputs.push((Modality::Text, text.as_bytes().to_vec()));
    }
    for (modality, encoded) in [
        (Modality::Image, &req.image_base64),
        (Modality::Audio, &req.audio_base64),
    ] {
        if let Some(encoded) = encoded {
            match STANDARD.decode(encoded) {
                Ok(bytes) => raw_inputs.push((modality, bytes)),
                Err(e) => {
                    return HttpResponse::BadRequest().json(ErrorResponse::message(format!(
                        "{} payload is not valid base64: {}",
                        modality, e
                    )))
                }
            }
        }
    }

    if raw_inputs.is_empty() {
        return HttpResponse::BadRequest()
            .json(ErrorResponse::message("Provide at least one of text, image_base64, audio_base64"));
    }

    let embeddings = match raw_inputs
        .iter()
        .map(|(modality, raw)| state.encoders.encode(*modality, raw))
        .collect::<Result<Vec<Embedding>, EncoderError>>()
    {
        Ok(embeddings) => embeddings,
        Err(e) => return HttpResponse::BadRequest().json(ErrorResponse::message(e.to_string())),
    };

    let mut request = FusionRequest {
        strategy: req.strategy,
        weights: req.weights,
        ..FusionRequest::default()
    };
    for embedding in embeddings {
        request = request.with_embedding(embedding);
    }
    request = match req.align {
        Some(AlignMode::Truncate) => request.adapted(&TruncateAdapter),
        Some(AlignMode::Pad) => request.adapted(&ZeroPadAdapter),
        None => request,
    };

    let engine = state.engine.clone();
    match web::block(move || engine.fuse(&request)).await {
        Ok(Ok(result)) => HttpResponse::Ok().json(result),
        Ok(Err(err)) => error_response(&err),
        Err(e) => {
            tracing::error!(error = %e, "Multimodal fusion task failed");
            HttpResponse::InternalServerError().json(ErrorResponse::message("fusion task failed"))
        }
    }
}
