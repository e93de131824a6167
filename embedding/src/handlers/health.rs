use actix_web::{web, HttpResponse};
use chrono::Utc;

use super::AppState;
use crate::models::{PingResponse, ReadyResponse};

pub async fn ping_handler(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(PingResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn ready_handler(state: web::Data<AppState>) -> HttpResponse {
    let engine = &state.engine;
    HttpResponse::Ok().json(ReadyResponse {
        ready: true,
        strategies: engine.strategies(),
        default_strategy: engine.config().default_strategy.clone(),
        modalities: engine.config().modalities.clone(),
        cache_enabled: engine.cache_enabled(),
    })
}
