use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;

use fusion_config::AppConfig;
use fusion_embedding::config::FusionConfig;
use fusion_embedding::handlers::{self, AppState};
use fusion_embedding::services::{EncoderRegistry, FusionEngine};
use fusion_observability::{init_tracing, log_feature, LogFormat, TracingConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = AppConfig::from_env().context("Invalid process settings")?;

    let mut tracing_config = TracingConfig::for_service("fusion-embedding");
    if let Some(format) = settings.log_format.as_deref() {
        if let Ok(format) = format.parse::<LogFormat>() {
            tracing_config = tracing_config.with_format(format);
        }
    }
    init_tracing(tracing_config);

    let mut fusion_config = match &settings.fusion_config_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "Loading fusion config");
            FusionConfig::from_file(path)
                .with_context(|| format!("Failed to load fusion config from {}", path.display()))?
        }
        None => {
            tracing::info!("No FUSION_CONFIG_PATH set; using built-in fusion config");
            FusionConfig::default()
        }
    };

    let toggles = &settings.feature_toggles;
    let cache_toggle = toggles.cache_enabled();
    let multimodal_enabled = toggles.multimodal_enabled();
    log_feature!("Cache", cache_toggle);
    log_feature!("Multimodal", multimodal_enabled);

    if !cache_toggle && fusion_config.cache.enabled {
        tracing::warn!("Cache toggle is off; disabling result cache");
        fusion_config = fusion_config.without_cache();
    }

    let encoders = EncoderRegistry::reference(&fusion_config);
    let engine = Arc::new(FusionEngine::new(fusion_config).context("Invalid fusion config")?);

    tracing::info!(
        strategies = ?engine.strategies(),
        default_strategy = %engine.config().default_strategy,
        cache_enabled = engine.cache_enabled(),
        "Fusion engine ready"
    );

    let state = web::Data::new(AppState::new(engine, encoders, multimodal_enabled));
    let (host, port) = settings.bind_address();

    tracing::info!(host = %host, port, "Starting fusion service");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))
    .with_context(|| format!("Failed to bind {}:{}", host, port))?
    .run()
    .await?;

    Ok(())
}
