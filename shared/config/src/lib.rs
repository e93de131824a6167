pub mod feature_toggles;

use feature_toggles::FeatureToggles;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Process-level settings for the fusion service.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Engine config JSON; built-in defaults apply when unset
    pub fusion_config_path: Option<PathBuf>,
    pub log_format: Option<String>,
    pub feature_toggles: FeatureToggles,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, SettingsError> {
        // A missing .env file is fine
        dotenv::dotenv().ok();

        let port = match std::env::var("FUSION_PORT") {
            Ok(value) => value.trim().parse::<u16>().map_err(|_| SettingsError::InvalidVar {
                name: "FUSION_PORT",
                value,
            })?,
            Err(_) => 8000,
        };

        Ok(Self {
            host: std::env::var("FUSION_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            fusion_config_path: std::env::var("FUSION_CONFIG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            log_format: std::env::var("LOG_FORMAT").ok(),
            feature_toggles: FeatureToggles::from_env_path(),
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
