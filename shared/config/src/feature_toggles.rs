use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Toggle that keeps the result cache on when the engine config enables it
pub const CACHE: &str = "Cache";
/// Toggle for the encode-and-fuse endpoint
pub const MULTIMODAL: &str = "Multimodal";

#[derive(Clone, Debug, Deserialize, Default, PartialEq)]
pub struct FeatureToggles {
    #[serde(flatten)]
    pub flags: HashMap<String, bool>,
}

impl FeatureToggles {
    // Load from a provided path or env var FEATURE_TOGGLES_PATH, defaulting to ./feature-toggles.json
    pub fn from_path(path: Option<String>) -> Self {
        let default_path = std::env::var("FEATURE_TOGGLES_PATH")
            .unwrap_or_else(|_| "feature-toggles.json".to_string());
        let path = path.unwrap_or(default_path);
        Self::load(&path)
    }

    pub fn from_env_path() -> Self {
        Self::from_path(None)
    }

    /// A missing or malformed file yields no flags, so every toggle takes its default.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Ignoring malformed feature toggles");
                FeatureToggles::default()
            }),
            Err(_) => {
                tracing::debug!(path = %path.display(), "No feature toggles file; using defaults");
                FeatureToggles::default()
            }
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    pub fn is_enabled_or(&self, name: &str, default: bool) -> bool {
        self.flags.get(name).copied().unwrap_or(default)
    }

    // Default to true when the Cache flag is missing
    pub fn cache_enabled(&self) -> bool {
        self.is_enabled_or(CACHE, true)
    }

    pub fn multimodal_enabled(&self) -> bool {
        self.is_enabled_or(MULTIMODAL, true)
    }

    // Get all enabled features
    pub fn enabled_features(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .flags
            .iter()
            .filter(|(_, &enabled)| enabled)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn disabled_features(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .flags
            .iter()
            .filter(|(_, &enabled)| !enabled)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}
