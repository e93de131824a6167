//! Convenience macros for common logging patterns.

/// Log a timed operation (measures and logs duration)
#[macro_export]
macro_rules! log_timed {
    ($name:expr, $block:expr) => {{
        let start = std::time::Instant::now();
        let result = $block;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(target: "timing", operation = $name, duration_ms = duration_ms, "operation completed");
        result
    }};
}

/// Log a cache operation
#[macro_export]
macro_rules! log_cache {
    (hit, $key:expr) => {
        tracing::debug!(target: "cache", operation = "hit", key = $key, "cache hit");
    };
    (miss, $key:expr) => {
        tracing::debug!(target: "cache", operation = "miss", key = $key, "cache miss");
    };
    (set, $key:expr) => {
        tracing::debug!(target: "cache", operation = "set", key = $key, "cache set");
    };
    (set_failed, $key:expr, $error:expr) => {
        tracing::warn!(target: "cache", operation = "set", key = $key, error = %$error, "cache write skipped");
    };
}

/// Log a feature toggle check
#[macro_export]
macro_rules! log_feature {
    ($feature:expr, $enabled:expr) => {
        tracing::debug!(target: "features", feature = $feature, enabled = $enabled, "feature check");
    };
}
