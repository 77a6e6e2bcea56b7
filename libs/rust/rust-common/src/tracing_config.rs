//! Tracing subscriber initialisation.
//!
//! All tools log to stderr so that their primary output on stdout (tokens,
//! key sets) stays pipeable.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Service name attached to the startup event
    pub service_name: String,
    /// Log level filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "rust-service".to_string(),
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    /// Create config with custom service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Create config with custom log level.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Pick `debug` when verbose, the configured level otherwise.
    #[must_use]
    pub fn with_verbose(self, verbose: bool) -> Self {
        if verbose {
            self.with_log_level("debug")
        } else {
            self
        }
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }
}

/// Initialize tracing with the given configuration.
///
/// This sets up the global tracing subscriber with the specified configuration.
/// Should be called once at application startup.
pub fn init_tracing(config: &TracingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    tracing::debug!(service = %config.service_name, "Tracing initialised");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.service_name, "rust-service");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_output);
    }

    #[test]
    fn test_config_builder() {
        let config = TracingConfig::default()
            .with_service_name("mk-jwt")
            .with_log_level("warn")
            .with_json_output();

        assert_eq!(config.service_name, "mk-jwt");
        assert_eq!(config.log_level, "warn");
        assert!(config.json_output);
    }

    #[test]
    fn test_verbose_lowers_level() {
        let config = TracingConfig::default().with_log_level("warn").with_verbose(true);
        assert_eq!(config.log_level, "debug");

        let config = TracingConfig::default().with_log_level("warn").with_verbose(false);
        assert_eq!(config.log_level, "warn");
    }
}
