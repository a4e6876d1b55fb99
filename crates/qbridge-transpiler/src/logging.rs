//! Logging setup.
//!
//! Installs a `tracing-subscriber` fmt subscriber with an [`EnvFilter`].
//! `RUST_LOG` overrides the configured level.

use std::sync::Once;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console output.
    Console,
    /// JSON structured logging.
    Json,
}

impl LogFormat {
    /// Unknown names fall back to console output.
    pub fn from_name(name: &str) -> Self {
        match name {
            "json" => LogFormat::Json,
            _ => LogFormat::Console,
        }
    }
}

/// Install the global subscriber. Calls after the first are no-ops, as is
/// a call made after the host application installed its own subscriber.
pub fn init(config: &LoggingConfig) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let fmt_layer = match LogFormat::from_name(&config.format) {
            LogFormat::Console => fmt::layer().with_target(true).boxed(),
            LogFormat::Json => fmt::layer()
                .json()
                .with_target(true)
                .with_current_span(true)
                .boxed(),
        };

        if tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("global subscriber already installed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(LogFormat::from_name("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_name("console"), LogFormat::Console);
        assert_eq!(LogFormat::from_name("pretty"), LogFormat::Console);
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        init(&config);
        init(&config);
        tracing::info!("logging initialized");
    }
}
