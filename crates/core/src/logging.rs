use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::errors::CoreError;

pub const DEFAULT_FILTER: &str = "kite_dashboard_core=info";

/// Console logging for native hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `kite_dashboard_core=debug`
    pub filter: String,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// `RUST_LOG` if set, else [`DEFAULT_FILTER`].
    pub fn from_env() -> Self {
        Self {
            filter: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string()),
            ..Self::default()
        }
    }
}

/// Install a global `tracing` subscriber. Fails if the filter does not
/// parse or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), CoreError> {
    let filter = EnvFilter::try_new(&config.filter)
        .map_err(|e| CoreError::Config(format!("invalid log filter '{}': {e}", config.filter)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
        .try_init()
        .map_err(|e| CoreError::Config(format!("logging already initialized: {e}")))
}
