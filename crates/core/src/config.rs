use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::errors::CoreError;
use crate::models::chart::Timeframe;
use crate::services::formatter::CurrencyFormat;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RECENT_ORDERS: usize = 5;

const ENV_BASE_URL: &str = "KITE_API_URL";
const ENV_TIMEOUT: &str = "KITE_REQUEST_TIMEOUT_SECS";
const ENV_RECENT_ORDERS: &str = "KITE_RECENT_ORDERS";

/// Client settings. Every field has a default, so a partial JSON document
/// (or none at all) is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Root of the simulation service; endpoint paths are appended to it
    pub base_url: String,

    /// Upper bound for every remote call (native targets)
    pub request_timeout_secs: u64,

    /// Currency rendering for every monetary value
    pub currency: CurrencyFormat,

    /// How many orders the recent-orders panel shows
    pub recent_orders_limit: usize,

    /// Chart timeframe before the user picks one
    pub default_timeframe: Timeframe,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            currency: CurrencyFormat::default(),
            recent_orders_limit: DEFAULT_RECENT_ORDERS,
            default_timeframe: Timeframe::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `KITE_API_URL`, `KITE_REQUEST_TIMEOUT_SECS`
    /// and `KITE_RECENT_ORDERS` where set.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CoreError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            config.request_timeout_secs = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!("{ENV_TIMEOUT} must be a whole number of seconds, got '{raw}'"))
            })?;
        }
        if let Some(raw) = lookup(ENV_RECENT_ORDERS) {
            config.recent_orders_limit = raw.trim().parse().map_err(|_| {
                CoreError::Config(format!("{ENV_RECENT_ORDERS} must be a whole number, got '{raw}'"))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        let url = self.parsed_base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "base URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config("request timeout must be at least 1 second".into()));
        }
        Ok(())
    }

    pub fn parsed_base_url(&self) -> Result<Url, CoreError> {
        Ok(Url::parse(&self.base_url)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
