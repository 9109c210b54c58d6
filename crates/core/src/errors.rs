use std::time::Duration;

use thiserror::Error;

/// Message shown when a trade fails without a usable error payload.
pub const TRADE_FALLBACK_MESSAGE: &str = "Failed to execute trade";

/// Failure to get any response at all from the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

impl TransportError {
    pub fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            return TransportError::Timeout(timeout);
        }
        TransportError::Network(redact_query(&e.to_string()))
    }
}

// reqwest errors carry the full URL; query strings hold symbols and
// timeframes that do not belong in user-facing text.
fn redact_query(msg: &str) -> String {
    match msg.find('?') {
        Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
        None => msg.to_string(),
    }
}

/// Failure of a read operation (instrument list, portfolio, chart series).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    // ── Transport: no response ──────────────────────────────────────
    #[error(transparent)]
    Transport(#[from] TransportError),

    // ── Application: response with an error status ──────────────────
    #[error("{operation} failed with status {status}{}", detail_suffix(.detail))]
    Status {
        operation: String,
        status: u16,
        detail: Option<String>,
    },

    #[error("Could not decode {operation} response: {message}")]
    Deserialization { operation: String, message: String },
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {d}"),
        None => String::new(),
    }
}

impl FetchError {
    /// True when no response was received (network failure or timeout).
    pub fn is_transport(&self) -> bool {
        matches!(self, FetchError::Transport(_))
    }
}

/// Why a trade submission failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeErrorKind {
    /// The service answered with an error status.
    Rejected,
    /// No response was received.
    Transport,
    /// Rejected locally before sending (quantity below 1).
    InvalidQuantity,
    /// The service answered with success but the body was unreadable.
    Deserialization,
}

/// Failure of a trade submission. `message` is always user-displayable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TradeError {
    pub message: String,
    pub kind: TradeErrorKind,
}

impl TradeError {
    pub fn new(kind: TradeErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// A rejection with the service's `detail`, or the generic fallback.
    pub fn rejected(detail: Option<String>) -> Self {
        Self::new(
            TradeErrorKind::Rejected,
            detail.unwrap_or_else(|| TRADE_FALLBACK_MESSAGE.to_string()),
        )
    }
}

impl From<TransportError> for TradeError {
    fn from(_: TransportError) -> Self {
        TradeError::new(TradeErrorKind::Transport, TRADE_FALLBACK_MESSAGE)
    }
}

/// Umbrella error for facade and configuration operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Trade failed: {0}")]
    Trade(#[from] TradeError),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<url::ParseError> for CoreError {
    fn from(e: url::ParseError) -> Self {
        CoreError::Config(format!("invalid base URL: {e}"))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}
