use serde::{Deserialize, Serialize};

/// A tradeable security as quoted by the simulation service's scanner.
///
/// Snapshots are immutable: the instrument list is replaced wholesale on
/// every successful fetch and individual price fields are never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Exchange-qualified symbol (e.g., "RELIANCE.NS"). List identity.
    pub symbol: String,

    /// Last traded price
    pub current_price: f64,

    /// Change versus previous close, in percent
    pub price_change_pct: f64,

    /// Server-flagged instrument of special interest
    #[serde(default)]
    pub is_gem: bool,

    /// Relative volume reported by the scanner
    #[serde(default)]
    pub rvol: Option<f64>,

    #[serde(default)]
    pub volume: Option<u64>,

    #[serde(default)]
    pub open: Option<f64>,

    #[serde(default)]
    pub high: Option<f64>,

    #[serde(default)]
    pub low: Option<f64>,
}

impl Instrument {
    /// Minimal quote, used when only the list-level fields matter.
    pub fn quote(
        symbol: impl Into<String>,
        current_price: f64,
        price_change_pct: f64,
        is_gem: bool,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            current_price,
            price_change_pct,
            is_gem,
            rvol: None,
            volume: None,
            open: None,
            high: None,
            low: None,
        }
    }
}

/// Envelope of `GET /api/stocks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentList {
    pub data: Vec<Instrument>,
}
