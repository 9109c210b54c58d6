use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// Side of a trade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

/// A current position. Every number here comes from the service;
/// the client never derives P&L itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    pub quantity: u32,
    pub avg_price: f64,
    pub current_price: f64,
    /// Market value of the position, when the service reports it
    #[serde(default)]
    pub current_value: Option<f64>,
    pub pnl: f64,
    pub pnl_percent: f64,
}

/// One executed order from the service's append-only history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: Option<u64>,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub price: f64,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub status: Option<String>,
}

/// Snapshot of the paper-trading account.
///
/// Always replaced as a whole: the client caches the last successful
/// snapshot and never merges one into another.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Portfolio {
    pub cash: f64,
    pub total_value: f64,
    pub used_margin: f64,
    #[serde(default)]
    pub holdings: Vec<Holding>,
    /// Oldest first, as the service appends them
    #[serde(default)]
    pub orders: Vec<Order>,
}

impl Portfolio {
    /// The `limit` most recent orders, newest first.
    pub fn recent_orders(&self, limit: usize) -> Vec<&Order> {
        self.orders.iter().rev().take(limit).collect()
    }
}

/// Body of `POST /api/trade`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u32,
}

/// Success envelope of `POST /api/trade`.
#[derive(Debug, Clone, Deserialize)]
pub struct TradeResponse {
    pub portfolio: Portfolio,
}

/// Accepts naive ISO-8601 timestamps (what the service emits) as well as
/// RFC 3339 with an offset, which is normalized to its local wall time.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(&raw) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map_err(|e| serde::de::Error::custom(format!("invalid order timestamp '{raw}': {e}")))
}
