use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use super::traits::{HttpRequest, HttpResponse, Transport};
use crate::errors::{CoreError, FetchError, TradeError, TradeErrorKind};
use crate::models::chart::{ChartPoint, ChartSeries, Timeframe};
use crate::models::instrument::{Instrument, InstrumentList};
use crate::models::portfolio::{Portfolio, TradeAction, TradeRequest, TradeResponse};

const OP_LIST_INSTRUMENTS: &str = "list instruments";
const OP_GET_PORTFOLIO: &str = "get portfolio";
const OP_GET_CHART: &str = "get chart series";

/// Typed wrappers for the four operations of the simulation service.
///
/// | Operation        | Request                                  |
/// |------------------|------------------------------------------|
/// | list instruments | `GET /api/stocks`                        |
/// | get portfolio    | `GET /api/portfolio`                     |
/// | get chart series | `GET /api/chart/{symbol}?timeframe={tf}` |
/// | submit trade     | `POST /api/trade`                        |
///
/// Reads fail with [`FetchError`], the trade with [`TradeError`]. Both keep
/// "no response" apart from "response with an error status".
pub struct RemoteGateway {
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl RemoteGateway {
    pub fn new(transport: Arc<dyn Transport>, base_url: Url) -> Result<Self, CoreError> {
        if base_url.cannot_be_a_base() {
            return Err(CoreError::Config(format!(
                "base URL '{base_url}' cannot carry a path"
            )));
        }
        Ok(Self {
            transport,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    // ── Reads ───────────────────────────────────────────────────────

    pub async fn list_instruments(&self) -> Result<Vec<Instrument>, FetchError> {
        let url = self.endpoint(["api", "stocks"]);
        let list: InstrumentList = self.fetch_json(OP_LIST_INSTRUMENTS, url).await?;
        Ok(list.data)
    }

    pub async fn get_portfolio(&self) -> Result<Portfolio, FetchError> {
        let url = self.endpoint(["api", "portfolio"]);
        self.fetch_json(OP_GET_PORTFOLIO, url).await
    }

    /// The symbol becomes a single percent-encoded path segment; the
    /// timeframe's wire form is passed through verbatim.
    pub async fn get_chart_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<ChartPoint>, FetchError> {
        let mut url = self.endpoint(["api", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("timeframe", timeframe.as_str());
        let series: ChartSeries = self.fetch_json(OP_GET_CHART, url).await?;
        Ok(series.data)
    }

    // ── Write ───────────────────────────────────────────────────────

    /// Submit a market order and return the resulting portfolio.
    ///
    /// A zero quantity is rejected here, before any request is built.
    /// The service remains authoritative for everything else (funds,
    /// holdings, symbol validity).
    pub async fn submit_trade(
        &self,
        symbol: &str,
        action: TradeAction,
        quantity: u32,
    ) -> Result<Portfolio, TradeError> {
        if quantity == 0 {
            return Err(TradeError::new(
                TradeErrorKind::InvalidQuantity,
                "Quantity must be at least 1",
            ));
        }

        let request = TradeRequest {
            symbol: symbol.to_string(),
            action,
            quantity,
        };
        let body = serde_json::to_value(&request).map_err(|e| {
            TradeError::new(TradeErrorKind::Deserialization, format!("Unencodable trade: {e}"))
        })?;
        let url = self.endpoint(["api", "trade"]);
        debug!(%symbol, %action, quantity, "submitting trade");

        let resp = self.transport.send(HttpRequest::post(url, body)).await?;
        if !resp.is_success() {
            debug!(status = resp.status, "trade rejected");
            return Err(TradeError::rejected(extract_detail(&resp.body)));
        }

        let parsed: TradeResponse = serde_json::from_str(&resp.body).map_err(|e| {
            TradeError::new(
                TradeErrorKind::Deserialization,
                format!("Unreadable trade response: {e}"),
            )
        })?;
        Ok(parsed.portfolio)
    }

    // ── Internals ───────────────────────────────────────────────────

    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base_url.clone();
        // Checked in `new`: the base URL can always carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: Url,
    ) -> Result<T, FetchError> {
        debug!(operation, url = %url, "fetching");
        let resp = self.transport.send(HttpRequest::get(url)).await?;
        decode(operation, resp)
    }
}

fn decode<T: DeserializeOwned>(operation: &str, resp: HttpResponse) -> Result<T, FetchError> {
    if !resp.is_success() {
        return Err(FetchError::Status {
            operation: operation.to_string(),
            status: resp.status,
            detail: extract_detail(&resp.body),
        });
    }
    serde_json::from_str(&resp.body).map_err(|e| FetchError::Deserialization {
        operation: operation.to_string(),
        message: e.to_string(),
    })
}

/// Pull the user-facing reason out of an error payload.
///
/// The service reports `{"detail": "..."}`; request-validation failures
/// come back as `{"detail": [{"msg": "...", ...}, ...]}`, in which case
/// the first message is used.
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let detail = value.get("detail")?;
    let text = match detail {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .find_map(|item| item.get("msg").and_then(|m| m.as_str()))?
            .to_string(),
        _ => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
