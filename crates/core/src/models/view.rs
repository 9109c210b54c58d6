use serde::{Deserialize, Serialize};

use super::chart::{ChartPoint, Timeframe};
use super::instrument::Instrument;
use super::portfolio::Portfolio;

/// Which list the market-watch panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchlistTab {
    /// Every instrument
    #[default]
    Watchlist,
    /// Only instruments flagged `is_gem`
    Gems,
}

impl WatchlistTab {
    /// The filter this tab applies over the instrument list.
    pub fn includes(&self, instrument: &Instrument) -> bool {
        match self {
            WatchlistTab::Watchlist => true,
            WatchlistTab::Gems => instrument.is_gem,
        }
    }
}

/// The kinds of read request the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchKind {
    Instruments,
    Portfolio,
    Chart,
}

impl std::fmt::Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchKind::Instruments => write!(f, "instruments"),
            FetchKind::Portfolio => write!(f, "portfolio"),
            FetchKind::Chart => write!(f, "chart"),
        }
    }
}

/// Per-kind "last refresh failed" markers, for a stale-data indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StaleFlags {
    pub instruments: bool,
    pub portfolio: bool,
    pub chart: bool,
}

impl StaleFlags {
    pub fn get(&self, kind: FetchKind) -> bool {
        match kind {
            FetchKind::Instruments => self.instruments,
            FetchKind::Portfolio => self.portfolio,
            FetchKind::Chart => self.chart,
        }
    }

    pub(crate) fn set(&mut self, kind: FetchKind, stale: bool) {
        match kind {
            FetchKind::Instruments => self.instruments = stale,
            FetchKind::Portfolio => self.portfolio = stale,
            FetchKind::Chart => self.chart = stale,
        }
    }

    pub fn any(&self) -> bool {
        self.instruments || self.portfolio || self.chart
    }
}

/// Everything the dashboard displays. Owned by the view-state store and
/// handed to subscribers as an immutable snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    /// Last successfully fetched instrument list
    pub instruments: Vec<Instrument>,

    /// Symbol whose chart is displayed. Only set together with `chart_series`.
    pub selected_symbol: Option<String>,

    /// Series for `selected_symbol`
    pub chart_series: Vec<ChartPoint>,

    /// Timeframe `chart_series` was fetched with
    pub chart_timeframe: Option<Timeframe>,

    /// Last portfolio snapshot; `None` until the first successful fetch
    pub portfolio: Option<Portfolio>,

    pub active_tab: WatchlistTab,

    /// Timeframe used for the next chart fetch
    pub timeframe: Timeframe,

    pub stale: StaleFlags,

    /// Bumped on every transition that changed something
    pub revision: u64,
}

impl ViewState {
    /// The instruments shown under the active tab.
    pub fn watchlist(&self) -> Vec<&Instrument> {
        self.instruments
            .iter()
            .filter(|i| self.active_tab.includes(i))
            .collect()
    }

    pub fn instrument(&self, symbol: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.symbol == symbol)
    }

    pub fn selected_instrument(&self) -> Option<&Instrument> {
        self.selected_symbol
            .as_deref()
            .and_then(|s| self.instrument(s))
    }
}
