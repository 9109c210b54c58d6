use serde::{Deserialize, Serialize};

use crate::models::chart::Timeframe;
use crate::models::portfolio::{Holding, Order, Portfolio, TradeAction};
use crate::models::view::{ViewState, WatchlistTab};
use crate::services::formatter::{
    display_symbol, exchange_label, format_change_pct, to_fixed_2, CurrencyFormat,
};

/// Account figures for the header bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountHeader {
    pub cash: String,
    pub total_value: String,
    pub used_margin: String,
}

/// One line of the market-watch panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistRow {
    /// Full symbol, used when the row is clicked
    pub symbol: String,
    pub label: String,
    pub exchange: Option<String>,
    pub price: String,
    pub change: String,
    pub is_up: bool,
    pub is_gem: bool,
    pub is_selected: bool,
}

/// Chart panel header and state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPanel {
    pub title: String,
    pub symbol: Option<String>,
    /// Timeframe the displayed series was fetched with
    pub timeframe: Option<Timeframe>,
    pub points: usize,
    /// Buy/sell buttons are only offered for a selected instrument
    pub trading_enabled: bool,
    pub stale: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingRow {
    pub label: String,
    pub quantity: u32,
    pub avg_price: String,
    pub current_price: String,
    pub pnl: String,
    pub pnl_percent: String,
    pub is_profit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRow {
    pub label: String,
    /// e.g. `BUY 1 @ ₹2,450.00`
    pub summary: String,
    pub time: String,
}

/// Everything the presentation layer renders, already formatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardView {
    /// `None` until the first portfolio snapshot arrives
    pub header: Option<AccountHeader>,
    pub active_tab: WatchlistTab,
    pub watchlist: Vec<WatchlistRow>,
    pub chart: ChartPanel,
    pub selected_timeframe: Timeframe,
    pub holdings: Vec<HoldingRow>,
    pub recent_orders: Vec<OrderRow>,
    pub stale: bool,
}

/// Derives [`DashboardView`]s from store snapshots. Pure: no I/O, no state.
#[derive(Debug, Clone)]
pub struct Presenter {
    currency: CurrencyFormat,
    recent_orders_limit: usize,
}

impl Presenter {
    pub fn new(currency: CurrencyFormat, recent_orders_limit: usize) -> Self {
        Self {
            currency,
            recent_orders_limit,
        }
    }

    pub fn currency(&self) -> &CurrencyFormat {
        &self.currency
    }

    pub fn render(&self, state: &ViewState) -> DashboardView {
        let selected = state.selected_symbol.as_deref();
        let watchlist = state
            .watchlist()
            .into_iter()
            .map(|i| WatchlistRow {
                symbol: i.symbol.clone(),
                label: display_symbol(&i.symbol).to_string(),
                exchange: exchange_label(&i.symbol).map(str::to_string),
                price: self.currency.format(i.current_price),
                change: format_change_pct(i.price_change_pct),
                is_up: i.price_change_pct >= 0.0,
                is_gem: i.is_gem,
                is_selected: selected == Some(i.symbol.as_str()),
            })
            .collect();

        let portfolio = state.portfolio.as_ref();
        DashboardView {
            header: portfolio.map(|p| self.header(p)),
            active_tab: state.active_tab,
            watchlist,
            chart: self.chart_panel(state),
            selected_timeframe: state.timeframe,
            holdings: portfolio
                .map(|p| p.holdings.iter().map(|h| self.holding_row(h)).collect())
                .unwrap_or_default(),
            recent_orders: portfolio
                .map(|p| {
                    p.recent_orders(self.recent_orders_limit)
                        .into_iter()
                        .map(|o| self.order_row(o))
                        .collect()
                })
                .unwrap_or_default(),
            stale: state.stale.any(),
        }
    }

    pub fn header(&self, portfolio: &Portfolio) -> AccountHeader {
        AccountHeader {
            cash: self.currency.format(portfolio.cash),
            total_value: self.currency.format(portfolio.total_value),
            used_margin: self.currency.format(portfolio.used_margin),
        }
    }

    fn chart_panel(&self, state: &ViewState) -> ChartPanel {
        let title = match &state.selected_symbol {
            Some(symbol) => match exchange_label(symbol) {
                Some(exchange) => format!("{} ({exchange})", display_symbol(symbol)),
                None => display_symbol(symbol).to_string(),
            },
            None => "Select a stock to view chart".to_string(),
        };
        ChartPanel {
            title,
            symbol: state.selected_symbol.clone(),
            timeframe: state.chart_timeframe,
            points: state.chart_series.len(),
            trading_enabled: state.selected_symbol.is_some(),
            stale: state.stale.chart,
        }
    }

    fn holding_row(&self, holding: &Holding) -> HoldingRow {
        HoldingRow {
            label: display_symbol(&holding.symbol).to_string(),
            quantity: holding.quantity,
            avg_price: self.currency.format(holding.avg_price),
            current_price: self.currency.format(holding.current_price),
            pnl: self.currency.format_signed(holding.pnl),
            pnl_percent: format!("{}%", to_fixed_2(holding.pnl_percent)),
            is_profit: holding.pnl >= 0.0,
        }
    }

    fn order_row(&self, order: &Order) -> OrderRow {
        let side = match order.action {
            TradeAction::Buy => "BUY",
            TradeAction::Sell => "SELL",
        };
        OrderRow {
            label: display_symbol(&order.symbol).to_string(),
            summary: format!(
                "{side} {} @ {}",
                order.quantity,
                self.currency.format(order.price)
            ),
            time: order.timestamp.format("%H:%M:%S").to_string(),
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new(CurrencyFormat::default(), 5)
    }
}
