use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::{CoreError, FetchError, TradeError};
use crate::gateway::remote::RemoteGateway;
use crate::models::chart::Timeframe;
use crate::models::portfolio::TradeAction;
use crate::models::view::{FetchKind, WatchlistTab};
use crate::services::notifier::{Notification, Notifier};
use crate::services::store::{ApplyOutcome, ViewStateStore};

/// Lifecycle of one trade submission.
///
/// `Idle → Submitting → Succeeded | Failed → Idle`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradePhase {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

impl TradePhase {
    /// The phase after moving to `next`, or `None` if that move is illegal.
    pub fn advance(self, next: TradePhase) -> Option<TradePhase> {
        use TradePhase::*;
        match (self, next) {
            (Idle, Submitting)
            | (Submitting, Succeeded)
            | (Submitting, Failed)
            | (Succeeded, Idle)
            | (Failed, Idle) => Some(next),
            _ => None,
        }
    }
}

/// An in-flight trade, as listed by [`InteractionController::pending_trades`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTicket {
    pub id: Uuid,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u32,
    pub phase: TradePhase,
}

/// Result of a successful trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeReceipt {
    pub id: Uuid,
    pub symbol: String,
    pub action: TradeAction,
    pub quantity: u32,
    /// Whether the follow-up instrument refresh succeeded
    pub instruments_refreshed: bool,
}

/// Outcome of the two reads issued on startup.
#[derive(Debug)]
pub struct LoadReport {
    pub instruments: Result<ApplyOutcome, FetchError>,
    pub portfolio: Result<ApplyOutcome, FetchError>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.instruments.is_ok() && self.portfolio.is_ok()
    }
}

/// Turns user intents into gateway calls and store transitions.
///
/// Read failures keep the last good data and mark it stale. Trade outcomes
/// are always surfaced through the [`Notifier`]. Trades are not serialized:
/// concurrent submissions each run the full protocol and the portfolio from
/// the last response to arrive is the one displayed.
pub struct InteractionController {
    gateway: Arc<RemoteGateway>,
    store: Arc<ViewStateStore>,
    notifier: Arc<dyn Notifier>,
    trades: Mutex<HashMap<Uuid, TradeTicket>>,
}

impl InteractionController {
    pub fn new(
        gateway: Arc<RemoteGateway>,
        store: Arc<ViewStateStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            gateway,
            store,
            notifier,
            trades: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<ViewStateStore> {
        &self.store
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Fetch instruments and portfolio concurrently.
    pub async fn initial_load(&self) -> LoadReport {
        let (instruments, portfolio) =
            futures::join!(self.refresh_instruments(), self.refresh_portfolio());
        LoadReport {
            instruments,
            portfolio,
        }
    }

    pub async fn refresh_instruments(&self) -> Result<ApplyOutcome, FetchError> {
        let ticket = self.store.begin_request(FetchKind::Instruments);
        match self.gateway.list_instruments().await {
            Ok(list) => Ok(self.store.apply_instruments(ticket, list)),
            Err(e) => {
                warn!(error = %e, "instrument refresh failed, keeping previous list");
                self.store.mark_stale(ticket);
                Err(e)
            }
        }
    }

    pub async fn refresh_portfolio(&self) -> Result<ApplyOutcome, FetchError> {
        let ticket = self.store.begin_request(FetchKind::Portfolio);
        match self.gateway.get_portfolio().await {
            Ok(portfolio) => Ok(self.store.apply_portfolio(ticket, portfolio)),
            Err(e) => {
                warn!(error = %e, "portfolio refresh failed, keeping previous snapshot");
                self.store.mark_stale(ticket);
                Err(e)
            }
        }
    }

    // ── Selection & chart ───────────────────────────────────────────

    /// Load the chart of `symbol` at the current timeframe.
    ///
    /// The selection only moves once the series has arrived; if the fetch
    /// fails the previous selection and chart stay on screen.
    pub async fn select_instrument(&self, symbol: &str) -> Result<ApplyOutcome, CoreError> {
        let (known, timeframe) = self
            .store
            .read(|s| (s.instrument(symbol).is_some(), s.timeframe));
        if !known {
            return Err(CoreError::ValidationError(format!(
                "Unknown instrument: {symbol}"
            )));
        }
        Ok(self.load_chart(symbol, timeframe).await?)
    }

    /// Switch timeframe; refetch only if a symbol is already selected.
    pub async fn change_timeframe(
        &self,
        timeframe: Timeframe,
    ) -> Result<Option<ApplyOutcome>, FetchError> {
        self.store.set_timeframe(timeframe);
        let selected = self.store.read(|s| s.selected_symbol.clone());
        match selected {
            Some(symbol) => self.load_chart(&symbol, timeframe).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn change_tab(&self, tab: WatchlistTab) -> ApplyOutcome {
        self.store.set_active_tab(tab)
    }

    /// Fetch and apply one chart. If the timeframe was changed while the
    /// request was in flight (before any symbol was selected, so nothing
    /// refetched), the series is dropped and fetched again at the current
    /// timeframe rather than shown against the wrong one.
    async fn load_chart(
        &self,
        symbol: &str,
        mut timeframe: Timeframe,
    ) -> Result<ApplyOutcome, FetchError> {
        loop {
            let ticket = self.store.begin_request(FetchKind::Chart);
            match self.gateway.get_chart_series(symbol, timeframe).await {
                Ok(series) => {
                    let wanted = self.store.read(|s| s.timeframe);
                    if wanted != timeframe && self.store.is_current(ticket) {
                        debug!(%symbol, fetched = %timeframe, %wanted, "timeframe changed while loading chart");
                        timeframe = wanted;
                        continue;
                    }
                    let outcome = self
                        .store
                        .apply_chart_series(ticket, symbol, timeframe, series);
                    if outcome.is_superseded() {
                        info!(%symbol, %timeframe, seq = ticket.seq, "chart response arrived after a newer one");
                    }
                    return Ok(outcome);
                }
                Err(e) => {
                    warn!(%symbol, %timeframe, error = %e, "chart fetch failed");
                    // Only worth telling the user if nothing newer has landed.
                    if !self.store.mark_stale(ticket).is_superseded() {
                        self.notifier.notify(Notification::error(format!(
                            "Could not load chart for {symbol}: {e}"
                        )));
                    }
                    return Err(e);
                }
            }
        }
    }

    // ── Trading ─────────────────────────────────────────────────────

    /// Run the trade-execution protocol for one order.
    ///
    /// 1. Nothing is changed optimistically while the order is in flight.
    /// 2. On success the returned portfolio replaces the cached one and a
    ///    success notification is raised; the trade is then complete. The
    ///    instrument list is refreshed afterwards, and a failure or delay
    ///    there neither undoes nor holds up the trade.
    /// 3. On failure the portfolio is left alone and the service's reason
    ///    is surfaced.
    pub async fn submit_trade(
        &self,
        symbol: &str,
        action: TradeAction,
        quantity: u32,
    ) -> Result<TradeReceipt, TradeError> {
        let id = Uuid::new_v4();
        self.open_trade(TradeTicket {
            id,
            symbol: symbol.to_string(),
            action,
            quantity,
            phase: TradePhase::Idle,
        });
        info!(trade = %id, %symbol, %action, quantity, "submitting trade");

        match self.gateway.submit_trade(symbol, action, quantity).await {
            Ok(portfolio) => {
                self.store.replace_portfolio(portfolio);
                self.advance_trade(id, TradePhase::Succeeded);
                self.notifier.notify(Notification::success(format!(
                    "Successfully executed {action} order for {quantity} shares of {symbol}"
                )));
                info!(trade = %id, "trade executed");
                self.advance_trade(id, TradePhase::Idle);

                let instruments_refreshed = self.refresh_instruments().await.is_ok();
                Ok(TradeReceipt {
                    id,
                    symbol: symbol.to_string(),
                    action,
                    quantity,
                    instruments_refreshed,
                })
            }
            Err(e) => {
                warn!(trade = %id, kind = ?e.kind, error = %e, "trade failed");
                self.advance_trade(id, TradePhase::Failed);
                self.notifier.notify(Notification::error(e.message.clone()));
                self.advance_trade(id, TradePhase::Idle);
                Err(e)
            }
        }
    }

    /// Trades that have not returned to `Idle` yet.
    pub fn pending_trades(&self) -> Vec<TradeTicket> {
        lock(&self.trades).values().cloned().collect()
    }

    fn open_trade(&self, mut ticket: TradeTicket) {
        if let Some(phase) = ticket.phase.advance(TradePhase::Submitting) {
            ticket.phase = phase;
        }
        lock(&self.trades).insert(ticket.id, ticket);
    }

    fn advance_trade(&self, id: Uuid, next: TradePhase) {
        let mut trades = lock(&self.trades);
        let Some(ticket) = trades.get_mut(&id) else {
            return;
        };
        match ticket.phase.advance(next) {
            Some(TradePhase::Idle) => {
                trades.remove(&id);
            }
            Some(phase) => ticket.phase = phase,
            None => warn!(trade = %id, from = ?ticket.phase, to = ?next, "illegal trade phase change"),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
