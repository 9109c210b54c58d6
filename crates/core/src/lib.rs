pub mod config;
pub mod errors;
pub mod gateway;
#[cfg(not(target_arch = "wasm32"))]
pub mod logging;
pub mod models;
pub mod services;

use std::sync::Arc;

use config::ClientConfig;
use errors::{CoreError, FetchError, TradeError};
use gateway::{http::ReqwestTransport, remote::RemoteGateway, traits::Transport};
use models::{chart::Timeframe, portfolio::TradeAction, view::ViewState, view::WatchlistTab};
use services::{
    controller::{InteractionController, LoadReport, TradeReceipt, TradeTicket},
    notifier::{LogNotifier, Notifier},
    presenter::{DashboardView, Presenter},
    store::{ApplyOutcome, SubscriptionId, ViewStateStore},
};

/// Main entry point for the dashboard core.
///
/// Owns the view-state store and the controller that keeps it in sync with
/// the simulation service. The presentation layer reads snapshots (or the
/// formatted [`DashboardView`]), subscribes to changes, and sends user
/// intents through the methods below.
#[must_use]
pub struct KiteDashboard {
    config: ClientConfig,
    store: Arc<ViewStateStore>,
    controller: InteractionController,
    presenter: Presenter,
}

impl std::fmt::Debug for KiteDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KiteDashboard")
            .field("base_url", &self.config.base_url)
            .field("store", &self.store)
            .field("pending_trades", &self.controller.pending_trades().len())
            .finish()
    }
}

impl KiteDashboard {
    /// Dashboard talking HTTP to `config.base_url`, notifying via the log.
    pub fn new(config: ClientConfig) -> Result<Self, CoreError> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout()));
        Self::with_transport(config, transport, Arc::new(LogNotifier))
    }

    /// Dashboard over a caller-supplied transport and notifier.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let gateway = Arc::new(RemoteGateway::new(transport, config.parsed_base_url()?)?);
        let store = Arc::new(ViewStateStore::new(ViewState {
            timeframe: config.default_timeframe,
            ..ViewState::default()
        }));
        let controller = InteractionController::new(gateway, Arc::clone(&store), notifier);
        let presenter = Presenter::new(config.currency.clone(), config.recent_orders_limit);

        Ok(Self {
            config,
            store,
            controller,
            presenter,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<ViewStateStore> {
        &self.store
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    // ── Reading state ───────────────────────────────────────────────

    pub fn state(&self) -> ViewState {
        self.store.snapshot()
    }

    /// Current state, formatted for display.
    pub fn view(&self) -> DashboardView {
        self.store.read(|s| self.presenter.render(s))
    }

    pub fn subscribe(
        &self,
        subscriber: impl Fn(&ViewState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.store.subscribe(subscriber)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    /// Currency string in the configured locale.
    pub fn format_price(&self, amount: f64) -> String {
        self.config.currency.format(amount)
    }

    // ── User intents ────────────────────────────────────────────────

    pub async fn initial_load(&self) -> LoadReport {
        self.controller.initial_load().await
    }

    pub async fn refresh_instruments(&self) -> Result<ApplyOutcome, FetchError> {
        self.controller.refresh_instruments().await
    }

    pub async fn refresh_portfolio(&self) -> Result<ApplyOutcome, FetchError> {
        self.controller.refresh_portfolio().await
    }

    pub async fn select_instrument(&self, symbol: &str) -> Result<ApplyOutcome, CoreError> {
        self.controller.select_instrument(symbol).await
    }

    pub async fn change_timeframe(
        &self,
        timeframe: Timeframe,
    ) -> Result<Option<ApplyOutcome>, FetchError> {
        self.controller.change_timeframe(timeframe).await
    }

    pub fn change_tab(&self, tab: WatchlistTab) -> ApplyOutcome {
        self.controller.change_tab(tab)
    }

    pub async fn submit_trade(
        &self,
        symbol: &str,
        action: TradeAction,
        quantity: u32,
    ) -> Result<TradeReceipt, TradeError> {
        self.controller.submit_trade(symbol, action, quantity).await
    }

    pub fn pending_trades(&self) -> Vec<TradeTicket> {
        self.controller.pending_trades()
    }
}
