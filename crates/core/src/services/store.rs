use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::models::chart::{ChartPoint, Timeframe};
use crate::models::instrument::Instrument;
use crate::models::portfolio::Portfolio;
use crate::models::view::{FetchKind, ViewState, WatchlistTab};

pub type SubscriptionId = u64;

/// Callback run with the new snapshot after every state change.
pub type Subscriber = Arc<dyn Fn(&ViewState) + Send + Sync>;

/// Sequence number attached to one read request.
///
/// Issued by [`ViewStateStore::begin_request`] before the request is sent
/// and handed back with the response, so the store can tell a late answer
/// to an old request from the answer to the newest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    pub kind: FetchKind,
    pub seq: u64,
}

/// What a transition did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// State changed and subscribers were notified
    Applied,
    /// Accepted, but the state already held exactly this data
    Unchanged,
    /// Rejected: a newer request of the same kind was already applied
    Superseded,
}

impl ApplyOutcome {
    pub fn is_superseded(&self) -> bool {
        matches!(self, ApplyOutcome::Superseded)
    }
}

#[derive(Default)]
struct StoreInner {
    state: ViewState,
    /// Last sequence number issued, per kind
    issued: HashMap<FetchKind, u64>,
    /// Responses with a sequence number below this are stale, per kind
    floor: HashMap<FetchKind, u64>,
}

impl StoreInner {
    fn accepts(&self, ticket: RequestTicket) -> bool {
        ticket.seq >= self.floor.get(&ticket.kind).copied().unwrap_or(0)
    }

    fn settle(&mut self, ticket: RequestTicket) {
        self.floor.insert(ticket.kind, ticket.seq);
    }

    /// A direct replacement is newer than every request issued before it.
    fn supersede_in_flight(&mut self, kind: FetchKind) {
        let issued = self.issued.get(&kind).copied().unwrap_or(0);
        self.floor.insert(kind, issued + 1);
    }
}

/// Single owner of the dashboard's [`ViewState`].
///
/// Every mutation goes through one of the transitions below. Each runs under
/// one lock acquisition, so no subscriber ever sees a half-applied change;
/// subscribers are called after the lock is released, with a snapshot.
///
/// Delivery happens on the thread that made the change. When transitions
/// run on several threads at once, snapshots may reach a subscriber out of
/// order. Each change gets a strictly larger `revision`, so a subscriber
/// that ignores any snapshot older than the newest it has seen always ends
/// on the current state.
///
/// Data transitions replace wholesale: instrument lists, portfolios and
/// chart series are never merged or patched.
pub struct ViewStateStore {
    inner: Mutex<StoreInner>,
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: Mutex<SubscriptionId>,
}

impl std::fmt::Debug for ViewStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("ViewStateStore")
            .field("instruments", &inner.state.instruments.len())
            .field("selected_symbol", &inner.state.selected_symbol)
            .field("revision", &inner.state.revision)
            .field("subscribers", &lock(&self.subscribers).len())
            .finish()
    }
}

impl Default for ViewStateStore {
    fn default() -> Self {
        Self::new(ViewState::default())
    }
}

impl ViewStateStore {
    pub fn new(initial: ViewState) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                state: initial,
                ..StoreInner::default()
            }),
            subscribers: Mutex::new(Vec::new()),
            next_subscription: Mutex::new(1),
        }
    }

    // ── Reading ─────────────────────────────────────────────────────

    /// Copy of the current state.
    pub fn snapshot(&self) -> ViewState {
        lock(&self.inner).state.clone()
    }

    /// Borrow the current state without copying it.
    pub fn read<R>(&self, f: impl FnOnce(&ViewState) -> R) -> R {
        f(&lock(&self.inner).state)
    }

    // ── Subscriptions ───────────────────────────────────────────────

    /// Register `subscriber` for every future change. See the type-level
    /// docs for delivery order across threads.
    pub fn subscribe(&self, subscriber: impl Fn(&ViewState) + Send + Sync + 'static) -> SubscriptionId {
        let id = {
            let mut next = lock(&self.next_subscription);
            let id = *next;
            *next += 1;
            id
        };
        lock(&self.subscribers).push((id, Arc::new(subscriber)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = lock(&self.subscribers);
        let before = subs.len();
        subs.retain(|(sid, _)| *sid != id);
        subs.len() != before
    }

    // ── Request ordering ────────────────────────────────────────────

    /// Issue the next sequence number for a read of `kind`.
    pub fn begin_request(&self, kind: FetchKind) -> RequestTicket {
        let mut inner = lock(&self.inner);
        let seq = inner.issued.get(&kind).copied().unwrap_or(0) + 1;
        inner.issued.insert(kind, seq);
        RequestTicket { kind, seq }
    }

    /// True if a response for `ticket` would still be applied.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        lock(&self.inner).accepts(ticket)
    }

    // ── Unconditional transitions ───────────────────────────────────

    pub fn replace_instruments(&self, instruments: Vec<Instrument>) -> ApplyOutcome {
        self.transition(None, |inner| {
            inner.supersede_in_flight(FetchKind::Instruments);
            set_instruments(&mut inner.state, instruments)
        })
    }

    pub fn replace_portfolio(&self, portfolio: Portfolio) -> ApplyOutcome {
        self.transition(None, |inner| {
            inner.supersede_in_flight(FetchKind::Portfolio);
            set_portfolio(&mut inner.state, portfolio)
        })
    }

    /// Show `series` as the chart of `symbol`. Selection and series are set
    /// together so a series is never displayed against another symbol.
    pub fn replace_chart_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        series: Vec<ChartPoint>,
    ) -> ApplyOutcome {
        self.transition(None, |inner| {
            inner.supersede_in_flight(FetchKind::Chart);
            set_chart(&mut inner.state, symbol, timeframe, series)
        })
    }

    pub fn set_active_tab(&self, tab: WatchlistTab) -> ApplyOutcome {
        self.transition(None, |inner| {
            let changed = inner.state.active_tab != tab;
            inner.state.active_tab = tab;
            changed
        })
    }

    /// Does not refetch; that is up to the caller.
    pub fn set_timeframe(&self, timeframe: Timeframe) -> ApplyOutcome {
        self.transition(None, |inner| {
            let changed = inner.state.timeframe != timeframe;
            inner.state.timeframe = timeframe;
            changed
        })
    }

    // ── Sequence-checked transitions ────────────────────────────────

    pub fn apply_instruments(
        &self,
        ticket: RequestTicket,
        instruments: Vec<Instrument>,
    ) -> ApplyOutcome {
        self.transition(Some(ticket), |inner| set_instruments(&mut inner.state, instruments))
    }

    pub fn apply_portfolio(&self, ticket: RequestTicket, portfolio: Portfolio) -> ApplyOutcome {
        self.transition(Some(ticket), |inner| set_portfolio(&mut inner.state, portfolio))
    }

    pub fn apply_chart_series(
        &self,
        ticket: RequestTicket,
        symbol: &str,
        timeframe: Timeframe,
        series: Vec<ChartPoint>,
    ) -> ApplyOutcome {
        self.transition(Some(ticket), |inner| {
            set_chart(&mut inner.state, symbol, timeframe, series)
        })
    }

    /// Record that the read behind `ticket` failed. Previous data stays.
    /// Ignored if a newer read of the same kind has already landed.
    ///
    /// A recorded failure settles its ticket like a success does: an older
    /// read of the same kind that completes afterwards is discarded, and the
    /// kind stays stale until a read issued after this one succeeds.
    pub fn mark_stale(&self, ticket: RequestTicket) -> ApplyOutcome {
        self.transition(Some(ticket), |inner| {
            let changed = !inner.state.stale.get(ticket.kind);
            inner.state.stale.set(ticket.kind, true);
            changed
        })
    }

    // ── Internals ───────────────────────────────────────────────────

    fn transition(
        &self,
        ticket: Option<RequestTicket>,
        mutate: impl FnOnce(&mut StoreInner) -> bool,
    ) -> ApplyOutcome {
        let snapshot = {
            let mut inner = lock(&self.inner);
            if let Some(ticket) = ticket {
                if !inner.accepts(ticket) {
                    debug!(kind = %ticket.kind, seq = ticket.seq, "discarding superseded response");
                    return ApplyOutcome::Superseded;
                }
                inner.settle(ticket);
            }
            if !mutate(&mut *inner) {
                return ApplyOutcome::Unchanged;
            }
            inner.state.revision += 1;
            inner.state.clone()
        };

        let subscribers: Vec<Subscriber> = lock(&self.subscribers)
            .iter()
            .map(|(_, s)| Arc::clone(s))
            .collect();
        for subscriber in subscribers {
            subscriber(&snapshot);
        }
        ApplyOutcome::Applied
    }
}

fn set_instruments(state: &mut ViewState, instruments: Vec<Instrument>) -> bool {
    let changed = state.instruments != instruments || state.stale.instruments;
    state.instruments = instruments;
    state.stale.instruments = false;
    changed
}

fn set_portfolio(state: &mut ViewState, portfolio: Portfolio) -> bool {
    let changed = state.portfolio.as_ref() != Some(&portfolio) || state.stale.portfolio;
    state.portfolio = Some(portfolio);
    state.stale.portfolio = false;
    changed
}

fn set_chart(
    state: &mut ViewState,
    symbol: &str,
    timeframe: Timeframe,
    series: Vec<ChartPoint>,
) -> bool {
    let changed = state.selected_symbol.as_deref() != Some(symbol)
        || state.chart_timeframe != Some(timeframe)
        || state.chart_series != series
        || state.stale.chart;
    state.selected_symbol = Some(symbol.to_string());
    state.chart_timeframe = Some(timeframe);
    state.chart_series = series;
    state.stale.chart = false;
    changed
}

// A panicking subscriber must not wedge the store.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
