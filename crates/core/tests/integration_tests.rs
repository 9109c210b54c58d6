use async_trait::async_trait;
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use kite_dashboard_core::config::ClientConfig;
use kite_dashboard_core::errors::{CoreError, TransportError};
use kite_dashboard_core::gateway::traits::{HttpMethod, HttpRequest, HttpResponse, Transport};
use kite_dashboard_core::logging::{init_logging, LoggingConfig, DEFAULT_FILTER};
use kite_dashboard_core::models::chart::Timeframe;
use kite_dashboard_core::models::portfolio::TradeAction;
use kite_dashboard_core::models::view::WatchlistTab;
use kite_dashboard_core::services::notifier::{Notification, NotificationLevel, Notifier};
use kite_dashboard_core::KiteDashboard;

// ═══════════════════════════════════════════════════════════════════
// Simulated service (for testing without a running backend)
// ═══════════════════════════════════════════════════════════════════

/// A tiny in-memory paper-trading service: fixed quotes, a cash balance
/// and per-symbol holdings. Trades are settled at the quoted price.
struct SimulatedService {
    quotes: Vec<(&'static str, f64, f64, bool)>,
    book: Mutex<Book>,
}

struct Book {
    cash: f64,
    holdings: HashMap<String, (u32, f64)>,
    orders: VecDeque<serde_json::Value>,
    next_order: u64,
}

impl SimulatedService {
    fn new(cash: f64) -> Self {
        Self {
            quotes: vec![
                ("RELIANCE.NS", 2450.0, 1.25, true),
                ("TCS.NS", 3500.0, -0.40, false),
                ("HDFCBANK.BO", 1600.0, 0.10, true),
            ],
            book: Mutex::new(Book {
                cash,
                holdings: HashMap::new(),
                orders: VecDeque::new(),
                next_order: 1,
            }),
        }
    }

    fn price_of(&self, symbol: &str) -> Option<f64> {
        self.quotes
            .iter()
            .find(|(s, ..)| *s == symbol)
            .map(|(_, price, ..)| *price)
    }

    fn portfolio(&self, book: &Book) -> serde_json::Value {
        let holdings: Vec<_> = book
            .holdings
            .iter()
            .map(|(symbol, (qty, avg))| {
                let current = self.price_of(symbol).unwrap_or(*avg);
                json!({
                    "symbol": symbol, "quantity": qty, "avg_price": avg,
                    "current_price": current, "current_value": current * *qty as f64,
                    "pnl": (current - avg) * *qty as f64, "pnl_percent": 0.0
                })
            })
            .collect();
        let invested: f64 = book.holdings.values().map(|(q, avg)| *q as f64 * avg).sum();
        json!({
            "cash": book.cash,
            "total_value": book.cash + invested,
            "used_margin": invested,
            "holdings": holdings,
            "orders": book.orders.iter().collect::<Vec<_>>()
        })
    }

    fn trade(&self, body: &serde_json::Value) -> HttpResponse {
        let symbol = body["symbol"].as_str().unwrap_or_default().to_string();
        let action = body["action"].as_str().unwrap_or_default();
        let quantity = body["quantity"].as_u64().unwrap_or(0) as u32;
        let Some(price) = self.price_of(&symbol) else {
            return reject(404, "Stock not found");
        };

        let mut book = self.book.lock().unwrap();
        let cost = price * quantity as f64;
        match action {
            "buy" => {
                if cost > book.cash {
                    return reject(400, "Insufficient funds");
                }
                book.cash -= cost;
                let entry = book.holdings.entry(symbol.clone()).or_insert((0, 0.0));
                let total = entry.0 + quantity;
                entry.1 = (entry.1 * entry.0 as f64 + cost) / total as f64;
                entry.0 = total;
            }
            "sell" => {
                let held = book.holdings.get(&symbol).map(|(q, _)| *q).unwrap_or(0);
                if held < quantity {
                    return reject(400, "Insufficient shares to sell");
                }
                book.cash += cost;
                if held == quantity {
                    book.holdings.remove(&symbol);
                } else if let Some(entry) = book.holdings.get_mut(&symbol) {
                    entry.0 -= quantity;
                }
            }
            _ => return reject(422, "Invalid action"),
        }

        let id = book.next_order;
        book.next_order += 1;
        book.orders.push_back(json!({
            "id": id, "symbol": symbol, "action": action, "quantity": quantity,
            "price": price, "timestamp": format!("2024-05-02T10:00:{:02}", id),
            "status": "completed"
        }));

        let portfolio = self.portfolio(&book);
        HttpResponse::new(
            200,
            json!({ "message": format!("Successfully executed {action} order"), "portfolio": portfolio })
                .to_string(),
        )
    }
}

fn reject(status: u16, detail: &str) -> HttpResponse {
    HttpResponse::new(status, json!({ "detail": detail }).to_string())
}

#[async_trait]
impl Transport for SimulatedService {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let path = request.url.path().to_string();
        let response = match (request.method, path.as_str()) {
            (HttpMethod::Get, "/api/stocks") => {
                let data: Vec<_> = self
                    .quotes
                    .iter()
                    .map(|(s, price, pct, gem)| {
                        json!({ "symbol": s, "current_price": price, "price_change_pct": pct, "is_gem": gem })
                    })
                    .collect();
                HttpResponse::new(200, json!({ "data": data }).to_string())
            }
            (HttpMethod::Get, "/api/portfolio") => {
                let book = self.book.lock().unwrap();
                HttpResponse::new(200, self.portfolio(&book).to_string())
            }
            (HttpMethod::Get, p) if p.starts_with("/api/chart/") => {
                let symbol = &p["/api/chart/".len()..];
                let timeframe = request
                    .url
                    .query_pairs()
                    .find(|(k, _)| k == "timeframe")
                    .map(|(_, v)| v.into_owned())
                    .unwrap_or_default();
                match self.price_of(symbol) {
                    Some(price) => {
                        let points = if timeframe == "1d" { 30 } else { 10 };
                        let data: Vec<_> = (0..points)
                            .map(|i| {
                                json!({ "time": format!("t{i}"), "open": price, "high": price,
                                        "low": price, "close": price, "volume": 100 })
                            })
                            .collect();
                        HttpResponse::new(
                            200,
                            json!({ "symbol": symbol, "timeframe": timeframe, "data": data })
                                .to_string(),
                        )
                    }
                    None => reject(404, "Stock not found"),
                }
            }
            (HttpMethod::Post, "/api/trade") => match &request.body {
                Some(body) => self.trade(body),
                None => reject(422, "field required"),
            },
            _ => reject(404, "Not Found"),
        };
        Ok(response)
    }
}

#[derive(Default)]
struct Inbox(Mutex<Vec<Notification>>);

impl Notifier for Inbox {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}

fn dashboard(cash: f64) -> (KiteDashboard, Arc<Inbox>) {
    let inbox = Arc::new(Inbox::default());
    let dashboard = KiteDashboard::with_transport(
        ClientConfig::default(),
        Arc::new(SimulatedService::new(cash)),
        inbox.clone(),
    )
    .unwrap();
    (dashboard, inbox)
}

// ═══════════════════════════════════════════════════════════════════
// Full session
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_session_load_select_buy_sell() {
    let (dash, inbox) = dashboard(10_000_000.0);

    assert!(dash.initial_load().await.is_complete());
    let view = dash.view();
    assert_eq!(view.watchlist.len(), 3);
    assert_eq!(view.header.as_ref().unwrap().cash, "₹1,00,00,000.00");
    assert!(view.holdings.is_empty());

    dash.select_instrument("RELIANCE.NS").await.unwrap();
    let view = dash.view();
    assert_eq!(view.chart.title, "RELIANCE (NSE)");
    assert_eq!(view.chart.points, 30);

    dash.submit_trade("RELIANCE.NS", TradeAction::Buy, 10)
        .await
        .unwrap();
    let view = dash.view();
    assert_eq!(view.header.as_ref().unwrap().cash, "₹99,75,500.00");
    assert_eq!(view.holdings.len(), 1);
    assert_eq!(view.holdings[0].quantity, 10);
    assert_eq!(view.recent_orders[0].summary, "BUY 10 @ ₹2,450.00");

    dash.submit_trade("RELIANCE.NS", TradeAction::Sell, 10)
        .await
        .unwrap();
    let view = dash.view();
    assert_eq!(view.header.as_ref().unwrap().cash, "₹1,00,00,000.00");
    assert!(view.holdings.is_empty());
    assert_eq!(view.recent_orders.len(), 2);
    assert_eq!(view.recent_orders[0].summary, "SELL 10 @ ₹2,450.00");

    let inbox = inbox.0.lock().unwrap();
    assert_eq!(inbox.len(), 2);
    assert!(inbox.iter().all(|n| n.level == NotificationLevel::Success));
}

#[tokio::test]
async fn test_session_rejected_trade_keeps_portfolio() {
    let (dash, inbox) = dashboard(1_000.0);
    dash.initial_load().await;
    let before = dash.state().portfolio;

    let err = dash
        .submit_trade("TCS.NS", TradeAction::Buy, 1)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Insufficient funds");
    assert_eq!(dash.state().portfolio, before);

    let err = dash
        .submit_trade("TCS.NS", TradeAction::Sell, 1)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Insufficient shares to sell");

    let inbox = inbox.0.lock().unwrap();
    assert_eq!(inbox[0].to_string(), "Error: Insufficient funds");
    assert_eq!(inbox[1].to_string(), "Error: Insufficient shares to sell");
}

#[tokio::test]
async fn test_session_gems_tab_and_timeframe() {
    let (dash, _) = dashboard(10_000_000.0);
    dash.initial_load().await;

    dash.change_tab(WatchlistTab::Gems);
    let labels: Vec<String> = dash.view().watchlist.into_iter().map(|r| r.label).collect();
    assert_eq!(labels, vec!["RELIANCE", "HDFCBANK"]);

    dash.select_instrument("HDFCBANK.BO").await.unwrap();
    assert_eq!(dash.view().chart.title, "HDFCBANK (BSE)");

    dash.change_timeframe(Timeframe::FifteenMinutes).await.unwrap();
    let view = dash.view();
    assert_eq!(view.chart.points, 10);
    assert_eq!(view.chart.timeframe, Some(Timeframe::FifteenMinutes));
    assert_eq!(view.selected_timeframe, Timeframe::FifteenMinutes);
}

#[tokio::test]
async fn test_session_selecting_before_load_is_rejected() {
    let (dash, _) = dashboard(0.0);
    let err = dash.select_instrument("RELIANCE.NS").await.unwrap_err();
    assert!(matches!(err, CoreError::ValidationError(_)));
}

// ═══════════════════════════════════════════════════════════════════
// Logging
// ═══════════════════════════════════════════════════════════════════

#[test]
fn test_logging_defaults() {
    let config = LoggingConfig::default();
    assert_eq!(config.filter, DEFAULT_FILTER);
    assert!(config.with_target);
}

#[test]
fn test_logging_rejects_bad_filter() {
    let config = LoggingConfig {
        filter: "kite_dashboard_core=loudest".into(),
        ..LoggingConfig::default()
    };
    assert!(matches!(init_logging(&config), Err(CoreError::Config(_))));
}

#[test]
fn test_logging_installs_once() {
    assert!(init_logging(&LoggingConfig::default()).is_ok());
    assert!(init_logging(&LoggingConfig::default()).is_err());
}
