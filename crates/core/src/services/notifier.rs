use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A message for the user. The host decides how to show it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    /// The bare message; [`Display`](std::fmt::Display) adds the level prefix.
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.level {
            NotificationLevel::Success => write!(f, "{}", self.message),
            NotificationLevel::Error => write!(f, "Error: {}", self.message),
        }
    }
}

/// Where user-facing outcomes are surfaced.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier for headless hosts: everything goes to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => info!(target: "kite_dashboard_core::notify", "{notification}"),
            NotificationLevel::Error => warn!(target: "kite_dashboard_core::notify", "{notification}"),
        }
    }
}
