pub mod controller;
pub mod formatter;
pub mod notifier;
pub mod presenter;
pub mod store;
