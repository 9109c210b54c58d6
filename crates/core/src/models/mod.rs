pub mod chart;
pub mod instrument;
pub mod portfolio;
pub mod view;
