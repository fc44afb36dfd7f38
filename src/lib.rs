//! Bellwether - baseline directional forecasting for daily price history
//!
//! The pure engine lives in [`forecast`]; [`services`] wraps it with storage,
//! caching and price sync, and [`api`] exposes it over HTTP.

pub mod api;
pub mod config;
pub mod error;
pub mod forecast;
pub mod services;
pub mod sources;
pub mod types;

use axum::Router;
use config::Config;
use services::{ForecastService, PriceSyncService};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub forecast_service: Arc<ForecastService>,
    pub price_sync: Arc<PriceSyncService>,
}

/// Build the application router with its state attached.
pub fn app(state: AppState) -> Router {
    Router::new().merge(api::router()).with_state(state)
}

// Re-export commonly used types
pub use types::*;
