//! Storage seams used by the forecasting services.
//!
//! The pure engine never sees these traits; services fetch history through
//! them and hand plain slices to the engine.

use crate::error::StoreError;
use crate::types::{ModelRun, PriceBar, StoredForecast};

/// Read/write access to stored price history.
pub trait PriceHistoryRepository: Send + Sync {
    /// Most recent `limit` bars (all when `None`), ascending by timestamp.
    fn get_price_history(
        &self,
        asset: &str,
        timeframe: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PriceBar>, StoreError>;

    /// Insert or replace bars keyed by `(asset, timeframe, timestamp)`.
    /// Returns the number of bars written.
    fn upsert_price_bars(&self, bars: &[PriceBar]) -> Result<usize, StoreError>;
}

/// Audit trail of model runs and emitted forecasts.
pub trait ForecastRepository: Send + Sync {
    fn insert_model_run(&self, run: &ModelRun) -> Result<(), StoreError>;

    fn insert_forecast(&self, forecast: &StoredForecast) -> Result<(), StoreError>;

    /// Latest forecasts, newest `valid_from` first.
    fn recent_forecasts(
        &self,
        asset: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<StoredForecast>, StoreError>;
}

/// A backing store that provides both price history and forecast records.
pub trait DataSource: PriceHistoryRepository + ForecastRepository {}

impl<T: PriceHistoryRepository + ForecastRepository> DataSource for T {}
