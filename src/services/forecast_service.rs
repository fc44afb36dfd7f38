//! Collaborator layer around the pure forecasting engine.
//!
//! Loads history through the configured [`DataSource`], runs the engine,
//! caches current forecasts and records them for auditing.

use crate::config::ForecastConfig;
use crate::error::{ForecastError, StoreError};
use crate::forecast::{backtest, compute_forecast, engineer_features};
use crate::services::{Cache, DataSource, ForecastRepository, PriceHistoryRepository};
use crate::types::{
    BacktestResult, BaselineForecast, FeatureSet, ModelRun, PriceBar, StoredForecast,
    BASELINE_MODEL_TYPE, BASELINE_MODEL_VERSION, DAILY,
};
use chrono::{Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Result of asking for the current forecast of an asset.
#[derive(Debug, Clone, PartialEq)]
pub enum ForecastLookup {
    /// Forecast computed from stored history.
    Computed(BaselineForecast),
    /// No data source is configured; a neutral placeholder is served.
    NeutralDefault(BaselineForecast),
    /// A data source is configured but holds no history for the asset.
    NoData,
}

impl ForecastLookup {
    /// The forecast to serve, if any.
    pub fn forecast(&self) -> Option<&BaselineForecast> {
        match self {
            ForecastLookup::Computed(f) | ForecastLookup::NeutralDefault(f) => Some(f),
            ForecastLookup::NoData => None,
        }
    }
}

/// A stored baseline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineRun {
    pub forecast: BaselineForecast,
    pub model_run_id: Option<String>,
    pub forecast_id: Option<String>,
}

/// Forecasting service shared by the HTTP handlers.
pub struct ForecastService {
    source: Option<Arc<dyn DataSource>>,
    cache: Cache<BaselineForecast>,
    config: ForecastConfig,
}

impl ForecastService {
    /// Create a new service. `source = None` means no data source is configured.
    pub fn new(source: Option<Arc<dyn DataSource>>, config: ForecastConfig) -> Arc<Self> {
        Arc::new(Self {
            source,
            cache: Cache::new(config.cache_ttl),
            config,
        })
    }

    /// Whether a data source is configured.
    pub fn has_data_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Load history; `None` when no data source is configured.
    ///
    /// Read failures are logged and treated as empty history.
    fn load_history(&self, asset: &str, limit: Option<usize>) -> Option<Vec<PriceBar>> {
        let source = self.source.as_ref()?;
        match source.get_price_history(asset, DAILY, limit) {
            Ok(bars) => Some(bars),
            Err(e) => {
                error!("Failed to load price history for {}: {}", asset, e);
                Some(Vec::new())
            }
        }
    }

    /// Engineered feature rows over the latest `limit` bars.
    pub fn engineered_features(&self, asset: &str, limit: usize) -> FeatureSet {
        let items = match self.load_history(asset, Some(limit)) {
            Some(bars) => engineer_features(&bars),
            None => {
                warn!("No data source configured; returning empty features for {}", asset);
                Vec::new()
            }
        };

        FeatureSet {
            asset: asset.to_string(),
            timeframe: DAILY.to_string(),
            items,
        }
    }

    /// Current forecast for an asset, served from cache when fresh.
    pub fn current_forecast(&self, asset: &str) -> ForecastLookup {
        if let Some((forecast, age)) = self.cache.get(asset) {
            debug!("Serving cached forecast for {} (age {:?})", asset, age);
            return ForecastLookup::Computed(forecast);
        }

        let lookup = self.compute_current(asset);
        if let ForecastLookup::Computed(ref forecast) = lookup {
            self.cache.set(asset.to_string(), forecast.clone());
        }
        lookup
    }

    fn compute_current(&self, asset: &str) -> ForecastLookup {
        let Some(bars) = self.load_history(asset, Some(self.config.history_limit)) else {
            warn!("No data source configured; serving neutral forecast for {}", asset);
            return ForecastLookup::NeutralDefault(BaselineForecast::neutral(asset, Utc::now()));
        };

        let rows = engineer_features(&bars);
        match compute_forecast(&rows, asset) {
            Some(forecast) => {
                debug!(
                    "Computed {} forecast for {} with confidence {}",
                    forecast.decision, asset, forecast.confidence
                );
                ForecastLookup::Computed(forecast)
            }
            None => ForecastLookup::NoData,
        }
    }

    /// Drop a cached forecast, e.g. after the asset's history changed.
    pub fn invalidate(&self, asset: &str) {
        if self.cache.remove(asset).is_some() {
            debug!("Invalidated cached forecast for {}", asset);
        }
    }

    /// Walk-forward accuracy over the full stored history.
    ///
    /// Missing or unreadable history yields a zero-sample result.
    pub fn baseline_accuracy(
        &self,
        asset: &str,
        window_days: i64,
    ) -> Result<BacktestResult, ForecastError> {
        let bars = self.load_history(asset, None).unwrap_or_else(|| {
            warn!("No data source configured; backtest for {} has no samples", asset);
            Vec::new()
        });
        backtest(&bars, window_days)
    }

    /// Compute a fresh forecast and record it.
    ///
    /// Returns `None` when there is no grounded forecast to store.
    pub fn run_baseline(&self, asset: &str) -> Option<BaselineRun> {
        let source = self.source.as_ref()?;
        let ForecastLookup::Computed(forecast) = self.compute_current(asset) else {
            return None;
        };

        self.cache.set(asset.to_string(), forecast.clone());
        Some(self.store_baseline_forecast(source.as_ref(), forecast))
    }

    /// Persist a model-run record and a forecast record.
    ///
    /// Individual insert failures are logged and leave the id empty.
    fn store_baseline_forecast(&self, source: &dyn DataSource, forecast: BaselineForecast) -> BaselineRun {
        let history = match source.get_price_history(
            &forecast.asset,
            &forecast.timeframe,
            Some(self.config.history_limit),
        ) {
            Ok(history) => history,
            Err(e) => {
                error!("Failed to load training window for {}: {}", forecast.asset, e);
                return BaselineRun {
                    forecast,
                    model_run_id: None,
                    forecast_id: None,
                };
            }
        };

        let train_start = history.first().map_or(forecast.as_of, |b| b.timestamp);
        let train_end = history.last().map_or(forecast.as_of, |b| b.timestamp);
        let now = Utc::now();

        let run = ModelRun {
            id: Uuid::new_v4().to_string(),
            model_type: BASELINE_MODEL_TYPE.to_string(),
            model_version: BASELINE_MODEL_VERSION.to_string(),
            asset: forecast.asset.clone(),
            timeframe: forecast.timeframe.clone(),
            train_start,
            train_end,
            val_metric_name: "n/a".to_string(),
            val_metric_value: 0.0,
            params: serde_json::json!({
                "description": "Directional baseline on daily candles using SMA(5)/SMA(20) and the recent label majority.",
                "horizon": forecast.horizon,
            }),
            created_at: now,
        };
        let model_run_id = match source.insert_model_run(&run) {
            Ok(()) => Some(run.id),
            Err(e) => {
                error!("Failed to insert model run for {}: {}", forecast.asset, e);
                None
            }
        };

        let record = StoredForecast {
            id: Uuid::new_v4().to_string(),
            asset: forecast.asset.clone(),
            timeframe: forecast.timeframe.clone(),
            forecast_horizon: forecast.horizon.clone(),
            target_type: "direction".to_string(),
            prediction_value: f64::from(forecast.confidence) / 100.0,
            prediction_direction: forecast.decision,
            model_type: BASELINE_MODEL_TYPE.to_string(),
            model_version: BASELINE_MODEL_VERSION.to_string(),
            valid_from: forecast.as_of,
            valid_to: forecast.as_of + Duration::days(1),
            created_at: now,
        };
        let forecast_id = match source.insert_forecast(&record) {
            Ok(()) => Some(record.id),
            Err(e) => {
                error!("Failed to insert forecast for {}: {}", forecast.asset, e);
                None
            }
        };

        info!(
            "Stored {} baseline forecast for {} (confidence {})",
            forecast.decision, forecast.asset, forecast.confidence
        );

        BaselineRun {
            forecast,
            model_run_id,
            forecast_id,
        }
    }

    /// Stored forecasts, newest first. Empty without a data source.
    pub fn forecast_history(
        &self,
        asset: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<StoredForecast>, StoreError> {
        match self.source.as_ref() {
            Some(source) => source.recent_forecasts(asset, timeframe, limit),
            None => Ok(Vec::new()),
        }
    }
}
