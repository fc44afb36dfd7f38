//! Admin endpoints, guarded by the shared cron secret.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::forecast::{HistoryQuery, ItemsResponse};
use super::{clamp_limit, normalize_asset, ApiResponse};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::services::{BaselineRun, SyncReport};
use crate::types::{EngineeredFeatureRow, StoredForecast};
use crate::AppState;

/// Header carrying the shared admin secret.
pub const CRON_SECRET_HEADER: &str = "x-cron-secret";

#[derive(Debug, Default, Deserialize)]
pub struct AssetQuery {
    pub asset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeaturesQuery {
    pub asset: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsQuery {
    pub asset: Option<String>,
    pub window_days: Option<String>,
}

/// Backtest summary with accuracy as a rounded percentage.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsResponse {
    pub window_days: u32,
    pub total_samples: u32,
    pub correct: u32,
    pub accuracy: u32,
}

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/forecast/features-preview", get(features_preview))
        .route("/forecast/baseline-metrics", get(baseline_metrics))
        .route("/forecast/run-baseline", post(run_baseline))
        .route("/forecast/history", get(forecast_history))
        .route("/sync-price-history", post(sync_price_history))
}

/// Reject requests whose secret header does not match the configured one.
///
/// Both values are trimmed; a blank or missing secret on either side fails.
pub fn require_cron_secret(headers: &HeaderMap, config: &Config) -> Result<()> {
    let expected = config.cron_secret.as_deref().map(str::trim).unwrap_or("");
    let provided = headers
        .get(CRON_SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .unwrap_or("");

    if expected.is_empty() || provided.is_empty() || provided != expected {
        warn!("Rejected admin request with missing or invalid cron secret");
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

/// Resolve a requested backtest window; invalid values use the default.
fn window_days(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|days| *days > 0)
        .unwrap_or(default)
}

async fn features_preview(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<FeaturesQuery>,
) -> Result<Json<ItemsResponse<EngineeredFeatureRow>>> {
    require_cron_secret(&headers, &state.config)?;

    let asset = normalize_asset(query.asset.as_deref(), &state.config.forecast.default_asset);
    let limit = clamp_limit(query.limit.as_deref(), 200, 10, 500);

    let features = state.forecast_service.engineered_features(&asset, limit);
    Ok(Json(ItemsResponse::new(
        features.asset,
        features.timeframe,
        features.items,
    )))
}

async fn baseline_metrics(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<MetricsResponse>> {
    require_cron_secret(&headers, &state.config)?;

    let asset = normalize_asset(query.asset.as_deref(), &state.config.forecast.default_asset);
    let days = window_days(
        query.window_days.as_deref(),
        state.config.forecast.default_window_days,
    );

    let result = state
        .forecast_service
        .baseline_accuracy(&asset, i64::from(days))?;

    Ok(Json(MetricsResponse {
        window_days: result.window_days,
        total_samples: result.total_samples,
        correct: result.correct,
        accuracy: result.accuracy_pct(),
    }))
}

async fn run_baseline(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AssetQuery>,
) -> Result<Json<ApiResponse<BaselineRun>>> {
    require_cron_secret(&headers, &state.config)?;

    let asset = normalize_asset(query.asset.as_deref(), &state.config.forecast.default_asset);
    let run = state
        .forecast_service
        .run_baseline(&asset)
        .ok_or_else(|| AppError::ServiceUnavailable("No forecast available".to_string()))?;

    info!(
        "Baseline run for {}: {} ({})",
        asset, run.forecast.decision, run.forecast.confidence
    );
    Ok(Json(ApiResponse::new(run)))
}

async fn forecast_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ItemsResponse<StoredForecast>>> {
    require_cron_secret(&headers, &state.config)?;

    let asset = normalize_asset(query.asset.as_deref(), &state.config.forecast.default_asset);
    let timeframe = query.timeframe();
    let limit = clamp_limit(query.limit.as_deref(), 20, 1, 100);

    let items = state
        .forecast_service
        .forecast_history(&asset, &timeframe, limit)?;

    Ok(Json(ItemsResponse::new(asset, timeframe, items)))
}

async fn sync_price_history(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<AssetQuery>,
) -> Result<Json<SyncReport>> {
    require_cron_secret(&headers, &state.config)?;

    let asset = normalize_asset(query.asset.as_deref(), &state.config.forecast.default_asset);
    Ok(Json(state.price_sync.sync_daily(&asset).await))
}
