//! Public forecast endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{clamp_limit, normalize_asset, ApiResponse};
use crate::error::{AppError, Result};
use crate::types::{BaselineForecast, StoredForecast, DAILY};
use crate::AppState;

/// Listing of items for one asset and timeframe.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsResponse<T> {
    pub asset: String,
    pub timeframe: String,
    pub count: usize,
    pub items: Vec<T>,
}

impl<T> ItemsResponse<T> {
    pub fn new(asset: String, timeframe: String, items: Vec<T>) -> Self {
        Self {
            asset,
            timeframe,
            count: items.len(),
            items,
        }
    }
}

/// Query parameters for forecast history.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub asset: Option<String>,
    pub timeframe: Option<String>,
    pub limit: Option<String>,
}

impl HistoryQuery {
    /// Resolved timeframe, `1d` when not given.
    pub fn timeframe(&self) -> String {
        self.timeframe
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DAILY)
            .to_string()
    }
}

/// Create the forecast router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/history", get(get_history))
        .route("/:asset", get(get_forecast))
}

/// Current baseline forecast for an asset.
async fn get_forecast(
    State(state): State<AppState>,
    Path(asset): Path<String>,
) -> Result<Json<ApiResponse<BaselineForecast>>> {
    let asset = normalize_asset(Some(&asset), &state.config.forecast.default_asset);

    let lookup = state.forecast_service.current_forecast(&asset);
    let forecast = lookup
        .forecast()
        .cloned()
        .ok_or_else(|| AppError::ServiceUnavailable("No forecast available".to_string()))?;

    Ok(Json(ApiResponse::new(forecast)))
}

/// Stored forecasts, oldest first.
async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ItemsResponse<StoredForecast>>> {
    let asset = normalize_asset(query.asset.as_deref(), &state.config.forecast.default_asset);
    let timeframe = query.timeframe();
    let limit = clamp_limit(query.limit.as_deref(), 30, 1, 100);

    let mut items = state
        .forecast_service
        .forecast_history(&asset, &timeframe, limit)?;
    items.reverse();

    Ok(Json(ItemsResponse::new(asset, timeframe, items)))
}
