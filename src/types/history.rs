use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Direction;

/// Model identifier for the baseline heuristic.
pub const BASELINE_MODEL_TYPE: &str = "baseline_directional";
/// Version of the baseline heuristic.
pub const BASELINE_MODEL_VERSION: &str = "v1";

/// Audit record describing one model run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRun {
    pub id: String,
    pub model_type: String,
    pub model_version: String,
    pub asset: String,
    pub timeframe: String,
    pub train_start: DateTime<Utc>,
    pub train_end: DateTime<Utc>,
    pub val_metric_name: String,
    pub val_metric_value: f64,
    pub params: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// A persisted forecast with its validity window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredForecast {
    pub id: String,
    pub asset: String,
    pub timeframe: String,
    pub forecast_horizon: String,
    pub target_type: String,
    /// Confidence as a 0-1 fraction.
    pub prediction_value: f64,
    pub prediction_direction: Direction,
    pub model_type: String,
    pub model_version: String,
    pub valid_from: DateTime<Utc>,
    pub valid_to: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
