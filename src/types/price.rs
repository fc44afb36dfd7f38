use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timeframe label for daily bars.
pub const DAILY: &str = "1d";

/// One OHLC observation for an asset and timeframe.
///
/// Bars are unique per `(asset, timeframe, timestamp)`. Daily bars are
/// stamped at UTC midnight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
    pub asset: String,
    pub timeframe: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Provenance of the bar (e.g. "alphavantage").
    pub source: String,
}

impl PriceBar {
    /// Create a daily bar where only the close is known.
    ///
    /// Open, high and low are set to the close. Handy for synthetic series.
    pub fn daily_close(asset: &str, timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            asset: asset.to_string(),
            timeframe: DAILY.to_string(),
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: None,
            source: "synthetic".to_string(),
        }
    }
}
