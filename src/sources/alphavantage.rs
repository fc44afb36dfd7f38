//! Alpha Vantage client for daily price history.
//!
//! Note: Free tier has very limited rate limits (25 requests/day, 5/minute).

use crate::error::AppError;
use crate::types::{PriceBar, DAILY};
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Provenance tag stored on bars fetched from Alpha Vantage.
pub const SOURCE_NAME: &str = "alphavantage";

/// Time series daily response.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesDailyResponse {
    #[serde(rename = "Meta Data")]
    pub meta_data: Option<TimeSeriesMetaData>,
    #[serde(rename = "Time Series (Daily)")]
    pub time_series: Option<HashMap<String, TimeSeriesDataPoint>>,
    /// Set instead of the series when the request was rejected.
    #[serde(rename = "Error Message")]
    pub error_message: Option<String>,
    /// Set instead of the series when the rate limit was hit.
    #[serde(rename = "Note")]
    pub note: Option<String>,
}

/// Time series meta data.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesMetaData {
    #[serde(rename = "2. Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "3. Last Refreshed")]
    pub last_refreshed: Option<String>,
}

/// Individual time series data point.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeSeriesDataPoint {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: Option<String>,
}

/// Alpha Vantage API client.
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AlphaVantageClient {
    /// Create a new Alpha Vantage client.
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Fetch the daily series for a symbol, ascending by date.
    pub async fn get_daily_series(&self, symbol: &str) -> Result<Vec<PriceBar>, AppError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "TIME_SERIES_DAILY returned {}",
                response.status()
            )));
        }

        let data: TimeSeriesDailyResponse = response.json().await?;
        parse_daily_series(symbol, data)
    }
}

/// Convert a daily response into bars stamped at UTC midnight.
///
/// Entries with an unparsable date or price are skipped.
pub fn parse_daily_series(
    symbol: &str,
    data: TimeSeriesDailyResponse,
) -> Result<Vec<PriceBar>, AppError> {
    let Some(series) = data.time_series else {
        let detail = data
            .error_message
            .or(data.note)
            .unwrap_or_else(|| "no time series data".to_string());
        return Err(AppError::ExternalApi(format!(
            "TIME_SERIES_DAILY for {}: {}",
            symbol, detail
        )));
    };

    let mut bars: Vec<PriceBar> = series
        .into_iter()
        .filter_map(|(date, point)| {
            let bar = to_price_bar(symbol, &date, &point);
            if bar.is_none() {
                warn!("Skipping malformed {} entry for {}", date, symbol);
            }
            bar
        })
        .collect();

    bars.sort_by_key(|b| b.timestamp);
    debug!("Parsed {} daily bars for {}", bars.len(), symbol);

    Ok(bars)
}

fn to_price_bar(symbol: &str, date: &str, point: &TimeSeriesDataPoint) -> Option<PriceBar> {
    let timestamp = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()?
        .and_hms_opt(0, 0, 0)?
        .and_utc();

    Some(PriceBar {
        asset: symbol.to_string(),
        timeframe: DAILY.to_string(),
        timestamp,
        open: parse_price(&point.open)?,
        high: parse_price(&point.high)?,
        low: parse_price(&point.low)?,
        close: parse_price(&point.close)?,
        volume: point.volume.as_deref().and_then(parse_price),
        source: SOURCE_NAME.to_string(),
    })
}

fn parse_price(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn response(json: &str) -> TimeSeriesDailyResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_daily_series_sorted_at_midnight() {
        let data = response(
            r#"{
                "Meta Data": {"2. Symbol": "XAUUSD", "3. Last Refreshed": "2024-01-03"},
                "Time Series (Daily)": {
                    "2024-01-03": {"1. open": "2040.1", "2. high": "2050.0", "3. low": "2030.5", "4. close": "2045.2", "5. volume": "1200"},
                    "2024-01-02": {"1. open": "2030.0", "2. high": "2042.0", "3. low": "2025.0", "4. close": "2040.1", "5. volume": "1100"}
                }
            }"#,
        );

        let bars = parse_daily_series("XAUUSD", data).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap());
        assert_eq!(bars[1].timestamp, Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap());
        assert_eq!(bars[1].close, 2045.2);
        assert_eq!(bars[0].volume, Some(1100.0));
        assert_eq!(bars[0].timeframe, DAILY);
        assert_eq!(bars[0].source, SOURCE_NAME);
    }

    #[test]
    fn test_parse_daily_series_skips_malformed_entries() {
        let data = response(
            r#"{
                "Time Series (Daily)": {
                    "not-a-date": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "1"},
                    "2024-01-02": {"1. open": "1", "2. high": "1", "3. low": "1", "4. close": "abc"},
                    "2024-01-03": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5"}
                }
            }"#,
        );

        let bars = parse_daily_series("XAUUSD", data).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].close, 1.5);
        assert_eq!(bars[0].volume, None);
    }

    #[test]
    fn test_parse_daily_series_missing_series() {
        let data = response(r#"{"Note": "API call frequency exceeded"}"#);

        let err = parse_daily_series("XAUUSD", data).unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
        assert!(err.to_string().contains("frequency"));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price(" 12.5 "), Some(12.5));
        assert_eq!(parse_price("NaN"), None);
        assert_eq!(parse_price(""), None);
    }
}
