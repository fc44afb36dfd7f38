use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::DAILY;

/// Realized or predicted direction of a one-step price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// All directions in tie-break order.
    pub const ALL: [Direction; 3] = [Direction::Up, Direction::Down, Direction::Flat];

    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "UP" => Some(Self::Up),
            "DOWN" => Some(Self::Down),
            "FLAT" => Some(Self::Flat),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
            Direction::Flat => "FLAT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engineered features for a single bar.
///
/// `label` is the realized direction from this bar to the next one. It is
/// known only in hindsight and must never justify a decision made as of
/// this row's timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineeredFeatureRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub log_return_1d: Option<f64>,
    pub sma_5: Option<f64>,
    pub sma_20: Option<f64>,
    pub vol_5: Option<f64>,
    pub vol_20: Option<f64>,
    pub label: Option<Direction>,
}

/// Engineered rows for one asset, as served by the diagnostics endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureSet {
    pub asset: String,
    pub timeframe: String,
    pub items: Vec<EngineeredFeatureRow>,
}

/// A point-in-time directional forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaselineForecast {
    pub asset: String,
    pub timeframe: String,
    pub horizon: String,
    pub decision: Direction,
    /// Heuristic support score, always within 0..=100.
    pub confidence: u8,
    pub as_of: DateTime<Utc>,
    pub reason: String,
}

impl BaselineForecast {
    /// Neutral placeholder used when no price-history source is configured.
    pub fn neutral(asset: &str, now: DateTime<Utc>) -> Self {
        Self {
            asset: asset.to_string(),
            timeframe: DAILY.to_string(),
            horizon: DAILY.to_string(),
            decision: Direction::Flat,
            confidence: 0,
            as_of: now,
            reason: "No price history or data source configured; returning a neutral (FLAT) baseline forecast."
                .to_string(),
        }
    }
}

/// Summary of a walk-forward accuracy backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestResult {
    pub window_days: u32,
    pub total_samples: u32,
    pub correct: u32,
    /// Fraction of correct calls, 0.0..=1.0.
    pub accuracy: f64,
}

impl BacktestResult {
    /// A result with no evaluable samples.
    pub fn empty(window_days: u32) -> Self {
        Self {
            window_days,
            total_samples: 0,
            correct: 0,
            accuracy: 0.0,
        }
    }

    /// Build a result from counts, deriving accuracy.
    pub fn from_counts(window_days: u32, total_samples: u32, correct: u32) -> Self {
        let accuracy = if total_samples > 0 {
            correct as f64 / total_samples as f64
        } else {
            0.0
        };
        Self {
            window_days,
            total_samples,
            correct,
            accuracy,
        }
    }

    /// Accuracy as a rounded percentage (0-100).
    pub fn accuracy_pct(&self) -> u32 {
        (self.accuracy * 100.0).round() as u32
    }
}
