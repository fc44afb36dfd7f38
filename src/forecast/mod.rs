//! Baseline directional forecasting engine.
//!
//! Pure, synchronous functions over in-memory price history:
//! - [`engineer_features`] turns daily bars into feature rows with a
//!   next-day direction label,
//! - [`compute_forecast`] derives the current UP/DOWN/FLAT call with a
//!   confidence score,
//! - [`backtest`] replays the decision rule point-in-time and measures
//!   its hit rate.
//!
//! Nothing here performs I/O, reads configuration or caches results.

pub mod backtest;
pub mod baseline;
pub mod features;

pub use backtest::{backtest, backtest_at};
pub use baseline::{compute_forecast, decision_at, majority_label};
pub use features::engineer_features;

/// Short simple-moving-average window.
pub const SMA_SHORT: usize = 5;
/// Long simple-moving-average window.
pub const SMA_LONG: usize = 20;
/// Relative move below which a day is labelled FLAT (0.1%).
pub const LABEL_THRESHOLD: f64 = 0.001;
/// Number of preceding labels considered by the majority vote.
pub const LABEL_WINDOW: usize = 10;
/// Confidence with no supporting labels.
pub const BASE_CONFIDENCE: u8 = 40;
/// Confidence added per supporting label.
pub const CONFIDENCE_STEP: u8 = 6;
/// Confidence used if the computed score is not finite.
pub const FALLBACK_CONFIDENCE: u8 = 50;
