//! Feature engineering over daily bars.

use super::{LABEL_THRESHOLD, SMA_LONG, SMA_SHORT};
use crate::types::{Direction, EngineeredFeatureRow, PriceBar};

/// Build one feature row per bar.
///
/// Bars are sorted ascending by timestamp first, so the output does not
/// depend on input order. Missing history or invalid prices leave the
/// affected fields empty instead of producing NaN.
pub fn engineer_features(bars: &[PriceBar]) -> Vec<EngineeredFeatureRow> {
    if bars.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&PriceBar> = bars.iter().collect();
    sorted.sort_by_key(|bar| bar.timestamp);

    let closes: Vec<f64> = sorted.iter().map(|bar| bar.close).collect();
    let log_returns: Vec<Option<f64>> = (0..closes.len())
        .map(|i| log_return(&closes, i))
        .collect();
    // Missing returns count as zero so early volatility is still defined.
    let filled_returns: Vec<f64> = log_returns.iter().map(|r| r.unwrap_or(0.0)).collect();

    sorted
        .iter()
        .enumerate()
        .map(|(i, bar)| EngineeredFeatureRow {
            timestamp: bar.timestamp,
            close: closes[i],
            log_return_1d: log_returns[i],
            sma_5: rolling_mean(&closes, SMA_SHORT, i),
            sma_20: rolling_mean(&closes, SMA_LONG, i),
            vol_5: rolling_std(&filled_returns, SMA_SHORT, i),
            vol_20: rolling_std(&filled_returns, SMA_LONG, i),
            label: closes
                .get(i + 1)
                .and_then(|&next| label_direction(closes[i], next)),
        })
        .collect()
}

/// `ln(close[i] / close[i-1])`, or `None` for the first bar and invalid prices.
fn log_return(closes: &[f64], index: usize) -> Option<f64> {
    if index == 0 {
        return None;
    }
    let prev = closes[index - 1];
    let current = closes[index];
    if !prev.is_finite() || !current.is_finite() || prev <= 0.0 {
        return None;
    }
    let value = (current / prev).ln();
    value.is_finite().then_some(value)
}

/// Arithmetic mean of `values[index + 1 - window..=index]`.
pub(crate) fn rolling_mean(values: &[f64], window: usize, index: usize) -> Option<f64> {
    if window == 0 || index >= values.len() || index + 1 < window {
        return None;
    }
    let slice = &values[index + 1 - window..=index];
    let mean = slice.iter().sum::<f64>() / window as f64;
    mean.is_finite().then_some(mean)
}

/// Population standard deviation over the same window as [`rolling_mean`].
pub(crate) fn rolling_std(values: &[f64], window: usize, index: usize) -> Option<f64> {
    let mean = rolling_mean(values, window, index)?;
    let slice = &values[index + 1 - window..=index];
    let variance = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / window as f64;
    let std = variance.sqrt();
    std.is_finite().then_some(std)
}

/// Classify the move from `current` to `next` with a ±0.1% dead band.
pub(crate) fn label_direction(current: f64, next: f64) -> Option<Direction> {
    if !current.is_finite() || !next.is_finite() || current <= 0.0 {
        return None;
    }
    let change = (next - current) / current;
    if change > LABEL_THRESHOLD {
        Some(Direction::Up)
    } else if change < -LABEL_THRESHOLD {
        Some(Direction::Down)
    } else {
        Some(Direction::Flat)
    }
}
