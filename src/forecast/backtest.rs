//! Walk-forward accuracy backtest of the baseline rule.

use chrono::{DateTime, Duration, Utc};

use super::{decision_at, engineer_features};
use crate::error::ForecastError;
use crate::types::{BacktestResult, PriceBar};

/// Hit rate of the baseline rule over the last `window_days` days.
pub fn backtest(bars: &[PriceBar], window_days: i64) -> Result<BacktestResult, ForecastError> {
    backtest_at(bars, window_days, Utc::now())
}

/// [`backtest`] evaluated as of `now`.
///
/// Every row stamped within `[now - window_days, now]` that has a realized
/// label is scored against the decision the rule would have produced from
/// the rows before it. The last row has no next bar and is never scored.
pub fn backtest_at(
    bars: &[PriceBar],
    window_days: i64,
    now: DateTime<Utc>,
) -> Result<BacktestResult, ForecastError> {
    if window_days < 0 {
        return Err(ForecastError::NegativeWindow(window_days));
    }
    let window = u32::try_from(window_days).unwrap_or(u32::MAX);

    let rows = engineer_features(bars);
    if rows.len() < 2 {
        return Ok(BacktestResult::empty(window));
    }

    let cutoff = Duration::try_days(window_days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);

    let mut total = 0u32;
    let mut correct = 0u32;
    for (index, row) in rows.iter().enumerate().take(rows.len() - 1) {
        if row.timestamp < cutoff || row.timestamp > now {
            continue;
        }
        let Some(actual) = row.label else {
            continue;
        };

        total += 1;
        if decision_at(&rows, index) == actual {
            correct += 1;
        }
    }

    Ok(BacktestResult::from_counts(window, total, correct))
}
