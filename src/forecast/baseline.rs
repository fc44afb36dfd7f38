//! Majority-vote decision rule with a moving-average fallback.

use std::cmp::Ordering;

use super::{BASE_CONFIDENCE, CONFIDENCE_STEP, FALLBACK_CONFIDENCE, LABEL_WINDOW};
use crate::types::{BaselineForecast, Direction, EngineeredFeatureRow, DAILY};

/// Most frequent label, ignoring missing ones.
///
/// Ties go to the first direction in [`Direction::ALL`] order (UP, DOWN,
/// FLAT). Returns `None` when no labels are present.
pub fn majority_label<I>(labels: I) -> Option<Direction>
where
    I: IntoIterator<Item = Option<Direction>>,
{
    let mut counts = [0usize; 3];
    for label in labels.into_iter().flatten() {
        counts[direction_index(label)] += 1;
    }

    let mut best: Option<(Direction, usize)> = None;
    for (direction, count) in Direction::ALL.into_iter().zip(counts) {
        if count > 0 && best.map_or(true, |(_, top)| count > top) {
            best = Some((direction, count));
        }
    }
    best.map(|(direction, _)| direction)
}

fn direction_index(direction: Direction) -> usize {
    match direction {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Flat => 2,
    }
}

/// Direction implied by SMA(5) vs SMA(20); FLAT if either is missing.
fn sma_crossover(row: &EngineeredFeatureRow) -> Direction {
    match (row.sma_5, row.sma_20) {
        (Some(short), Some(long)) => match short.partial_cmp(&long) {
            Some(Ordering::Greater) => Direction::Up,
            Some(Ordering::Less) => Direction::Down,
            _ => Direction::Flat,
        },
        _ => Direction::Flat,
    }
}

/// Labels of the rows strictly before `index`, at most [`LABEL_WINDOW`] of them.
fn window_labels(rows: &[EngineeredFeatureRow], index: usize) -> impl Iterator<Item = Option<Direction>> + '_ {
    let end = index.min(rows.len());
    let start = end.saturating_sub(LABEL_WINDOW);
    rows[start..end].iter().map(|row| row.label)
}

/// Decision the rule would have made as of `rows[index]`.
///
/// Only labels of earlier rows are used; the row's own label is the
/// unknown future. Out-of-range indexes yield FLAT.
pub fn decision_at(rows: &[EngineeredFeatureRow], index: usize) -> Direction {
    let Some(current) = rows.get(index) else {
        return Direction::Flat;
    };
    majority_label(window_labels(rows, index)).unwrap_or_else(|| sma_crossover(current))
}

/// Current forecast from the latest row of `rows`.
///
/// Returns `None` for empty input; whether to substitute a neutral
/// placeholder is the caller's decision.
pub fn compute_forecast(rows: &[EngineeredFeatureRow], asset: &str) -> Option<BaselineForecast> {
    let last_index = rows.len().checked_sub(1)?;
    let last = &rows[last_index];

    let decision = decision_at(rows, last_index);
    let support = window_labels(rows, last_index)
        .filter(|label| *label == Some(decision))
        .count();

    let raw = f64::from(BASE_CONFIDENCE) + f64::from(CONFIDENCE_STEP) * support as f64;
    let confidence = if raw.is_finite() {
        raw.round().clamp(0.0, 100.0) as u8
    } else {
        FALLBACK_CONFIDENCE
    };

    Some(BaselineForecast {
        asset: asset.to_string(),
        timeframe: DAILY.to_string(),
        horizon: DAILY.to_string(),
        decision,
        confidence,
        as_of: last.timestamp,
        reason: describe_decision(asset, decision, last),
    })
}

fn describe_decision(asset: &str, decision: Direction, last: &EngineeredFeatureRow) -> String {
    let mut parts = vec![format!("Simple baseline model on daily {} candles.", asset)];

    match (last.sma_5, last.sma_20) {
        (Some(short), Some(long)) if short > long => {
            parts.push("SMA(5) is above SMA(20), suggesting a short-term uptrend.".to_string())
        }
        (Some(short), Some(long)) if short < long => {
            parts.push("SMA(5) is below SMA(20), suggesting a short-term downtrend.".to_string())
        }
        (Some(_), Some(_)) => {
            parts.push("SMA(5) is level with SMA(20), no clear trend.".to_string())
        }
        _ => parts.push("Insufficient history for an SMA(5)/SMA(20) comparison.".to_string()),
    }

    parts.push(
        match decision {
            Direction::Up => "Most recent moves were upward.",
            Direction::Down => "Most recent moves were downward.",
            Direction::Flat => "No clear edge for buyers or sellers; the decision is neutral.",
        }
        .to_string(),
    );

    parts.join(" ")
}
