pub mod admin;
pub mod forecast;
pub mod health;

use crate::AppState;
use axum::Router;
use serde::Serialize;

/// API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/forecast", forecast::router())
        .nest("/api/admin", admin::router())
}

/// Trim and upper-case an asset, falling back to the default when blank.
pub(crate) fn normalize_asset(raw: Option<&str>, default_asset: &str) -> String {
    raw.map(str::trim)
        .filter(|a| !a.is_empty())
        .unwrap_or(default_asset)
        .to_uppercase()
}

/// Parse a `limit` query value and clamp it into `[min, max]`.
///
/// Missing, non-numeric or non-positive values use `default`.
pub(crate) fn clamp_limit(raw: Option<&str>, default: usize, min: usize, max: usize) -> usize {
    match raw.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(n) if n <= 0 => default,
        Some(n) if n < min as i64 => min,
        Some(n) if n > max as i64 => max,
        Some(n) => n as usize,
        None => default,
    }
}
