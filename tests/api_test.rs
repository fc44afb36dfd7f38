//! HTTP tests driving the router in-process

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use bellwether::config::Config;
use bellwether::services::{DataSource, ForecastService, PriceHistoryRepository, PriceSyncService, SqliteStore};
use bellwether::types::PriceBar;
use bellwether::AppState;
use chrono::{Duration, Utc};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "test-secret";

fn app_with(store: Option<Arc<SqliteStore>>) -> Router {
    let config = Config {
        cron_secret: Some(SECRET.to_string()),
        ..Config::default()
    };
    let source = store.map(|s| s as Arc<dyn DataSource>);
    let forecast_service = ForecastService::new(source.clone(), config.forecast.clone());
    let price_sync = PriceSyncService::new(None, source, forecast_service.clone());

    bellwether::app(AppState {
        config: Arc::new(config),
        forecast_service,
        price_sync,
    })
}

fn seeded_store(len: usize) -> Arc<SqliteStore> {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let today = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    let first = today - Duration::days(len as i64 - 1);
    let bars: Vec<PriceBar> = (0..len)
        .map(|i| PriceBar::daily_close("XAUUSD", first + Duration::days(i as i64), 2000.0 * 1.01f64.powi(i as i32)))
        .collect();
    store.upsert_price_bars(&bars).unwrap();
    store
}

async fn send(app: Router, method: Method, uri: &str, secret: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(secret) = secret {
        request = request.header("x-cron-secret", secret);
    }

    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn admin(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
    send(app, method, uri, Some(SECRET)).await
}

// ============================================================================
// Public endpoints
// ============================================================================

#[tokio::test]
async fn test_health_reports_data_source() {
    let (status, body) = get(app_with(None), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["dataSource"], false);

    let (_, body) = get(app_with(Some(seeded_store(5))), "/api/health").await;
    assert_eq!(body["dataSource"], true);
}

#[tokio::test]
async fn test_forecast_unconfigured_is_neutral() {
    let (status, body) = get(app_with(None), "/api/forecast/XAUUSD").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["decision"], "FLAT");
    assert_eq!(body["data"]["confidence"], 0);
}

#[tokio::test]
async fn test_forecast_configured_empty_is_unavailable() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let (status, body) = get(app_with(Some(store)), "/api/forecast/XAUUSD").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "No forecast available");
    assert_eq!(body["status"], 503);
}

#[tokio::test]
async fn test_forecast_normalizes_asset() {
    let (status, body) = get(app_with(Some(seeded_store(50))), "/api/forecast/xauusd").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["asset"], "XAUUSD");
    assert_eq!(body["data"]["decision"], "UP");
    assert_eq!(body["data"]["confidence"], 100);
    assert_eq!(body["data"]["timeframe"], "1d");
}

#[tokio::test]
async fn test_public_history_unconfigured_is_empty() {
    let (status, body) = get(app_with(None), "/api/forecast/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["asset"], "XAUUSD");
    assert_eq!(body["timeframe"], "1d");
    assert_eq!(body["count"], 0);
}

// ============================================================================
// Admin endpoints
// ============================================================================

#[tokio::test]
async fn test_admin_requires_cron_secret() {
    let app = app_with(Some(seeded_store(30)));

    let (status, body) = get(app.clone(), "/api/admin/forecast/features-preview").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let (status, _) = send(
        app.clone(),
        Method::POST,
        "/api/admin/forecast/run-baseline",
        Some("wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        app,
        Method::POST,
        "/api/admin/sync-price-history",
        Some(&format!("  {}  ", SECRET)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_features_preview_clamps_limit() {
    let app = app_with(Some(seeded_store(30)));
    let query = serde_urlencoded::to_string([("asset", "xauusd"), ("limit", "3")]).unwrap();

    let (status, body) = admin(
        app,
        Method::GET,
        &format!("/api/admin/forecast/features-preview?{}", query),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["asset"], "XAUUSD");
    assert_eq!(body["count"], 10);
    assert_eq!(body["items"].as_array().unwrap().len(), 10);
    assert!(body["items"][0]["sma5"].is_null());
    assert!(body["items"][9]["sma5"].is_number());
}

#[tokio::test]
async fn test_baseline_metrics_defaults_invalid_window() {
    let app = app_with(Some(seeded_store(50)));

    let (status, body) = admin(
        app.clone(),
        Method::GET,
        "/api/admin/forecast/baseline-metrics?windowDays=-3",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["windowDays"], 90);
    assert_eq!(body["totalSamples"], 49);
    assert_eq!(body["correct"], 48);
    assert_eq!(body["accuracy"], 98);

    let (_, body) = admin(
        app,
        Method::GET,
        "/api/admin/forecast/baseline-metrics?windowDays=5",
    )
    .await;
    // Four of the last five days are scored; today's bar has no next bar yet.
    assert_eq!(body["windowDays"], 5);
    assert_eq!(body["totalSamples"], 4);
    assert_eq!(body["accuracy"], 100);
}

#[tokio::test]
async fn test_run_baseline_and_history() {
    let app = app_with(Some(seeded_store(50)));

    let (status, body) = admin(app.clone(), Method::POST, "/api/admin/forecast/run-baseline").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["forecast"]["decision"], "UP");
    assert!(body["data"]["modelRunId"].is_string());
    assert!(body["data"]["forecastId"].is_string());

    let (status, body) = admin(app.clone(), Method::GET, "/api/admin/forecast/history").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["items"][0]["predictionDirection"], "UP");
    assert_eq!(body["items"][0]["predictionValue"], 1.0);

    let (status, body) = get(app, "/api/forecast/history?limit=500").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_run_baseline_without_history_is_unavailable() {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let (status, body) = admin(
        app_with(Some(store)),
        Method::POST,
        "/api/admin/forecast/run-baseline",
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "No forecast available");
}

#[tokio::test]
async fn test_sync_without_api_key_inserts_nothing() {
    let (status, body) = admin(
        app_with(Some(seeded_store(5))),
        Method::POST,
        "/api/admin/sync-price-history?asset=spy",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["asset"], "SPY");
    assert_eq!(body["inserted"], 0);
}
