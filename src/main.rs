use bellwether::config::Config;
use bellwether::services::{DataSource, ForecastService, PriceSyncService, SqliteStore};
use bellwether::sources::AlphaVantageClient;
use bellwether::AppState;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bellwether=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env());
    info!("Starting Bellwether server on {}:{}", config.host, config.port);

    // Open the price-history store (optional)
    let source: Option<Arc<dyn DataSource>> = match config.database_path.as_deref() {
        Some(path) => {
            info!("Using SQLite store at {}", path);
            let store: Arc<dyn DataSource> = Arc::new(SqliteStore::new(path)?);
            Some(store)
        }
        None => {
            warn!("DATABASE_PATH not set; forecasts will be neutral until a data source is configured");
            None
        }
    };

    // Create Alpha Vantage client for daily history (optional)
    let alphavantage_client = config.alpha_vantage_api_key.as_ref().map(|api_key| {
        info!("Alpha Vantage API key found, enabling price history sync");
        AlphaVantageClient::new(api_key.clone(), config.alpha_vantage_base_url.clone())
    });
    if alphavantage_client.is_none() {
        warn!("ALPHA_VANTAGE_API_KEY not set; price history sync is disabled");
    }

    let forecast_service = ForecastService::new(source.clone(), config.forecast.clone());
    let price_sync = PriceSyncService::new(alphavantage_client, source, forecast_service.clone());

    // Start periodic price sync
    if let Some(interval) = config.price_sync_interval {
        let price_sync = price_sync.clone();
        let asset = config.forecast.default_asset.clone();
        info!("Syncing {} price history every {:?}", asset, interval);
        tokio::spawn(async move {
            loop {
                let report = price_sync.sync_daily(&asset).await;
                info!("Background sync for {} stored {} bars", report.asset, report.inserted);
                tokio::time::sleep(interval).await;
            }
        });
    }

    let state = AppState {
        config: config.clone(),
        forecast_service,
        price_sync,
    };

    // Build CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = bellwether::app(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    // Start the server
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Bellwether server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
