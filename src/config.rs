use std::env;
use std::time::Duration;

/// Default Alpha Vantage endpoint.
pub const DEFAULT_ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// Settings for the forecasting collaborators.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    /// Asset used when a request does not name one.
    pub default_asset: String,
    /// Number of most recent bars fed to the current forecast.
    pub history_limit: usize,
    /// How long a computed forecast is served from cache.
    pub cache_ttl: Duration,
    /// Backtest window used when none (or an invalid one) is requested.
    pub default_window_days: u32,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_asset: "XAUUSD".to_string(),
            history_limit: 200,
            cache_ttl: Duration::from_secs(300),
            default_window_days: 90,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// SQLite database path. `None` means no price-history source is configured.
    pub database_path: Option<String>,
    /// Shared secret expected in the `X-Cron-Secret` header of admin routes.
    pub cron_secret: Option<String>,
    /// Alpha Vantage API key for daily price history.
    pub alpha_vantage_api_key: Option<String>,
    /// Alpha Vantage base URL.
    pub alpha_vantage_base_url: String,
    /// Interval of the background price sync (`None` disables it).
    pub price_sync_interval: Option<Duration>,
    /// Forecasting settings.
    pub forecast: ForecastConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = ForecastConfig::default();

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3001),
            database_path: non_blank(env::var("DATABASE_PATH").ok()),
            cron_secret: non_blank(env::var("CRON_SECRET").ok()),
            alpha_vantage_api_key: non_blank(env::var("ALPHA_VANTAGE_API_KEY").ok()),
            alpha_vantage_base_url: non_blank(env::var("ALPHA_VANTAGE_BASE_URL").ok())
                .unwrap_or_else(|| DEFAULT_ALPHA_VANTAGE_URL.to_string()),
            price_sync_interval: env::var("PRICE_SYNC_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            forecast: ForecastConfig {
                default_asset: non_blank(env::var("FORECAST_DEFAULT_ASSET").ok())
                    .map(|a| a.to_uppercase())
                    .unwrap_or(defaults.default_asset),
                history_limit: env::var("FORECAST_HISTORY_LIMIT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|limit| *limit > 0)
                    .unwrap_or(defaults.history_limit),
                cache_ttl: env::var("FORECAST_CACHE_TTL_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.cache_ttl),
                default_window_days: env::var("FORECAST_BACKTEST_WINDOW_DAYS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .filter(|days| *days > 0)
                    .unwrap_or(defaults.default_window_days),
            },
        }
    }

    /// Whether a price-history data source is configured.
    pub fn has_data_source(&self) -> bool {
        self.database_path.is_some()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            database_path: None,
            cron_secret: None,
            alpha_vantage_api_key: None,
            alpha_vantage_base_url: DEFAULT_ALPHA_VANTAGE_URL.to_string(),
            price_sync_interval: None,
            forecast: ForecastConfig::default(),
        }
    }
}

/// Trim a value and drop it when empty.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
