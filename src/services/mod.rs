pub mod cache;
pub mod forecast_service;
pub mod price_sync;
pub mod repository;
pub mod sqlite_store;

pub use cache::Cache;
pub use forecast_service::{BaselineRun, ForecastLookup, ForecastService};
pub use price_sync::{PriceSyncService, SyncReport};
pub use repository::{DataSource, ForecastRepository, PriceHistoryRepository};
pub use sqlite_store::SqliteStore;
