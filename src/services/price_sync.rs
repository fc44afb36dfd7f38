//! Daily price-history sync from Alpha Vantage into the store.

use crate::services::{DataSource, ForecastService, PriceHistoryRepository};
use crate::sources::AlphaVantageClient;
use crate::types::PriceBar;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of one sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub asset: String,
    pub inserted: usize,
}

/// Pulls daily bars upstream and writes them to the data source.
pub struct PriceSyncService {
    client: Option<AlphaVantageClient>,
    source: Option<Arc<dyn DataSource>>,
    forecasts: Arc<ForecastService>,
}

impl PriceSyncService {
    pub fn new(
        client: Option<AlphaVantageClient>,
        source: Option<Arc<dyn DataSource>>,
        forecasts: Arc<ForecastService>,
    ) -> Arc<Self> {
        Arc::new(Self {
            client,
            source,
            forecasts,
        })
    }

    /// Fetch and store the daily series for an asset.
    ///
    /// Missing configuration and upstream failures are logged and reported
    /// as zero inserted bars.
    pub async fn sync_daily(&self, asset: &str) -> SyncReport {
        let Some(client) = self.client.as_ref() else {
            warn!("Alpha Vantage API key not configured; skipping sync for {}", asset);
            return SyncReport::none(asset);
        };
        if self.source.is_none() {
            warn!("No data source configured; skipping sync for {}", asset);
            return SyncReport::none(asset);
        }

        match client.get_daily_series(asset).await {
            Ok(bars) => self.store_bars(asset, &bars),
            Err(e) => {
                error!("Failed to fetch daily series for {}: {}", asset, e);
                SyncReport::none(asset)
            }
        }
    }

    /// Upsert bars for an asset and drop its cached forecast.
    pub fn store_bars(&self, asset: &str, bars: &[PriceBar]) -> SyncReport {
        let Some(source) = self.source.as_ref() else {
            return SyncReport::none(asset);
        };
        if bars.is_empty() {
            warn!("No daily bars to store for {}", asset);
            return SyncReport::none(asset);
        }

        let bars: Vec<PriceBar> = bars
            .iter()
            .cloned()
            .map(|mut bar| {
                bar.asset = asset.to_string();
                bar
            })
            .collect();

        match source.upsert_price_bars(&bars) {
            Ok(inserted) => {
                self.forecasts.invalidate(asset);
                info!("Synced {} daily bars for {}", inserted, asset);
                SyncReport {
                    asset: asset.to_string(),
                    inserted,
                }
            }
            Err(e) => {
                error!("Failed to upsert price history for {}: {}", asset, e);
                SyncReport::none(asset)
            }
        }
    }
}

impl SyncReport {
    fn none(asset: &str) -> Self {
        Self {
            asset: asset.to_string(),
            inserted: 0,
        }
    }
}
