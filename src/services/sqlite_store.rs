//! SQLite persistence for price history and forecast audit records.
//!
//! Tables:
//! - `price_history`: daily OHLC bars, unique per (asset, timeframe, ts)
//! - `model_runs`: one row per baseline model run
//! - `price_forecasts`: emitted forecasts with their validity window
//!
//! Timestamps are stored as Unix milliseconds.

use crate::error::StoreError;
use crate::services::repository::{ForecastRepository, PriceHistoryRepository};
use crate::types::{Direction, ModelRun, PriceBar, StoredForecast};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// SQLite store for price history and forecasts.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Create a new SQLite store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("SQLite store initialized");
        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing).
    pub fn new_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        debug!("In-memory SQLite store initialized");
        Ok(store)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Initialize database schema.
    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn();

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS price_history (
                asset TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                ts INTEGER NOT NULL,
                open REAL NOT NULL,
                high REAL NOT NULL,
                low REAL NOT NULL,
                close REAL NOT NULL,
                volume REAL,
                source TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (asset, timeframe, ts)
            );

            CREATE TABLE IF NOT EXISTS model_runs (
                id TEXT PRIMARY KEY,
                model_type TEXT NOT NULL,
                model_version TEXT NOT NULL,
                asset TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                train_start INTEGER NOT NULL,
                train_end INTEGER NOT NULL,
                val_metric_name TEXT NOT NULL,
                val_metric_value REAL NOT NULL,
                params_json TEXT NOT NULL DEFAULT '{}',
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS price_forecasts (
                id TEXT PRIMARY KEY,
                asset TEXT NOT NULL,
                timeframe TEXT NOT NULL,
                forecast_horizon TEXT NOT NULL,
                target_type TEXT NOT NULL,
                prediction_value REAL NOT NULL,
                prediction_direction TEXT NOT NULL,
                model_type TEXT NOT NULL,
                model_version TEXT NOT NULL,
                valid_from INTEGER NOT NULL,
                valid_to INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_forecasts_asset_valid_from
                ON price_forecasts(asset, timeframe, valid_from DESC);",
        )?;

        debug!("SQLite schema initialized");
        Ok(())
    }

    /// Number of stored bars for an asset and timeframe.
    pub fn bar_count(&self, asset: &str, timeframe: &str) -> Result<usize, StoreError> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM price_history WHERE asset = ?1 AND timeframe = ?2",
            params![asset, timeframe],
            |row| row.get(0),
        )?;
        Ok(count.max(0) as usize)
    }

    /// Fetch a model run by id.
    pub fn get_model_run(&self, id: &str) -> Result<Option<ModelRun>, StoreError> {
        let conn = self.conn();
        let result = conn.query_row(
            "SELECT id, model_type, model_version, asset, timeframe, train_start, train_end,
                    val_metric_name, val_metric_value, params_json, created_at
             FROM model_runs WHERE id = ?1",
            params![id],
            model_run_from_row,
        );

        match result {
            Ok(run) => Ok(Some(run)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl PriceHistoryRepository for SqliteStore {
    fn get_price_history(
        &self,
        asset: &str,
        timeframe: &str,
        limit: Option<usize>,
    ) -> Result<Vec<PriceBar>, StoreError> {
        let conn = self.conn();

        let mut bars = match limit {
            Some(limit) => {
                let mut stmt = conn.prepare(
                    "SELECT asset, timeframe, ts, open, high, low, close, volume, source
                     FROM price_history
                     WHERE asset = ?1 AND timeframe = ?2
                     ORDER BY ts DESC
                     LIMIT ?3",
                )?;
                let limit = i64::try_from(limit).unwrap_or(i64::MAX);
                let rows = stmt.query_map(params![asset, timeframe, limit], price_bar_from_row)?;
                let mut bars = rows.collect::<Result<Vec<_>, _>>()?;
                bars.reverse();
                bars
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT asset, timeframe, ts, open, high, low, close, volume, source
                     FROM price_history
                     WHERE asset = ?1 AND timeframe = ?2
                     ORDER BY ts ASC",
                )?;
                let rows = stmt.query_map(params![asset, timeframe], price_bar_from_row)?;
                let bars = rows.collect::<Result<Vec<_>, _>>()?;
                bars
            }
        };

        bars.sort_by_key(|bar| bar.timestamp);
        debug!("Loaded {} bars for {} {}", bars.len(), asset, timeframe);
        Ok(bars)
    }

    fn upsert_price_bars(&self, bars: &[PriceBar]) -> Result<usize, StoreError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp_millis();
        let mut written = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO price_history
                 (asset, timeframe, ts, open, high, low, close, volume, source, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(asset, timeframe, ts) DO UPDATE SET
                    open = excluded.open,
                    high = excluded.high,
                    low = excluded.low,
                    close = excluded.close,
                    volume = excluded.volume,
                    source = excluded.source",
            )?;

            for bar in bars {
                written += stmt.execute(params![
                    bar.asset,
                    bar.timeframe,
                    bar.timestamp.timestamp_millis(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.volume,
                    bar.source,
                    now,
                ])?;
            }
        }

        tx.commit()?;
        debug!("Upserted {} price bars", written);
        Ok(written)
    }
}

impl ForecastRepository for SqliteStore {
    fn insert_model_run(&self, run: &ModelRun) -> Result<(), StoreError> {
        let params_json = serde_json::to_string(&run.params)?;
        let conn = self.conn();

        conn.execute(
            "INSERT INTO model_runs
             (id, model_type, model_version, asset, timeframe, train_start, train_end,
              val_metric_name, val_metric_value, params_json, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                run.id,
                run.model_type,
                run.model_version,
                run.asset,
                run.timeframe,
                run.train_start.timestamp_millis(),
                run.train_end.timestamp_millis(),
                run.val_metric_name,
                run.val_metric_value,
                params_json,
                run.created_at.timestamp_millis(),
            ],
        )?;

        debug!("Inserted model run {} for {}", run.id, run.asset);
        Ok(())
    }

    fn insert_forecast(&self, forecast: &StoredForecast) -> Result<(), StoreError> {
        let conn = self.conn();

        conn.execute(
            "INSERT INTO price_forecasts
             (id, asset, timeframe, forecast_horizon, target_type, prediction_value,
              prediction_direction, model_type, model_version, valid_from, valid_to, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                forecast.id,
                forecast.asset,
                forecast.timeframe,
                forecast.forecast_horizon,
                forecast.target_type,
                forecast.prediction_value,
                forecast.prediction_direction.as_str(),
                forecast.model_type,
                forecast.model_version,
                forecast.valid_from.timestamp_millis(),
                forecast.valid_to.timestamp_millis(),
                forecast.created_at.timestamp_millis(),
            ],
        )?;

        debug!("Inserted forecast {} for {}", forecast.id, forecast.asset);
        Ok(())
    }

    fn recent_forecasts(
        &self,
        asset: &str,
        timeframe: &str,
        limit: usize,
    ) -> Result<Vec<StoredForecast>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, asset, timeframe, forecast_horizon, target_type, prediction_value,
                    prediction_direction, model_type, model_version, valid_from, valid_to, created_at
             FROM price_forecasts
             WHERE asset = ?1 AND timeframe = ?2
             ORDER BY valid_from DESC, created_at DESC
             LIMIT ?3",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![asset, timeframe, limit], stored_forecast_from_row)?;
        let items = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

fn millis_to_utc(idx: usize, millis: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, millis))
}

fn utc_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    millis_to_utc(idx, row.get(idx)?)
}

fn price_bar_from_row(row: &Row<'_>) -> rusqlite::Result<PriceBar> {
    Ok(PriceBar {
        asset: row.get(0)?,
        timeframe: row.get(1)?,
        timestamp: utc_column(row, 2)?,
        open: row.get(3)?,
        high: row.get(4)?,
        low: row.get(5)?,
        close: row.get(6)?,
        volume: row.get(7)?,
        source: row.get(8)?,
    })
}

fn model_run_from_row(row: &Row<'_>) -> rusqlite::Result<ModelRun> {
    let params_json: String = row.get(9)?;
    let params = serde_json::from_str(&params_json)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

    Ok(ModelRun {
        id: row.get(0)?,
        model_type: row.get(1)?,
        model_version: row.get(2)?,
        asset: row.get(3)?,
        timeframe: row.get(4)?,
        train_start: utc_column(row, 5)?,
        train_end: utc_column(row, 6)?,
        val_metric_name: row.get(7)?,
        val_metric_value: row.get(8)?,
        params,
        created_at: utc_column(row, 10)?,
    })
}

fn stored_forecast_from_row(row: &Row<'_>) -> rusqlite::Result<StoredForecast> {
    let direction: String = row.get(6)?;
    let prediction_direction = Direction::from_str(&direction).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            Type::Text,
            Box::new(StoreError::InvalidData(format!("unknown direction '{}'", direction))),
        )
    })?;

    Ok(StoredForecast {
        id: row.get(0)?,
        asset: row.get(1)?,
        timeframe: row.get(2)?,
        forecast_horizon: row.get(3)?,
        target_type: row.get(4)?,
        prediction_value: row.get(5)?,
        prediction_direction,
        model_type: row.get(7)?,
        model_version: row.get(8)?,
        valid_from: utc_column(row, 9)?,
        valid_to: utc_column(row, 10)?,
        created_at: utc_column(row, 11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BASELINE_MODEL_TYPE, BASELINE_MODEL_VERSION, DAILY};
    use chrono::{Duration, TimeZone};

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn forecast_record(valid_from: DateTime<Utc>, direction: Direction) -> StoredForecast {
        StoredForecast {
            id: uuid::Uuid::new_v4().to_string(),
            asset: "XAUUSD".to_string(),
            timeframe: DAILY.to_string(),
            forecast_horizon: DAILY.to_string(),
            target_type: "direction".to_string(),
            prediction_value: 0.64,
            prediction_direction: direction,
            model_type: BASELINE_MODEL_TYPE.to_string(),
            model_version: BASELINE_MODEL_VERSION.to_string(),
            valid_from,
            valid_to: valid_from + Duration::days(1),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_and_read_history() {
        let store = SqliteStore::new_in_memory().unwrap();
        let bars: Vec<PriceBar> = (0..5)
            .rev()
            .map(|i| PriceBar::daily_close("XAUUSD", day(i), 100.0 + i as f64))
            .collect();

        assert_eq!(store.upsert_price_bars(&bars).unwrap(), 5);
        assert_eq!(store.bar_count("XAUUSD", DAILY).unwrap(), 5);

        let history = store.get_price_history("XAUUSD", DAILY, None).unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].timestamp, day(0));
        assert_eq!(history[4].close, 104.0);
    }

    #[test]
    fn test_upsert_replaces_existing_bar() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .upsert_price_bars(&[PriceBar::daily_close("XAUUSD", day(0), 100.0)])
            .unwrap();
        store
            .upsert_price_bars(&[PriceBar::daily_close("XAUUSD", day(0), 101.5)])
            .unwrap();

        let history = store.get_price_history("XAUUSD", DAILY, None).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].close, 101.5);
    }

    #[test]
    fn test_limit_returns_most_recent_bars_ascending() {
        let store = SqliteStore::new_in_memory().unwrap();
        let bars: Vec<PriceBar> = (0..10)
            .map(|i| PriceBar::daily_close("XAUUSD", day(i), 100.0 + i as f64))
            .collect();
        store.upsert_price_bars(&bars).unwrap();

        let history = store.get_price_history("XAUUSD", DAILY, Some(3)).unwrap();
        let closes: Vec<f64> = history.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![107.0, 108.0, 109.0]);
    }

    #[test]
    fn test_history_is_scoped_by_asset() {
        let store = SqliteStore::new_in_memory().unwrap();
        store
            .upsert_price_bars(&[
                PriceBar::daily_close("XAUUSD", day(0), 100.0),
                PriceBar::daily_close("EURUSD", day(0), 1.1),
            ])
            .unwrap();

        assert_eq!(store.get_price_history("EURUSD", DAILY, None).unwrap().len(), 1);
        assert!(store.get_price_history("BTCUSD", DAILY, None).unwrap().is_empty());
    }

    #[test]
    fn test_volume_round_trip() {
        let store = SqliteStore::new_in_memory().unwrap();
        let mut bar = PriceBar::daily_close("XAUUSD", day(0), 100.0);
        bar.volume = Some(1234.0);
        bar.source = "alphavantage".to_string();
        store.upsert_price_bars(&[bar.clone()]).unwrap();

        let history = store.get_price_history("XAUUSD", DAILY, None).unwrap();
        assert_eq!(history[0], bar);
    }

    #[test]
    fn test_model_run_round_trip() {
        let store = SqliteStore::new_in_memory().unwrap();
        let run = ModelRun {
            id: "run-1".to_string(),
            model_type: BASELINE_MODEL_TYPE.to_string(),
            model_version: BASELINE_MODEL_VERSION.to_string(),
            asset: "XAUUSD".to_string(),
            timeframe: DAILY.to_string(),
            train_start: day(0),
            train_end: day(199),
            val_metric_name: "n/a".to_string(),
            val_metric_value: 0.0,
            params: serde_json::json!({ "horizon": "1d" }),
            created_at: day(200),
        };
        store.insert_model_run(&run).unwrap();

        assert_eq!(store.get_model_run("run-1").unwrap(), Some(run));
        assert_eq!(store.get_model_run("missing").unwrap(), None);
    }

    #[test]
    fn test_recent_forecasts_newest_first() {
        let store = SqliteStore::new_in_memory().unwrap();
        store.insert_forecast(&forecast_record(day(1), Direction::Up)).unwrap();
        store.insert_forecast(&forecast_record(day(3), Direction::Down)).unwrap();
        store.insert_forecast(&forecast_record(day(2), Direction::Flat)).unwrap();

        let items = store.recent_forecasts("XAUUSD", DAILY, 2).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].valid_from, day(3));
        assert_eq!(items[0].prediction_direction, Direction::Down);
        assert_eq!(items[1].valid_from, day(2));
    }
}
