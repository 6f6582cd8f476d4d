//! SQLite weekly price store.
//!
//! Open, high and low are nullable; close is required, matching the
//! shape of the weekly CSV exports imported into it.

use crate::domain::error::ProfitHighError;
use crate::domain::price_bar::PriceBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::price_history_port::PriceHistoryPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqlitePriceAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> ProfitHighError {
    ProfitHighError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn pool_err(e: r2d2::Error) -> ProfitHighError {
    ProfitHighError::Database {
        reason: e.to_string(),
    }
}

impl SqlitePriceAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ProfitHighError> {
        let db_path =
            config
                .get_non_empty("sqlite", "path")
                .ok_or_else(|| ProfitHighError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ProfitHighError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_err)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ProfitHighError> {
        self.pool.get().map_err(pool_err)
    }

    pub fn initialize_schema(&self) -> Result<(), ProfitHighError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS weekly_bars (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL,
                    high REAL,
                    low REAL,
                    close REAL NOT NULL,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_weekly_bars_date ON weekly_bars(date);",
            )
            .map_err(query_err)
    }

    /// Upserts bars in one transaction; returns the number written.
    pub fn insert_bars(&self, bars: &[PriceBar]) -> Result<usize, ProfitHighError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO weekly_bars (symbol, date, open, high, low, close)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    bar.symbol,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        debug!(rows = bars.len(), "weekly bars stored");
        Ok(bars.len())
    }

    /// First date, last date and bar count stored for `symbol`.
    pub fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ProfitHighError> {
        let conn = self.conn()?;
        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(
                "SELECT MIN(date), MAX(date), COUNT(*) FROM weekly_bars WHERE symbol = ?1",
                params![symbol],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => {
                let parse = |s: &str| {
                    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| {
                        ProfitHighError::MalformedDate {
                            value: s.to_string(),
                        }
                    })
                };
                Ok(Some((parse(&min_str)?, parse(&max_str)?, count as usize)))
            }
            _ => Ok(None),
        }
    }
}

impl PriceHistoryPort for SqlitePriceAdapter {
    fn fetch_weekly(
        &self,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProfitHighError> {
        let conn = self.conn()?;
        let start_str = start_date.format(DATE_FORMAT).to_string();

        let mut stmt = conn
            .prepare(
                "SELECT symbol, date, open, high, low, close
                 FROM weekly_bars
                 WHERE symbol = ?1 AND date >= ?2
                 ORDER BY date ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![symbol, start_str], |row| {
                let date_str: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        1,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                Ok(PriceBar {
                    symbol: row.get(0)?,
                    date,
                    open: row.get(2)?,
                    high: row.get(3)?,
                    low: row.get(4)?,
                    close: row.get(5)?,
                })
            })
            .map_err(query_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ProfitHighError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM weekly_bars ORDER BY symbol")
            .map_err(query_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(query_err)
    }
}
