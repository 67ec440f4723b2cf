//! SQLite data adapter.

use crate::domain::error::ShinneError;
use crate::domain::ohlcv::DailyBar;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> ShinneError {
    ShinneError::DataSource {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> ShinneError {
    ShinneError::DataQuery {
        reason: e.to_string(),
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, ShinneError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| ShinneError::DataSource {
        reason: format!("invalid stored date '{}': {}", s, e),
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ShinneError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| ShinneError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(db_path.trim());
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, ShinneError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, ShinneError> {
        self.pool.get().map_err(pool_error)
    }

    pub fn initialize_schema(&self) -> Result<(), ShinneError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS daily_bars (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_daily_bars_date ON daily_bars(date);",
            )
            .map_err(query_error)
    }

    /// Upserts `bars` for `symbol` in one transaction; returns the row count.
    pub fn insert_bars(&self, symbol: &str, bars: &[DailyBar]) -> Result<usize, ShinneError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_error)?;

        for bar in bars {
            tx.execute(
                "INSERT OR REPLACE INTO daily_bars (symbol, date, open, high, low, close)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    symbol,
                    bar.date.format(DATE_FORMAT).to_string(),
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close
                ],
            )
            .map_err(query_error)?;
        }

        tx.commit().map_err(query_error)?;
        Ok(bars.len())
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, ShinneError> {
        let conn = self.conn()?;

        // ISO dates compare correctly as text.
        let start_str = start.map(|d| d.format(DATE_FORMAT).to_string());
        let end_str = end.map(|d| d.format(DATE_FORMAT).to_string());

        let query = "SELECT date, open, high, low, close
                     FROM daily_bars
                     WHERE symbol = ?1
                       AND (?2 IS NULL OR date >= ?2)
                       AND (?3 IS NULL OR date <= ?3)
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(query_error)?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })
            .map_err(query_error)?;

        let mut bars = Vec::new();
        for row in rows {
            let (date_str, open, high, low, close) = row.map_err(query_error)?;
            bars.push(DailyBar {
                date: parse_date(&date_str)?,
                open,
                high,
                low,
                close,
            });
        }

        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ShinneError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM daily_bars ORDER BY symbol")
            .map_err(query_error)?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_error)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_error)?);
        }

        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ShinneError> {
        let conn = self.conn()?;

        let query = "SELECT MIN(date), MAX(date), COUNT(*) FROM daily_bars WHERE symbol = ?1";

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(query, params![symbol], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(query_error)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => Ok(Some((
                parse_date(&min_str)?,
                parse_date(&max_str)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
