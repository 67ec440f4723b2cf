//! CSV file data adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a header row. Columns are
//! matched by name, ignoring case and surrounding whitespace, so exports with
//! `Date,Open,High,Low,Close,Adj Close,Volume` headers load unchanged.

use crate::domain::error::ShinneError;
use crate::domain::ohlcv::DailyBar;
use crate::ports::data_port::{in_range, DataPort};
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const REQUIRED_COLUMNS: [&str; 5] = ["date", "open", "high", "low", "close"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// `<base>/<symbol>.csv`, falling back to a file whose stem matches
    /// `symbol` ignoring ASCII case.
    fn csv_path(&self, symbol: &str) -> PathBuf {
        let exact = self.base_path.join(format!("{}.csv", symbol));
        if exact.exists() {
            return exact;
        }
        fs::read_dir(&self.base_path)
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .find(|path| {
                path.extension().is_some_and(|ext| ext == "csv")
                    && path
                        .file_stem()
                        .is_some_and(|stem| stem.to_string_lossy().eq_ignore_ascii_case(symbol))
            })
            .unwrap_or(exact)
    }
}

/// Column positions of the required fields, in `REQUIRED_COLUMNS` order.
fn locate_columns(headers: &csv::StringRecord) -> Result<[usize; 5], ShinneError> {
    let mut positions = [0usize; 5];
    for (slot, name) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| ShinneError::DataSource {
                reason: format!("missing {} column", name),
            })?;
    }
    Ok(positions)
}

fn parse_price(record: &csv::StringRecord, pos: usize, name: &str) -> Result<f64, ShinneError> {
    record
        .get(pos)
        .ok_or_else(|| ShinneError::DataSource {
            reason: format!("missing {} value", name),
        })?
        .trim()
        .parse()
        .map_err(|e| ShinneError::DataSource {
            reason: format!("invalid {} value: {}", name, e),
        })
}

/// Reads every bar in `path` within the inclusive date bounds, in file order.
pub fn read_bars(
    path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<DailyBar>, ShinneError> {
    let content = fs::read_to_string(path).map_err(|e| ShinneError::DataSource {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr.headers().map_err(|e| ShinneError::DataSource {
        reason: format!("CSV header error in {}: {}", path.display(), e),
    })?;
    let [date_col, open_col, high_col, low_col, close_col] = locate_columns(headers)?;

    let mut bars = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| ShinneError::DataSource {
            reason: format!("CSV parse error: {}", e),
        })?;

        let date_str = record.get(date_col).ok_or_else(|| ShinneError::DataSource {
            reason: "missing date value".into(),
        })?;
        // Exports with timestamps keep only the date part.
        let date_part = date_str.trim().get(..10).unwrap_or(date_str.trim());
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
            ShinneError::DataSource {
                reason: format!("invalid date format '{}': {}", date_str, e),
            }
        })?;

        if !in_range(date, start, end) {
            continue;
        }

        bars.push(DailyBar {
            date,
            open: parse_price(&record, open_col, "open")?,
            high: parse_price(&record, high_col, "high")?,
            low: parse_price(&record, low_col, "low")?,
            close: parse_price(&record, close_col, "close")?,
        });
    }

    Ok(bars)
}

impl DataPort for CsvAdapter {
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, ShinneError> {
        read_bars(&self.csv_path(symbol), start, end)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ShinneError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ShinneError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| ShinneError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "csv") {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().into_owned());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ShinneError> {
        let path = self.csv_path(symbol);
        if !path.exists() {
            return Ok(None);
        }
        let bars = read_bars(&path, None, None)?;
        let min = bars.iter().map(|b| b.date).min();
        let max = bars.iter().map(|b| b.date).max();
        Ok(min.zip(max).map(|(min, max)| (min, max, bars.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        let csv_content = "date,open,high,low,close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,55000\n";

        fs::write(path.join("SPY.csv"), csv_content).unwrap();
        fs::write(path.join("QQQ.csv"), "date,open,high,low,close\n").unwrap();
        fs::write(path.join("notes.txt"), "not data").unwrap();

        (dir, path)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn fetch_daily_bars_returns_correct_data() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_daily_bars("SPY", Some(date(2024, 1, 15)), Some(date(2024, 1, 17)))
            .unwrap();

        assert_eq!(bars.len(), 3);
        assert_eq!(
            bars[0],
            DailyBar::new(date(2024, 1, 15), 100.0, 110.0, 90.0, 105.0)
        );
    }

    #[test]
    fn fetch_daily_bars_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let bars = adapter
            .fetch_daily_bars("SPY", Some(date(2024, 1, 16)), Some(date(2024, 1, 16)))
            .unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].date, date(2024, 1, 16));

        let open_ended = adapter
            .fetch_daily_bars("SPY", Some(date(2024, 1, 16)), None)
            .unwrap();
        assert_eq!(open_ended.len(), 2);
    }

    #[test]
    fn fetch_daily_bars_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let result = adapter.fetch_daily_bars("XYZ", None, None);
        assert!(matches!(result, Err(ShinneError::DataSource { .. })));
    }

    #[test]
    fn symbol_lookup_ignores_file_name_case() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("usdjpy=x.csv"),
            "date,open,high,low,close\n2024-01-02,141.0,142.0,140.5,141.8\n",
        )
        .unwrap();
        let adapter = CsvAdapter::new(dir.path().to_path_buf());

        assert_eq!(adapter.list_symbols().unwrap(), vec!["usdjpy=x"]);
        let bars = adapter.fetch_daily_bars("USDJPY=X", None, None).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(
            adapter.get_data_range("USDJPY=X").unwrap(),
            Some((date(2024, 1, 2), date(2024, 1, 2), 1))
        );
    }

    #[test]
    fn headers_are_matched_by_name_and_case() {
        let dir = TempDir::new().unwrap();
        let csv_content = "Date,Close,High,Low,Open,Adj Close,Volume\n\
            2024-02-01 00:00:00,151.5,152.0,150.0,150.5,151.5,0\n";
        fs::write(dir.path().join("USDJPY=X.csv"), csv_content).unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_daily_bars("USDJPY=X", None, None).unwrap();

        assert_eq!(
            bars,
            vec![DailyBar::new(date(2024, 2, 1), 150.5, 152.0, 150.0, 151.5)]
        );
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("SPY.csv"), "date,open,high,close\n").unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        match adapter.fetch_daily_bars("SPY", None, None) {
            Err(ShinneError::DataSource { reason }) => assert_eq!(reason, "missing low column"),
            other => panic!("expected DataSource error, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_price_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("SPY.csv"),
            "date,open,high,low,close\n2024-01-02,1.0,abc,0.5,1.0\n",
        )
        .unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        match adapter.fetch_daily_bars("SPY", None, None) {
            Err(ShinneError::DataSource { reason }) => assert!(reason.contains("invalid high")),
            other => panic!("expected DataSource error, got {other:?}"),
        }
    }

    #[test]
    fn rows_keep_file_order() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("SPY.csv"),
            "date,open,high,low,close\n2024-01-03,1,1,1,1\n2024-01-02,1,1,1,1\n",
        )
        .unwrap();

        let adapter = CsvAdapter::new(dir.path().to_path_buf());
        let bars = adapter.fetch_daily_bars("SPY", None, None).unwrap();
        assert_eq!(bars[0].date, date(2024, 1, 3));
        assert_eq!(bars[1].date, date(2024, 1, 2));
    }

    #[test]
    fn list_symbols_returns_csv_stems() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        let symbols = adapter.list_symbols().unwrap();
        assert_eq!(symbols, vec!["QQQ", "SPY"]);
    }

    #[test]
    fn get_data_range_reports_bounds() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvAdapter::new(path);

        assert_eq!(
            adapter.get_data_range("SPY").unwrap(),
            Some((date(2024, 1, 15), date(2024, 1, 17), 3))
        );
        assert_eq!(adapter.get_data_range("QQQ").unwrap(), None);
        assert_eq!(adapter.get_data_range("XYZ").unwrap(), None);
    }
}
