//! CSV report adapter implementing ReportPort.
//!
//! Writes two files per symbol:
//! - `<SYMBOL>_new_price.csv`: `date,open,high,low,close,since_turn,trend`
//! - `<SYMBOL>_reversals.csv`: `date,extreme_price,trend`
//!
//! Header rows are always written, so an empty chart yields header-only files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::error::ShinneError;
use crate::domain::new_price::NewPriceChart;
use crate::ports::report_port::ReportPort;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct CsvReportAdapter;

/// File-name-safe form of a symbol: anything outside `[A-Za-z0-9._-]` becomes `_`.
pub fn file_stem(symbol: &str) -> String {
    symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn report_error(path: &Path, e: impl std::fmt::Display) -> ShinneError {
    ShinneError::Report {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn write_new_price_bars(path: &Path, chart: &NewPriceChart) -> Result<(), ShinneError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| report_error(path, e))?;
    wtr.write_record(["date", "open", "high", "low", "close", "since_turn", "trend"])
        .map_err(|e| report_error(path, e))?;

    for bar in &chart.bars {
        wtr.write_record([
            bar.date.format(DATE_FORMAT).to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
            bar.since_turn.to_string(),
            bar.trend.to_string(),
        ])
        .map_err(|e| report_error(path, e))?;
    }

    wtr.flush().map_err(|e| report_error(path, e))
}

fn write_reversals(path: &Path, chart: &NewPriceChart) -> Result<(), ShinneError> {
    let mut wtr = csv::Writer::from_path(path).map_err(|e| report_error(path, e))?;
    wtr.write_record(["date", "extreme_price", "trend"])
        .map_err(|e| report_error(path, e))?;

    for rev in &chart.reversals {
        wtr.write_record([
            rev.date.format(DATE_FORMAT).to_string(),
            rev.extreme_price.to_string(),
            rev.trend.to_string(),
        ])
        .map_err(|e| report_error(path, e))?;
    }

    wtr.flush().map_err(|e| report_error(path, e))
}

impl ReportPort for CsvReportAdapter {
    fn write(
        &self,
        symbol: &str,
        chart: &NewPriceChart,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ShinneError> {
        fs::create_dir_all(output_dir).map_err(|e| report_error(output_dir, e))?;

        let stem = file_stem(symbol);
        let bars_path = output_dir.join(format!("{stem}_new_price.csv"));
        let reversals_path = output_dir.join(format!("{stem}_reversals.csv"));

        write_new_price_bars(&bars_path, chart)?;
        write_reversals(&reversals_path, chart)?;

        Ok(vec![bars_path, reversals_path])
    }
}
