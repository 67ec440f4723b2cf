#![allow(dead_code)]

use chrono::NaiveDate;
use shinneashi::domain::error::ShinneError;
pub use shinneashi::domain::ohlcv::DailyBar;
use shinneashi::ports::data_port::{in_range, DataPort};
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<DailyBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<DailyBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, ShinneError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ShinneError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| in_range(b.date, start, end))
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ShinneError> {
        let mut symbols: Vec<_> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ShinneError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ShinneError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily bars from (high, low) pairs; open = low, close = high.
pub fn bars_from_extremes(start: &str, extremes: &[(f64, f64)]) -> Vec<DailyBar> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    extremes
        .iter()
        .enumerate()
        .map(|(i, &(high, low))| DailyBar {
            date: start + chrono::Duration::days(i as i64),
            open: low,
            high,
            low,
            close: high,
        })
        .collect()
}

/// A zig-zag series: `count` bars oscillating around `base` with the given
/// half-period, so both breakouts and breakdowns occur.
pub fn zigzag_bars(start: &str, count: usize, base: f64, half_period: usize) -> Vec<DailyBar> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let phase = i % (2 * half_period);
            let offset = if phase < half_period {
                phase as f64
            } else {
                (2 * half_period - phase) as f64
            };
            let mid = base + offset * 2.0;
            DailyBar {
                date: start + chrono::Duration::days(i as i64),
                open: mid - 0.5,
                high: mid + 1.0,
                low: mid - 1.0,
                close: mid + 0.5,
            }
        })
        .collect()
}

pub const SCENARIO_EXTREMES: [(f64, f64); 5] =
    [(10.0, 9.0), (11.0, 10.0), (9.0, 8.0), (12.0, 11.0), (8.0, 7.0)];

pub fn write_csv(dir: &std::path::Path, symbol: &str, bars: &[DailyBar]) {
    let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
    for bar in bars {
        content.push_str(&format!(
            "{},{},{},{},{},0\n",
            bar.date, bar.open, bar.high, bar.low, bar.close
        ));
    }
    std::fs::write(dir.join(format!("{symbol}.csv")), content).unwrap();
}
