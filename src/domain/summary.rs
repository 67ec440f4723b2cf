//! Per-symbol status derived from a finished new price chart.

use chrono::NaiveDate;
use std::fmt;

use crate::domain::new_price::{NewPriceChart, ReversalEvent};
use crate::domain::trend::Trend;

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSummary {
    pub last_date: NaiveDate,
    pub last_close: f64,
    pub trend: Trend,
    pub since_turn: usize,
    pub bar_count: usize,
    pub reversal_count: usize,
    pub last_reversal: Option<ReversalEvent>,
}

impl ChartSummary {
    /// None for an empty chart.
    pub fn from_chart(chart: &NewPriceChart) -> Option<Self> {
        let last = chart.last_bar()?;
        Some(Self {
            last_date: last.date,
            last_close: last.close,
            trend: last.trend,
            since_turn: last.since_turn,
            bar_count: chart.bars.len(),
            reversal_count: chart.reversals.len(),
            last_reversal: chart.reversals.last().copied(),
        })
    }
}

impl fmt::Display for ChartSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} bar {} (close {:.4}), {} bars, {} reversals",
            self.last_date,
            self.trend,
            self.since_turn,
            self.last_close,
            self.bar_count,
            self.reversal_count
        )?;
        if let Some(rev) = &self.last_reversal {
            write!(
                f,
                ", last turn {} on {} at {:.4}",
                rev.trend, rev.date, rev.extreme_price
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::new_price::{generate_new_price_chart, NewPriceConfig};
    use crate::domain::ohlcv::DailyBar;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn empty_chart_has_no_summary() {
        assert!(ChartSummary::from_chart(&NewPriceChart::default()).is_none());
    }

    #[test]
    fn summary_reflects_last_bar() {
        let bars = vec![
            DailyBar::new(day(1), 9.0, 10.0, 9.0, 10.0),
            DailyBar::new(day(2), 10.0, 11.0, 10.0, 11.0),
            DailyBar::new(day(3), 9.0, 9.5, 8.0, 8.0),
            DailyBar::new(day(4), 8.0, 8.5, 7.0, 7.0),
        ];
        let chart = generate_new_price_chart(&bars, &NewPriceConfig::default()).unwrap();
        let summary = ChartSummary::from_chart(&chart).unwrap();

        assert_eq!(summary.last_date, day(4));
        assert_eq!(summary.trend, Trend::Down);
        assert_eq!(summary.since_turn, 2);
        assert_eq!(summary.bar_count, 4);
        assert_eq!(summary.reversal_count, 1);
        assert_eq!(summary.last_reversal.map(|r| r.date), Some(day(3)));
        approx::assert_relative_eq!(summary.last_close, 7.0);
    }

    #[test]
    fn display_includes_last_turn() {
        let bars = vec![
            DailyBar::new(day(1), 9.0, 10.0, 9.0, 10.0),
            DailyBar::new(day(2), 9.0, 9.5, 8.0, 8.0),
        ];
        let chart = generate_new_price_chart(&bars, &NewPriceConfig::default()).unwrap();
        let text = ChartSummary::from_chart(&chart).unwrap().to_string();
        assert_eq!(
            text,
            "2024-02-02 down bar 1 (close 8.0000), 2 bars, 1 reversals, \
             last turn down on 2024-02-02 at 8.0000"
        );
    }

    #[test]
    fn display_without_reversal() {
        let bars = vec![DailyBar::new(day(1), 9.0, 10.0, 9.0, 10.0)];
        let chart = generate_new_price_chart(&bars, &NewPriceConfig::default()).unwrap();
        let text = ChartSummary::from_chart(&chart).unwrap().to_string();
        assert_eq!(text, "2024-02-01 up bar 1 (close 10.0000), 1 bars, 0 reversals");
    }
}
