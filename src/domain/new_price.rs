//! New price bar (Shin-ne-ashi) generation.
//!
//! A new bar is synthesized only when a daily bar breaks outside the extreme
//! of the last `length` synthesized bars:
//!
//! - breakout (daily high > window high): bar from the last close up to the daily high
//! - breakdown (daily low < window low): bar from the last close down to the daily low
//! - otherwise the daily bar is skipped and no state changes
//!
//! When both hold (only possible with inverted bars) the breakout wins.
//! Every change of direction is logged as a [`ReversalEvent`] and resets the
//! `since_turn` counter to 1.

use chrono::NaiveDate;

use crate::domain::error::InputError;
use crate::domain::ohlcv::DailyBar;
use crate::domain::trend::Trend;
use crate::domain::validation::{validate_daily_bars, validate_length};

pub const DEFAULT_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewPriceConfig {
    /// Number of trailing new price bars forming the lookback window.
    pub length: usize,
    /// Trend assigned to the seed bar. Decides only whether the second
    /// emitted bar counts as a reversal.
    pub initial_trend: Trend,
}

impl NewPriceConfig {
    pub fn new(length: usize, initial_trend: Trend) -> Result<Self, InputError> {
        validate_length(length)?;
        Ok(Self {
            length,
            initial_trend,
        })
    }
}

impl Default for NewPriceConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            initial_trend: Trend::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewPriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub since_turn: usize,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReversalEvent {
    pub date: NaiveDate,
    /// Breakout high for an upward reversal, breakdown low for a downward one.
    pub extreme_price: f64,
    pub trend: Trend,
}

/// Result of feeding one daily bar to [`NewPriceChart::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Skipped,
    Extended,
    Reversed,
}

/// Accumulated new price bars and reversal events of one pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPriceChart {
    pub bars: Vec<NewPriceBar>,
    pub reversals: Vec<ReversalEvent>,
    pub trend: Trend,
}

impl NewPriceChart {
    /// Chart holding only the seed bar, a copy of `first`.
    pub fn seeded(first: &DailyBar, initial_trend: Trend) -> Self {
        Self {
            bars: vec![NewPriceBar {
                date: first.date,
                open: first.open,
                high: first.high,
                low: first.low,
                close: first.close,
                since_turn: 1,
                trend: initial_trend,
            }],
            reversals: Vec::new(),
            trend: initial_trend,
        }
    }

    pub fn last_bar(&self) -> Option<&NewPriceBar> {
        self.bars.last()
    }

    /// The trailing `min(length, bars.len())` bars.
    pub fn window(&self, length: usize) -> &[NewPriceBar] {
        let lookback = length.min(self.bars.len());
        &self.bars[self.bars.len() - lookback..]
    }

    /// Feeds the next daily bar. A chart without a seed bar is seeded from
    /// `daily`, keeping its current trend as the initial trend.
    ///
    /// `length` must be at least 1; [`NewPriceConfig::new`] enforces this.
    pub fn step(&mut self, daily: &DailyBar, length: usize) -> StepOutcome {
        debug_assert!(length >= 1, "lookback length must be at least 1");
        let Some(last) = self.bars.last() else {
            *self = Self::seeded(daily, self.trend);
            return StepOutcome::Extended;
        };
        let last_close = last.close;
        let last_since_turn = last.since_turn;

        let window = self.window(length);
        let reference_high = window
            .iter()
            .map(|b| b.high)
            .fold(f64::NEG_INFINITY, f64::max);
        let reference_low = window
            .iter()
            .map(|b| b.low)
            .fold(f64::INFINITY, f64::min);

        let (trend, high, low, close, extreme) = if daily.high > reference_high {
            (Trend::Up, daily.high, last_close, daily.high, daily.high)
        } else if daily.low < reference_low {
            (Trend::Down, last_close, daily.low, daily.low, daily.low)
        } else {
            return StepOutcome::Skipped;
        };

        let reversed = trend != self.trend;
        let since_turn = if reversed { 1 } else { last_since_turn + 1 };

        if reversed {
            self.reversals.push(ReversalEvent {
                date: daily.date,
                extreme_price: extreme,
                trend,
            });
        }
        self.bars.push(NewPriceBar {
            date: daily.date,
            open: last_close,
            high,
            low,
            close,
            since_turn,
            trend,
        });
        self.trend = trend;

        if reversed {
            StepOutcome::Reversed
        } else {
            StepOutcome::Extended
        }
    }
}

/// Builds the new price chart for an ordered daily-bar sequence.
///
/// The sequence is validated first (finite prices, strictly increasing dates).
/// Empty input yields an empty chart.
pub fn generate_new_price_chart(
    bars: &[DailyBar],
    config: &NewPriceConfig,
) -> Result<NewPriceChart, InputError> {
    validate_length(config.length)?;
    validate_daily_bars(bars)?;

    let Some((first, rest)) = bars.split_first() else {
        return Ok(NewPriceChart::default());
    };

    let chart = rest.iter().fold(
        NewPriceChart::seeded(first, config.initial_trend),
        |mut chart, daily| {
            let outcome = chart.step(daily, config.length);
            tracing::trace!(date = %daily.date, ?outcome, "new price step");
            chart
        },
    );
    Ok(chart)
}
