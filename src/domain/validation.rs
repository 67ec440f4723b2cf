//! Daily-bar sequence validation run ahead of new-price-bar generation.
//!
//! The generator itself assumes a well-formed sequence: strictly increasing
//! dates and finite prices. Inverted bars (high below low) are accepted since
//! the breakout-priority rule is defined for them.

use crate::domain::error::InputError;
use crate::domain::ohlcv::DailyBar;

pub fn validate_length(length: usize) -> Result<(), InputError> {
    if length < 1 {
        return Err(InputError::InvalidLength(length));
    }
    Ok(())
}

pub fn validate_daily_bars(bars: &[DailyBar]) -> Result<(), InputError> {
    for bar in bars {
        validate_prices(bar)?;
    }
    validate_dates(bars)
}

fn validate_prices(bar: &DailyBar) -> Result<(), InputError> {
    match bar.prices().into_iter().find(|(_, value)| !value.is_finite()) {
        Some((field, value)) => Err(InputError::NonFinitePrice {
            date: bar.date,
            field,
            value,
        }),
        None => Ok(()),
    }
}

fn validate_dates(bars: &[DailyBar]) -> Result<(), InputError> {
    for (i, pair) in bars.windows(2).enumerate() {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.date <= prev.date {
            return Err(InputError::NonMonotonicDate {
                index: i + 1,
                previous: prev.date,
                current: curr.date,
            });
        }
    }
    Ok(())
}
