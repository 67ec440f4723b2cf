//! Daily-bar data access port trait.

use crate::domain::error::ShinneError;
use crate::domain::ohlcv::DailyBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `symbol` within the inclusive `[start, end]` range, oldest
    /// first. `None` leaves that side unbounded.
    fn fetch_daily_bars(
        &self,
        symbol: &str,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<DailyBar>, ShinneError>;

    fn list_symbols(&self) -> Result<Vec<String>, ShinneError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ShinneError>;
}

/// True when `date` falls inside the optional inclusive bounds.
pub fn in_range(date: NaiveDate, start: Option<NaiveDate>, end: Option<NaiveDate>) -> bool {
    start.is_none_or(|s| date >= s) && end.is_none_or(|e| date <= e)
}
