//! Core domain types and logic.

pub mod ohlcv;
pub mod trend;
pub mod new_price;
pub mod validation;
pub mod summary;
pub mod universe;
pub mod config_validation;
pub mod error;
