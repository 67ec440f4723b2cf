//! Configuration validation.
//!
//! Validates every config field before any data is fetched.

use crate::domain::error::ShinneError;
use crate::domain::trend::Trend;
use crate::domain::universe::parse_symbols;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), ShinneError> {
    validate_data_config(config)?;
    validate_chart_config(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), ShinneError> {
    validate_data_source(config)?;
    validate_symbols(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_chart_config(config: &dyn ConfigPort) -> Result<(), ShinneError> {
    validate_length(config)?;
    validate_initial_trend(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ShinneError {
    ShinneError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Checks `[data] source` and the keys the chosen source needs.
pub fn validate_data_source(config: &dyn ConfigPort) -> Result<(), ShinneError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    match source.trim().to_lowercase().as_str() {
        "csv" => Ok(()),
        "sqlite" => match config.get_string("sqlite", "path") {
            Some(p) if !p.trim().is_empty() => Ok(()),
            _ => Err(ShinneError::ConfigMissing {
                section: "sqlite".to_string(),
                key: "path".to_string(),
            }),
        },
        other => Err(invalid(
            "data",
            "source",
            format!("unknown source '{other}', expected csv or sqlite"),
        )),
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), ShinneError> {
    match config.get_string("data", "symbols") {
        Some(s) if !s.trim().is_empty() => parse_symbols(&s)
            .map(|_| ())
            .map_err(|e| invalid("data", "symbols", e.to_string())),
        _ => Err(ShinneError::ConfigMissing {
            section: "data".to_string(),
            key: "symbols".to_string(),
        }),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), ShinneError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(invalid(
                "data",
                "start_date",
                "start_date must not be after end_date",
            ));
        }
    }
    Ok(())
}

/// Reads an optional `[data]` date; blank values count as absent.
pub fn parse_optional_date(
    config: &dyn ConfigPort,
    field: &str,
) -> Result<Option<NaiveDate>, ShinneError> {
    match config.get_string("data", field) {
        Some(s) if !s.trim().is_empty() => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    "data",
                    field,
                    format!("invalid {} format, expected YYYY-MM-DD", field),
                )
            }),
        _ => Ok(None),
    }
}

fn validate_length(config: &dyn ConfigPort) -> Result<(), ShinneError> {
    let Some(raw) = config.get_string("chart", "length") else {
        return Ok(());
    };
    match raw.trim().parse::<i64>() {
        Ok(n) if n >= 1 => Ok(()),
        Ok(_) => Err(invalid("chart", "length", "length must be at least 1")),
        Err(_) => Err(invalid("chart", "length", "length must be an integer")),
    }
}

fn validate_initial_trend(config: &dyn ConfigPort) -> Result<(), ShinneError> {
    match config.get_string("chart", "initial_trend") {
        Some(raw) => raw
            .parse::<Trend>()
            .map(|_| ())
            .map_err(|e| invalid("chart", "initial_trend", e.to_string())),
        None => Ok(()),
    }
}
