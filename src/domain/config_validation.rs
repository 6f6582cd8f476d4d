//! Configuration validation.
//!
//! Checks every value a run reads before any symbol is fetched.

use crate::domain::error::ProfitHighError;
use crate::domain::run_config::{Backoff, SourceKind};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_run_config(config: &dyn ConfigPort) -> Result<(), ProfitHighError> {
    validate_source(config)?;
    validate_multiplier(config)?;
    validate_threshold(config)?;
    validate_workers(config)?;
    validate_fetch(config)?;
    validate_default_start_date(config)?;
    Ok(())
}

/// Scans additionally need a symbol list to work from.
pub fn validate_scan_config(config: &dyn ConfigPort) -> Result<(), ProfitHighError> {
    validate_run_config(config)?;
    match config.get_string("universe", "file") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(ProfitHighError::ConfigMissing {
            section: "universe".to_string(),
            key: "file".to_string(),
        }),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> ProfitHighError {
    ProfitHighError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_source(config: &dyn ConfigPort) -> Result<(), ProfitHighError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    let kind = SourceKind::parse(&source)
        .ok_or_else(|| invalid("data", "source", "source must be csv or sqlite"))?;

    match kind {
        SourceKind::Csv => {
            let dir = config.get_string("data", "price_dir");
            let file = config.get_string("data", "prices_file");
            let has = |v: Option<String>| v.is_some_and(|s| !s.trim().is_empty());
            if !has(dir) && !has(file) {
                return Err(ProfitHighError::ConfigMissing {
                    section: "data".to_string(),
                    key: "price_dir".to_string(),
                });
            }
        }
        SourceKind::Sqlite => {
            if config.get_string("sqlite", "path").is_none() {
                return Err(ProfitHighError::ConfigMissing {
                    section: "sqlite".to_string(),
                    key: "path".to_string(),
                });
            }
        }
    }
    Ok(())
}

fn validate_multiplier(config: &dyn ConfigPort) -> Result<(), ProfitHighError> {
    let value = config.get_double("signals", "multiplier", 0.792);
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid("signals", "multiplier", "multiplier must be positive"));
    }
    Ok(())
}

fn validate_threshold(config: &dyn ConfigPort) -> Result<(), ProfitHighError> {
    let value = config.get_double("signals", "approach_threshold", 0.05);
    if !(0.0..1.0).contains(&value) {
        return Err(invalid(
            "signals",
            "approach_threshold",
            "approach_threshold must be between 0 and 1",
        ));
    }
    Ok(())
}

fn validate_workers(config: &dyn ConfigPort) -> Result<(), ProfitHighError> {
    if config.get_int("signals", "workers", 4) < 1 {
        return Err(invalid("signals", "workers", "workers must be at least 1"));
    }
    Ok(())
}

fn validate_fetch(config: &dyn ConfigPort) -> Result<(), ProfitHighError> {
    if config.get_int("fetch", "max_attempts", 3) < 1 {
        return Err(invalid(
            "fetch",
            "max_attempts",
            "max_attempts must be at least 1",
        ));
    }
    if config.get_int("fetch", "backoff_ms", 2000) < 0 {
        return Err(invalid(
            "fetch",
            "backoff_ms",
            "backoff_ms must be non-negative",
        ));
    }
    if let Some(kind) = config.get_string("fetch", "backoff") {
        if Backoff::parse(&kind).is_none() {
            return Err(invalid(
                "fetch",
                "backoff",
                "backoff must be fixed or exponential",
            ));
        }
    }
    Ok(())
}

fn validate_default_start_date(config: &dyn ConfigPort) -> Result<(), ProfitHighError> {
    if let Some(s) = config.get_string("universe", "default_start_date") {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            invalid(
                "universe",
                "default_start_date",
                "invalid default_start_date format, expected YYYY-MM-DD",
            )
        })?;
    }
    Ok(())
}
