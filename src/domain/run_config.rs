//! Typed run parameters assembled from the INI configuration.

use crate::domain::indicator::PROFIT_HIGH_MULTIPLIER;
use crate::domain::signal::DEFAULT_APPROACH_THRESHOLD;
use crate::domain::universe::{DEFAULT_SYMBOL_SUFFIX, default_start_date};
use chrono::NaiveDate;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BACKOFF_MS: u64 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

impl Backoff {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "fixed" => Some(Backoff::Fixed),
            "exponential" => Some(Backoff::Exponential),
            _ => None,
        }
    }
}

/// Bounded retry policy for price fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay.saturating_mul(factor)
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::Fixed,
            base_delay: Duration::from_millis(DEFAULT_BACKOFF_MS),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Csv,
    Sqlite,
}

impl SourceKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "csv" => Some(SourceKind::Csv),
            "sqlite" => Some(SourceKind::Sqlite),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Csv => write!(f, "csv"),
            SourceKind::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub source: SourceKind,
    pub multiplier: f64,
    pub approach_threshold: f64,
    pub symbol_suffix: String,
    pub default_start_date: NaiveDate,
    pub workers: usize,
    pub retry: RetryPolicy,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::Csv,
            multiplier: PROFIT_HIGH_MULTIPLIER,
            approach_threshold: DEFAULT_APPROACH_THRESHOLD,
            symbol_suffix: DEFAULT_SYMBOL_SUFFIX.to_string(),
            default_start_date: default_start_date(),
            workers: DEFAULT_WORKERS,
            retry: RetryPolicy::default(),
        }
    }
}
