//! Cross-symbol aggregation and actionability ranking.

use crate::domain::signal::Signal;
use chrono::NaiveDate;
use std::fmt;

/// Sort priority, most actionable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SortBucket {
    Approaching = 0,
    Formed = 1,
    NotYetFormed = 2,
    Crossed = 3,
}

impl SortBucket {
    pub fn of(signal: &Signal) -> Self {
        match signal {
            Signal::Crossed(_) => SortBucket::Crossed,
            Signal::NotCrossed(state) if state.is_approaching => SortBucket::Approaching,
            Signal::NotCrossed(state) if state.is_formed() => SortBucket::Formed,
            Signal::NotCrossed(_) => SortBucket::NotYetFormed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStatus {
    Crossed,
    NotCrossed,
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalStatus::Crossed => write!(f, "Crossed"),
            SignalStatus::NotCrossed => write!(f, "Not Crossed"),
        }
    }
}

/// One output row. Fields that do not apply to the row's status are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub symbol: String,
    pub status: SignalStatus,
    pub bucket: SortBucket,
    pub first_crossing_date: Option<NaiveDate>,
    pub close_at_crossing: Option<f64>,
    pub profit_high1_at_crossing: Option<f64>,
    pub last_close: Option<f64>,
    pub current_profit_high1: Option<f64>,
    pub approaching: Option<bool>,
}

impl SignalRow {
    pub fn from_signal(signal: &Signal) -> Self {
        let bucket = SortBucket::of(signal);
        match signal {
            Signal::Crossed(event) => SignalRow {
                symbol: event.symbol.clone(),
                status: SignalStatus::Crossed,
                bucket,
                first_crossing_date: Some(event.date),
                close_at_crossing: Some(event.close),
                profit_high1_at_crossing: Some(event.profit_high1),
                last_close: None,
                current_profit_high1: None,
                approaching: None,
            },
            Signal::NotCrossed(state) => SignalRow {
                symbol: state.symbol.clone(),
                status: SignalStatus::NotCrossed,
                bucket,
                first_crossing_date: None,
                close_at_crossing: None,
                profit_high1_at_crossing: None,
                last_close: Some(state.last_close),
                current_profit_high1: state.last_profit_high1,
                approaching: Some(state.is_approaching),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RankedSignals {
    pub rows: Vec<SignalRow>,
    /// Symbols dropped for having no result.
    pub skipped: Vec<String>,
}

impl RankedSignals {
    pub fn count_in(&self, bucket: SortBucket) -> usize {
        self.rows.iter().filter(|r| r.bucket == bucket).count()
    }
}

/// Drops empty results and orders the rest by bucket. Crossed rows are
/// ordered by crossing date; other buckets keep their input order.
pub fn aggregate(results: Vec<(String, Option<Signal>)>) -> RankedSignals {
    let mut ranked = RankedSignals::default();

    for (symbol, signal) in results {
        match signal {
            Some(signal) => ranked.rows.push(SignalRow::from_signal(&signal)),
            None => ranked.skipped.push(symbol),
        }
    }

    ranked.rows.sort_by_key(|row| {
        (
            row.bucket,
            row.first_crossing_date.unwrap_or(NaiveDate::MAX),
        )
    });
    ranked
}
