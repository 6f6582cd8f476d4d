//! Crossing and approach detection against PROFITHIGH1.

use crate::domain::indicator::IndicatorPoint;
use chrono::NaiveDate;

pub const DEFAULT_APPROACH_THRESHOLD: f64 = 0.05;

/// Live signal predicate: close at or above the level.
pub fn crossed_or_equal(close: f64, profit_high1: f64) -> bool {
    close >= profit_high1
}

/// Backtest entry predicate: close strictly above the level.
pub fn strictly_exceeded(close: f64, profit_high1: f64) -> bool {
    close > profit_high1
}

/// |close - level| <= threshold * level
pub fn is_approaching(close: f64, profit_high1: f64, threshold: f64) -> bool {
    (close - profit_high1).abs() <= threshold * profit_high1
}

/// First bar whose close met or exceeded PROFITHIGH1.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingEvent {
    pub symbol: String,
    pub date: NaiveDate,
    pub close: f64,
    pub profit_high1: f64,
}

/// Where an uncrossed symbol stands as of its most recent bar.
#[derive(Debug, Clone, PartialEq)]
pub struct ApproachState {
    pub symbol: String,
    pub last_date: NaiveDate,
    pub last_close: f64,
    /// `None` means PROFITHIGH1 is not yet formed.
    pub last_profit_high1: Option<f64>,
    pub is_approaching: bool,
}

impl ApproachState {
    pub fn is_formed(&self) -> bool {
        self.last_profit_high1.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Crossed(CrossingEvent),
    NotCrossed(ApproachState),
}

impl Signal {
    pub fn symbol(&self) -> &str {
        match self {
            Signal::Crossed(event) => &event.symbol,
            Signal::NotCrossed(state) => &state.symbol,
        }
    }
}

/// Index of the first point satisfying `predicate` against a defined level.
pub fn first_match(
    series: &[IndicatorPoint],
    predicate: impl Fn(f64, f64) -> bool,
) -> Option<usize> {
    series.iter().position(|point| {
        point
            .profit_high1
            .is_some_and(|level| predicate(point.close(), level))
    })
}

/// Scans `series` for the first crossing; failing that, reports approach
/// status from the last bar only. `None` for an empty series.
pub fn detect_signal(symbol: &str, series: &[IndicatorPoint], threshold: f64) -> Option<Signal> {
    let last = series.last()?;

    if let Some(idx) = first_match(series, crossed_or_equal) {
        let point = &series[idx];
        return Some(Signal::Crossed(CrossingEvent {
            symbol: symbol.to_string(),
            date: point.date(),
            close: point.close(),
            profit_high1: point.profit_high1?,
        }));
    }

    let approaching = last
        .profit_high1
        .is_some_and(|level| is_approaching(last.close(), level, threshold));

    Some(Signal::NotCrossed(ApproachState {
        symbol: symbol.to_string(),
        last_date: last.date(),
        last_close: last.close(),
        last_profit_high1: last.profit_high1,
        is_approaching: approaching,
    }))
}
