//! Weekly price bar representation.

use chrono::{Datelike, NaiveDate};

/// One week of price history for a symbol.
///
/// Open, high and low can be missing in upstream data; close is always
/// present.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: f64,
}

impl PriceBar {
    pub fn year(&self) -> i32 {
        self.date.year()
    }
}
