//! PROFITHIGH1 indicator.
//!
//! - `YearTable`: per-year grouping of a symbol's bars
//! - `compute_indicator`: augments each bar with its year's PROFITHIGH1
//! - `IndicatorPoint`: one bar plus its (possibly undefined) level

pub mod profit_high;
pub mod year_table;

pub use profit_high::{PROFIT_HIGH_MULTIPLIER, compute_indicator};
pub use year_table::{YearSummary, YearTable, YearlyRange};

use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub bar: PriceBar,
    /// `None` until the level is formed (first year, gap year).
    pub profit_high1: Option<f64>,
}

impl IndicatorPoint {
    pub fn date(&self) -> NaiveDate {
        self.bar.date
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors_read_through_to_bar() {
        let point = IndicatorPoint {
            bar: PriceBar {
                symbol: "TEST".into(),
                date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
                open: Some(10.0),
                high: Some(12.0),
                low: Some(9.0),
                close: 11.5,
            },
            profit_high1: None,
        };
        assert_eq!(point.date(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(point.close(), 11.5);
    }
}
