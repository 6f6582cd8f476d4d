//! PROFITHIGH1 yearly breakout level.
//!
//! PROFITHIGH1(Y) = open(first bar of Y) + m * (high(Y-1) - low(Y-1)), with
//! m = 0.792 by default. The level is constant across every bar of Y and is
//! undefined for the first year in the series and for any year whose
//! immediately preceding calendar year has no usable bars.

use crate::domain::indicator::IndicatorPoint;
use crate::domain::indicator::year_table::YearTable;
use crate::domain::price_bar::PriceBar;

pub const PROFIT_HIGH_MULTIPLIER: f64 = 0.792;

pub fn compute_indicator(bars: &[PriceBar], multiplier: f64) -> Vec<IndicatorPoint> {
    if bars.is_empty() {
        return Vec::new();
    }

    let levels = YearTable::build(bars).levels(multiplier);

    bars.iter()
        .map(|bar| IndicatorPoint {
            bar: bar.clone(),
            profit_high1: levels.get(&bar.year()).copied().flatten(),
        })
        .collect()
}
