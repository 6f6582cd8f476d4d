//! Backtest evaluation of the first PROFITHIGH1 breakout.
//!
//! Entry is the first close strictly above the level; the position is marked
//! against the last close in the series.

use crate::domain::error::ProfitHighError;
use crate::domain::indicator::IndicatorPoint;
use crate::domain::signal::{first_match, strictly_exceeded};
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeRecord {
    pub symbol: String,
    pub buy_date: NaiveDate,
    pub buy_price: f64,
    pub profit_high1_at_buy: f64,
    pub latest_date: NaiveDate,
    pub latest_price: f64,
    pub profit: f64,
    pub profit_pct: f64,
}

/// `Ok(None)` when the series never closes above its level.
pub fn evaluate(
    symbol: &str,
    series: &[IndicatorPoint],
) -> Result<Option<TradeRecord>, ProfitHighError> {
    let Some(last) = series.last() else {
        return Ok(None);
    };
    let Some(idx) = first_match(series, strictly_exceeded) else {
        return Ok(None);
    };

    let buy = &series[idx];
    let Some(level) = buy.profit_high1 else {
        return Ok(None);
    };
    let buy_price = buy.close();
    if buy_price == 0.0 || !buy_price.is_finite() {
        return Err(ProfitHighError::InvalidPrice {
            symbol: symbol.to_string(),
            price: buy_price,
        });
    }

    let latest_price = last.close();
    let profit = latest_price - buy_price;

    Ok(Some(TradeRecord {
        symbol: symbol.to_string(),
        buy_date: buy.date(),
        buy_price,
        profit_high1_at_buy: level,
        latest_date: last.date(),
        latest_price,
        profit,
        profit_pct: 100.0 * profit / buy_price,
    }))
}
