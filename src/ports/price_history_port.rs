//! Price history access port trait.

use crate::domain::error::ProfitHighError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

/// Source of weekly bars for a symbol.
///
/// Implementations return bars dated on or after `start_date` in ascending
/// date order. An error or an empty vector both mean the symbol should be
/// skipped for this run.
pub trait PriceHistoryPort {
    fn fetch_weekly(
        &self,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProfitHighError>;

    fn list_symbols(&self) -> Result<Vec<String>, ProfitHighError>;
}

impl<P: PriceHistoryPort + ?Sized> PriceHistoryPort for Box<P> {
    fn fetch_weekly(
        &self,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProfitHighError> {
        (**self).fetch_weekly(symbol, start_date)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ProfitHighError> {
        (**self).list_symbols()
    }
}
