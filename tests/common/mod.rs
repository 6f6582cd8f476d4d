#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use profithigh::domain::error::ProfitHighError;
pub use profithigh::domain::price_bar::PriceBar;
use profithigh::domain::universe::Instrument;
use profithigh::ports::price_history_port::PriceHistoryPort;
use std::collections::HashMap;

pub struct MockPriceSource {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceHistoryPort for MockPriceSource {
    fn fetch_weekly(
        &self,
        symbol: &str,
        start_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, ProfitHighError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(ProfitHighError::Database {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, ProfitHighError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn make_bar(symbol: &str, date_str: &str, open: f64, high: f64, low: f64, close: f64) -> PriceBar {
    PriceBar {
        symbol: symbol.to_string(),
        date: date(date_str),
        open: Some(open),
        high: Some(high),
        low: Some(low),
        close,
    }
}

/// `weeks` consecutive weekly bars from `start`, all with the same prices.
pub fn flat_weeks(symbol: &str, start: &str, weeks: usize, open: f64, high: f64, low: f64) -> Vec<PriceBar> {
    let start = date(start);
    (0..weeks)
        .map(|i| PriceBar {
            symbol: symbol.to_string(),
            date: start + Duration::weeks(i as i64),
            open: Some(open),
            high: Some(high),
            low: Some(low),
            close: open,
        })
        .collect()
}

/// A 2022 base year (high 120, low 80) followed by 2023 weeks opening at
/// 100 with the given closes, so PROFITHIGH1 for 2023 is 131.68.
pub fn breakout_history(symbol: &str, closes_2023: &[f64]) -> Vec<PriceBar> {
    let mut bars = flat_weeks(symbol, "2022-01-03", 52, 95.0, 120.0, 80.0);
    let start = date("2023-01-02");
    bars.extend(closes_2023.iter().enumerate().map(|(i, &close)| PriceBar {
        symbol: symbol.to_string(),
        date: start + Duration::weeks(i as i64),
        open: Some(100.0),
        high: Some(close.max(100.0)),
        low: Some(close.min(100.0)),
        close,
    }));
    bars
}

pub fn instrument(symbol: &str) -> Instrument {
    Instrument {
        symbol: symbol.to_string(),
        valid_start_date: date("2022-01-01"),
    }
}
