//! Batch orchestration across a universe of symbols.
//!
//! Each symbol is fetched, augmented with PROFITHIGH1 and evaluated
//! independently. A failing symbol is recorded and the batch carries on.
//! Work runs on a bounded rayon pool; results come back in universe order.

use crate::domain::backtest::{self, TradeRecord};
use crate::domain::error::ProfitHighError;
use crate::domain::indicator::{IndicatorPoint, compute_indicator};
use crate::domain::ranking::{RankedSignals, aggregate};
use crate::domain::run_config::RunConfig;
use crate::domain::signal::detect_signal;
use crate::domain::universe::Instrument;
use crate::ports::price_history_port::PriceHistoryPort;
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// A symbol that produced no result, and why.
#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: ProfitHighError,
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub ranked: RankedSignals,
    pub failures: Vec<SymbolFailure>,
}

#[derive(Debug, Default)]
pub struct BacktestReport {
    pub trades: Vec<TradeRecord>,
    /// Symbols whose close never exceeded PROFITHIGH1.
    pub no_signal: Vec<String>,
    pub failures: Vec<SymbolFailure>,
}

/// Fetches one symbol and computes its indicator series. An empty fetch is
/// reported as `DataUnavailable`.
pub fn load_series(
    source: &dyn PriceHistoryPort,
    instrument: &Instrument,
    multiplier: f64,
) -> Result<Vec<IndicatorPoint>, ProfitHighError> {
    let bars = source.fetch_weekly(&instrument.symbol, instrument.valid_start_date)?;
    if bars.is_empty() {
        return Err(ProfitHighError::DataUnavailable {
            symbol: instrument.symbol.clone(),
        });
    }
    debug!(symbol = %instrument.symbol, bars = bars.len(), "fetched price history");
    Ok(compute_indicator(&bars, multiplier))
}

/// Applies `f` to every instrument, on `workers` threads when more than one.
pub fn map_instruments<T, F>(instruments: &[Instrument], workers: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&Instrument) -> T + Sync,
{
    if workers <= 1 || instruments.len() <= 1 {
        return instruments.iter().map(f).collect();
    }

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| instruments.par_iter().map(&f).collect()),
        Err(e) => {
            warn!(error = %e, "thread pool unavailable, running sequentially");
            instruments.iter().map(f).collect()
        }
    }
}

pub fn scan_universe(
    source: &(dyn PriceHistoryPort + Sync),
    instruments: &[Instrument],
    config: &RunConfig,
) -> ScanReport {
    let outcomes = map_instruments(instruments, config.workers, |instrument| {
        let result = load_series(source, instrument, config.multiplier).map(|series| {
            detect_signal(&instrument.symbol, &series, config.approach_threshold)
        });
        (instrument.symbol.clone(), result)
    });

    let mut failures = Vec::new();
    let mut results = Vec::with_capacity(outcomes.len());

    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(signal) => results.push((symbol, signal)),
            Err(error) => {
                warn!(%symbol, %error, "skipping symbol");
                failures.push(SymbolFailure { symbol, error });
            }
        }
    }

    let ranked = aggregate(results);
    info!(
        signals = ranked.rows.len(),
        skipped = failures.len() + ranked.skipped.len(),
        "scan complete"
    );
    ScanReport { ranked, failures }
}

pub fn backtest_universe(
    source: &(dyn PriceHistoryPort + Sync),
    instruments: &[Instrument],
    config: &RunConfig,
) -> BacktestReport {
    let outcomes = map_instruments(instruments, config.workers, |instrument| {
        let result = load_series(source, instrument, config.multiplier)
            .and_then(|series| backtest::evaluate(&instrument.symbol, &series));
        (instrument.symbol.clone(), result)
    });

    let mut report = BacktestReport::default();

    for (symbol, outcome) in outcomes {
        match outcome {
            Ok(Some(trade)) => {
                debug!(%symbol, profit_pct = trade.profit_pct, "trade recorded");
                report.trades.push(trade);
            }
            Ok(None) => {
                info!(%symbol, "no buy signal");
                report.no_signal.push(symbol);
            }
            Err(error) => {
                warn!(%symbol, %error, "skipping symbol");
                report.failures.push(SymbolFailure { symbol, error });
            }
        }
    }

    info!(
        trades = report.trades.len(),
        no_signal = report.no_signal.len(),
        failed = report.failures.len(),
        "backtest complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price_bar::PriceBar;
    use chrono::{Duration, NaiveDate};
    use std::collections::HashMap;

    struct StubSource {
        bars: HashMap<String, Vec<PriceBar>>,
    }

    impl PriceHistoryPort for StubSource {
        fn fetch_weekly(
            &self,
            symbol: &str,
            start_date: NaiveDate,
        ) -> Result<Vec<PriceBar>, ProfitHighError> {
            match self.bars.get(symbol) {
                Some(bars) => Ok(bars
                    .iter()
                    .filter(|b| b.date >= start_date)
                    .cloned()
                    .collect()),
                None => Err(ProfitHighError::Database {
                    reason: "unknown symbol".into(),
                }),
            }
        }

        fn list_symbols(&self) -> Result<Vec<String>, ProfitHighError> {
            Ok(self.bars.keys().cloned().collect())
        }
    }

    fn instrument(symbol: &str) -> Instrument {
        Instrument {
            symbol: symbol.into(),
            valid_start_date: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
        }
    }

    /// 2022: range 80..120; 2023: open 100 then the given closes.
    fn two_year_bars(symbol: &str, closes_2023: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let mut bars: Vec<PriceBar> = (0..52)
            .map(|i| PriceBar {
                symbol: symbol.into(),
                date: start + Duration::weeks(i),
                open: Some(100.0),
                high: Some(120.0),
                low: Some(80.0),
                close: 100.0,
            })
            .collect();
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        bars.extend(closes_2023.iter().enumerate().map(|(i, &close)| PriceBar {
            symbol: symbol.into(),
            date: start + Duration::weeks(i as i64),
            open: Some(100.0),
            high: Some(close),
            low: Some(close),
            close,
        }));
        bars
    }

    fn source() -> StubSource {
        let mut bars = HashMap::new();
        bars.insert("UP".to_string(), two_year_bars("UP", &[90.0, 140.0, 154.0]));
        bars.insert("NEAR".to_string(), two_year_bars("NEAR", &[110.0, 128.0]));
        bars.insert("EMPTY".to_string(), Vec::new());
        StubSource { bars }
    }

    #[test]
    fn map_preserves_order_in_parallel() {
        let instruments: Vec<_> = (0..20).map(|i| instrument(&format!("S{i}"))).collect();
        let out = map_instruments(&instruments, 4, |i| i.symbol.clone());
        let expected: Vec<_> = (0..20).map(|i| format!("S{i}")).collect();
        assert_eq!(out, expected);
    }

    #[test]
    fn load_series_reports_empty_as_unavailable() {
        let err = load_series(&source(), &instrument("EMPTY"), 0.792).unwrap_err();
        assert!(matches!(err, ProfitHighError::DataUnavailable { symbol } if symbol == "EMPTY"));
    }

    #[test]
    fn scan_isolates_failures() {
        let instruments = vec![
            instrument("UP"),
            instrument("MISSING"),
            instrument("NEAR"),
            instrument("EMPTY"),
        ];
        let report = scan_universe(&source(), &instruments, &RunConfig::default());

        let order: Vec<_> = report
            .ranked
            .rows
            .iter()
            .map(|r| r.symbol.as_str())
            .collect();
        assert_eq!(order, vec!["NEAR", "UP"]);

        let failed: Vec<_> = report.failures.iter().map(|f| f.symbol.as_str()).collect();
        assert_eq!(failed, vec!["MISSING", "EMPTY"]);
    }

    #[test]
    fn backtest_collects_trades_and_misses() {
        let instruments = vec![instrument("UP"), instrument("NEAR"), instrument("EMPTY")];
        let config = RunConfig {
            workers: 1,
            ..RunConfig::default()
        };
        let report = backtest_universe(&source(), &instruments, &config);

        assert_eq!(report.trades.len(), 1);
        assert_eq!(report.trades[0].symbol, "UP");
        assert_eq!(report.trades[0].buy_price, 140.0);
        assert_eq!(report.no_signal, vec!["NEAR"]);
        assert_eq!(report.failures.len(), 1);
    }
}
