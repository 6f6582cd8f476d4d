//! CSV report adapter implementing ReportPort.
//!
//! Each report is one flat table. Values that do not apply to a row are
//! written as empty cells so every row has the same columns.

use crate::domain::backtest::TradeRecord;
use crate::domain::error::ProfitHighError;
use crate::domain::indicator::IndicatorPoint;
use crate::domain::ranking::SignalRow;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

/// Placeholder written where PROFITHIGH1 has not formed yet.
pub const NOT_YET_FORMED: &str = "Profithigh1 not yet formed";

#[derive(Debug, Serialize)]
struct SignalCsvRow {
    #[serde(rename = "Symbol")]
    symbol: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "First Crossing Date")]
    first_crossing_date: Option<String>,
    #[serde(rename = "Close at Crossing")]
    close_at_crossing: Option<f64>,
    #[serde(rename = "PROFITHIGH1")]
    profit_high1: Option<f64>,
    #[serde(rename = "Last Close")]
    last_close: Option<f64>,
    #[serde(rename = "Current PROFITHIGH1")]
    current_profit_high1: Option<String>,
    #[serde(rename = "Approaching")]
    approaching: Option<bool>,
}

impl From<&SignalRow> for SignalCsvRow {
    fn from(row: &SignalRow) -> Self {
        let current_profit_high1 = match (row.last_close, row.current_profit_high1) {
            (_, Some(level)) => Some(level.to_string()),
            (Some(_), None) => Some(NOT_YET_FORMED.to_string()),
            (None, None) => None,
        };
        SignalCsvRow {
            symbol: row.symbol.clone(),
            status: row.status.to_string(),
            first_crossing_date: row.first_crossing_date.map(|d| d.to_string()),
            close_at_crossing: row.close_at_crossing,
            profit_high1: row.profit_high1_at_crossing,
            last_close: row.last_close,
            current_profit_high1,
            approaching: row.approaching,
        }
    }
}

#[derive(Debug, Serialize)]
struct TradeCsvRow<'a> {
    #[serde(rename = "Stock Name")]
    symbol: &'a str,
    #[serde(rename = "Buy Date")]
    buy_date: String,
    #[serde(rename = "Buy Price")]
    buy_price: f64,
    #[serde(rename = "PROFITHIGH1")]
    profit_high1: f64,
    #[serde(rename = "Latest Date")]
    latest_date: String,
    #[serde(rename = "Latest Price")]
    latest_price: f64,
    #[serde(rename = "Profit")]
    profit: f64,
    #[serde(rename = "Profit (%)")]
    profit_pct: f64,
}

#[derive(Debug, Serialize)]
struct IndicatorCsvRow<'a> {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Symbol")]
    symbol: &'a str,
    #[serde(rename = "Open")]
    open: Option<f64>,
    #[serde(rename = "High")]
    high: Option<f64>,
    #[serde(rename = "Low")]
    low: Option<f64>,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "PROFITHIGH1")]
    profit_high1: Option<f64>,
}

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    fn write_rows<T: Serialize>(
        &self,
        rows: impl IntoIterator<Item = T>,
        output_path: &Path,
    ) -> Result<usize, ProfitHighError> {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let report_err = |e: csv::Error| ProfitHighError::Report {
            reason: format!("failed to write {}: {}", output_path.display(), e),
        };

        let mut wtr = csv::Writer::from_path(output_path).map_err(report_err)?;
        let mut count = 0usize;
        for row in rows {
            wtr.serialize(row).map_err(report_err)?;
            count += 1;
        }
        wtr.flush()?;
        Ok(count)
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_signals(&self, rows: &[SignalRow], output_path: &Path) -> Result<(), ProfitHighError> {
        let count = self.write_rows(rows.iter().map(SignalCsvRow::from), output_path)?;
        info!(rows = count, path = %output_path.display(), "signals written");
        Ok(())
    }

    fn write_trades(
        &self,
        trades: &[TradeRecord],
        output_path: &Path,
    ) -> Result<(), ProfitHighError> {
        let rows = trades.iter().map(|t| TradeCsvRow {
            symbol: &t.symbol,
            buy_date: t.buy_date.to_string(),
            buy_price: t.buy_price,
            profit_high1: t.profit_high1_at_buy,
            latest_date: t.latest_date.to_string(),
            latest_price: t.latest_price,
            profit: t.profit,
            profit_pct: t.profit_pct,
        });
        let count = self.write_rows(rows, output_path)?;
        info!(rows = count, path = %output_path.display(), "trades written");
        Ok(())
    }

    fn write_indicator(
        &self,
        series: &[IndicatorPoint],
        output_path: &Path,
    ) -> Result<(), ProfitHighError> {
        let rows = series.iter().map(|p| IndicatorCsvRow {
            date: p.bar.date.to_string(),
            symbol: &p.bar.symbol,
            open: p.bar.open,
            high: p.bar.high,
            low: p.bar.low,
            close: p.bar.close,
            profit_high1: p.profit_high1,
        });
        let count = self.write_rows(rows, output_path)?;
        info!(rows = count, path = %output_path.display(), "indicator series written");
        Ok(())
    }
}
