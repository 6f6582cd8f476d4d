//! Report generation port trait.

use crate::domain::backtest::TradeRecord;
use crate::domain::error::ProfitHighError;
use crate::domain::indicator::IndicatorPoint;
use crate::domain::ranking::SignalRow;
use std::path::Path;

/// Port for writing run results in tabular form.
pub trait ReportPort {
    fn write_signals(&self, rows: &[SignalRow], output_path: &Path) -> Result<(), ProfitHighError>;

    fn write_trades(
        &self,
        trades: &[TradeRecord],
        output_path: &Path,
    ) -> Result<(), ProfitHighError>;

    fn write_indicator(
        &self,
        series: &[IndicatorPoint],
        output_path: &Path,
    ) -> Result<(), ProfitHighError>;
}
