//! Summary statistics over backtest trade records.

use crate::domain::backtest::TradeRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct TradeSummary {
    pub total_trades: usize,
    pub winners: usize,
    pub losers: usize,
    pub breakeven: usize,
    pub win_rate: f64,
    pub avg_profit_pct: f64,
    pub total_profit_pct: f64,
    pub best: Option<(String, f64)>,
    pub worst: Option<(String, f64)>,
}

impl TradeSummary {
    pub fn compute(trades: &[TradeRecord]) -> Self {
        let mut winners = 0usize;
        let mut losers = 0usize;
        let mut breakeven = 0usize;
        let mut total_profit_pct = 0.0_f64;
        let mut best: Option<(String, f64)> = None;
        let mut worst: Option<(String, f64)> = None;

        for trade in trades {
            if trade.profit > 0.0 {
                winners += 1;
            } else if trade.profit < 0.0 {
                losers += 1;
            } else {
                breakeven += 1;
            }
            total_profit_pct += trade.profit_pct;

            if best.as_ref().is_none_or(|(_, pct)| trade.profit_pct > *pct) {
                best = Some((trade.symbol.clone(), trade.profit_pct));
            }
            if worst.as_ref().is_none_or(|(_, pct)| trade.profit_pct < *pct) {
                worst = Some((trade.symbol.clone(), trade.profit_pct));
            }
        }

        let total_trades = trades.len();
        let (win_rate, avg_profit_pct) = if total_trades > 0 {
            (
                winners as f64 / total_trades as f64,
                total_profit_pct / total_trades as f64,
            )
        } else {
            (0.0, 0.0)
        };

        TradeSummary {
            total_trades,
            winners,
            losers,
            breakeven,
            win_rate,
            avg_profit_pct,
            total_profit_pct,
            best,
            worst,
        }
    }
}
