//! Performance metrics calculator.
//!
//! Aggregates closed trades (simulated or live) and an equity curve into
//! summary statistics and drawdown. Any record exposing a realized P&L can
//! be aggregated through `ClosedTrade`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::backtest::EquityPoint;
use crate::data::to_f64;

/// A trade that may carry a realized P&L.
pub trait ClosedTrade {
    fn symbol(&self) -> &str;

    /// Realized P&L, `None` while the trade is still open.
    fn realized_pnl(&self) -> Option<Decimal>;

    fn exit_date(&self) -> Option<NaiveDate>;
}

/// Trade statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub total_trades: usize,
    /// Trades with positive P&L.
    pub winning_trades: usize,
    /// Trades with negative P&L; breakeven trades are neither.
    pub losing_trades: usize,
    /// Winners as a percentage of all trades.
    pub win_rate: f64,
    pub total_pnl: Decimal,
    pub avg_pnl: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    /// Best realized P&L over all trades.
    pub max_win: Decimal,
    /// Worst realized P&L over all trades; positive when every trade won.
    pub max_loss: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
}

impl TradeSummary {
    /// Gross profit over gross loss.
    pub fn profit_factor(&self) -> f64 {
        let loss = to_f64(self.gross_loss.abs());
        if loss == 0.0 {
            return f64::INFINITY;
        }
        to_f64(self.gross_profit) / loss
    }

    pub fn summary(&self) -> String {
        format!(
            "Trades: {} (W: {}, L: {})\n\
             Win Rate: {:.1}%\n\
             Total P&L: ₹{:.2}\n\
             Avg Trade: ₹{:.2}\n\
             Avg Winner: ₹{:.2}\n\
             Avg Loser: ₹{:.2}\n\
             Largest Win: ₹{:.2}\n\
             Largest Loss: ₹{:.2}",
            self.total_trades,
            self.winning_trades,
            self.losing_trades,
            self.win_rate,
            self.total_pnl,
            self.avg_pnl,
            self.avg_win,
            self.avg_loss,
            self.max_win,
            self.max_loss,
        )
    }
}

/// Drawdown at one point of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownPoint {
    pub date: NaiveDate,
    pub capital: Decimal,
    /// Running maximum of capital.
    pub peak: Decimal,
    /// `(capital - peak) / peak * 100`, never positive.
    pub drawdown_pct: f64,
}

/// Drawdown analysis results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownAnalysis {
    /// Deepest drawdown (most negative percentage).
    pub max_drawdown_pct: f64,
    pub max_drawdown_date: Option<NaiveDate>,
    pub series: Vec<DrawdownPoint>,
}

impl DrawdownAnalysis {
    pub fn drawdown_pcts(&self) -> Vec<f64> {
        self.series.iter().map(|p| p.drawdown_pct).collect()
    }
}

/// Per-symbol statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolBreakdown {
    pub symbol: String,
    pub trades: usize,
    pub total_pnl: Decimal,
    pub avg_pnl: Decimal,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
}

/// Realized P&L for one exit date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPnl {
    pub date: NaiveDate,
    pub trades: usize,
    pub pnl: Decimal,
    pub wins: usize,
    pub losses: usize,
}

/// Metrics calculator.
pub struct MetricsCalculator;

impl MetricsCalculator {
    /// Aggregate statistics over trades with a realized P&L.
    pub fn aggregate<T: ClosedTrade>(trades: &[T]) -> TradeSummary {
        let pnls: Vec<Decimal> = trades.iter().filter_map(|t| t.realized_pnl()).collect();
        if pnls.is_empty() {
            return TradeSummary::default();
        }

        let winners: Vec<Decimal> = pnls.iter().copied().filter(|p| *p > Decimal::ZERO).collect();
        let losers: Vec<Decimal> = pnls.iter().copied().filter(|p| *p < Decimal::ZERO).collect();

        let total_pnl: Decimal = pnls.iter().sum();
        let gross_profit: Decimal = winners.iter().sum();
        let gross_loss: Decimal = losers.iter().sum();

        TradeSummary {
            total_trades: pnls.len(),
            winning_trades: winners.len(),
            losing_trades: losers.len(),
            win_rate: winners.len() as f64 / pnls.len() as f64 * 100.0,
            total_pnl,
            avg_pnl: Self::mean(total_pnl, pnls.len()),
            avg_win: Self::mean(gross_profit, winners.len()),
            avg_loss: Self::mean(gross_loss, losers.len()),
            max_win: pnls.iter().copied().max().unwrap_or(Decimal::ZERO),
            max_loss: pnls.iter().copied().min().unwrap_or(Decimal::ZERO),
            gross_profit,
            gross_loss,
        }
    }

    /// Drawdown of an equity curve against its running peak.
    pub fn drawdown(equity_curve: &[EquityPoint]) -> DrawdownAnalysis {
        let mut analysis = DrawdownAnalysis::default();
        let Some(first) = equity_curve.first() else {
            return analysis;
        };

        let mut peak = first.capital;
        for point in equity_curve {
            peak = peak.max(point.capital);

            let drawdown_pct = if peak.is_zero() {
                0.0
            } else {
                to_f64((point.capital - peak) / peak) * 100.0
            };

            if drawdown_pct < analysis.max_drawdown_pct {
                analysis.max_drawdown_pct = drawdown_pct;
                analysis.max_drawdown_date = Some(point.date);
            }

            analysis.series.push(DrawdownPoint {
                date: point.date,
                capital: point.capital,
                peak,
                drawdown_pct,
            });
        }

        analysis
    }

    /// Percentage change from `initial` to `final_capital`.
    pub fn total_return_pct(initial: Decimal, final_capital: Decimal) -> f64 {
        if initial.is_zero() {
            return 0.0;
        }
        to_f64((final_capital - initial) / initial) * 100.0
    }

    /// Per-symbol statistics, best total P&L first.
    pub fn symbol_breakdown<T: ClosedTrade>(trades: &[T]) -> Vec<SymbolBreakdown> {
        let mut by_symbol: BTreeMap<&str, Vec<Decimal>> = BTreeMap::new();
        for trade in trades {
            if let Some(pnl) = trade.realized_pnl() {
                by_symbol.entry(trade.symbol()).or_default().push(pnl);
            }
        }

        let mut rows: Vec<SymbolBreakdown> = by_symbol
            .into_iter()
            .map(|(symbol, pnls)| {
                let total_pnl: Decimal = pnls.iter().sum();
                let wins = pnls.iter().filter(|p| **p > Decimal::ZERO).count();
                let losses = pnls.iter().filter(|p| **p < Decimal::ZERO).count();
                SymbolBreakdown {
                    symbol: symbol.to_string(),
                    trades: pnls.len(),
                    total_pnl,
                    avg_pnl: Self::mean(total_pnl, pnls.len()),
                    wins,
                    losses,
                    win_rate: wins as f64 / pnls.len() as f64 * 100.0,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.total_pnl.cmp(&a.total_pnl));
        rows
    }

    /// Realized P&L grouped by exit date, newest first.
    pub fn daily_pnl<T: ClosedTrade>(trades: &[T]) -> Vec<DailyPnl> {
        let mut by_date: BTreeMap<NaiveDate, DailyPnl> = BTreeMap::new();
        for trade in trades {
            let (Some(pnl), Some(date)) = (trade.realized_pnl(), trade.exit_date()) else {
                continue;
            };

            let day = by_date.entry(date).or_insert_with(|| DailyPnl {
                date,
                trades: 0,
                pnl: Decimal::ZERO,
                wins: 0,
                losses: 0,
            });
            day.trades += 1;
            day.pnl += pnl;
            if pnl > Decimal::ZERO {
                day.wins += 1;
            } else if pnl < Decimal::ZERO {
                day.losses += 1;
            }
        }

        by_date.into_values().rev().collect()
    }

    fn mean(total: Decimal, count: usize) -> Decimal {
        if count == 0 {
            return Decimal::ZERO;
        }
        (total / Decimal::from(count as i64)).round_dp(2)
    }
}
