//! Aggregated trading performance report generated from a [`TradeJournal`].

use crate::{
    journal::TradeJournal,
    metric::{
        drawdown_duration, Expectancy, MaxDrawdown, ProfitFactor, RecoveryFactor, SharpeRatio,
        SortinoRatio, WinRate,
    },
};
use prettytable::{row, Table};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Annualisation factor for the per-round-trip return series. Memecoin round
/// trips are intraday, so the calendar-day convention of the original system
/// is kept.
const PERIODS_PER_YEAR: u32 = 365;

/// Win/loss streak statistics over the sequence of closed round trips.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Streaks {
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    pub current_streak: usize,
    pub current_is_win: bool,
}

impl Streaks {
    pub fn calculate(outcomes: &[bool]) -> Self {
        if outcomes.is_empty() {
            return Self::default();
        }

        let mut max_win = 0;
        let mut max_loss = 0;
        let mut current = 1;
        for i in 1..outcomes.len() {
            if outcomes[i] == outcomes[i - 1] {
                current += 1;
            } else {
                if outcomes[i - 1] {
                    max_win = max_win.max(current);
                } else {
                    max_loss = max_loss.max(current);
                }
                current = 1;
            }
        }
        if outcomes[outcomes.len() - 1] {
            max_win = max_win.max(current);
        } else {
            max_loss = max_loss.max(current);
        }

        Self {
            max_win_streak: max_win,
            max_loss_streak: max_loss,
            current_streak: current,
            current_is_win: outcomes[outcomes.len() - 1],
        }
    }
}

/// Comprehensive performance summary over the closed round trips of a
/// [`TradeJournal`].
///
/// Ratios that are undefined for the dataset (no trades, zero deviation)
/// are reported as zero; a profit factor with zero gross loss and positive
/// gross profit is reported as [`Decimal::MAX`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradingSummary {
    pub trade_count: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub win_rate: Decimal,
    pub total_pnl: Decimal,
    pub gross_profit: Decimal,
    pub gross_loss: Decimal,
    pub profit_factor: Decimal,
    pub expectancy: Decimal,
    pub avg_win: Decimal,
    pub avg_loss: Decimal,
    pub sharpe: Decimal,
    pub sortino: Decimal,
    pub max_drawdown: Decimal,
    pub max_drawdown_duration: usize,
    pub recovery_factor: Decimal,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    pub current_equity: Decimal,
    pub total_return_pct: Decimal,
}

impl TradingSummary {
    pub fn generate(journal: &TradeJournal) -> Self {
        let round_trips = journal.round_trips();
        let initial_equity = journal.initial_equity();
        let current_equity = journal.current_equity();

        let wins: Vec<Decimal> = round_trips
            .iter()
            .filter(|rt| rt.pnl_usd > Decimal::ZERO)
            .map(|rt| rt.pnl_usd)
            .collect();
        let losses: Vec<Decimal> = round_trips
            .iter()
            .filter(|rt| rt.pnl_usd <= Decimal::ZERO)
            .map(|rt| rt.pnl_usd.abs())
            .collect();

        let total_pnl: Decimal = round_trips.iter().map(|rt| rt.pnl_usd).sum();
        let gross_profit: Decimal = wins.iter().sum();
        let gross_loss: Decimal = losses.iter().sum();
        let win_rate = WinRate::calculate(wins.len(), round_trips.len())
            .map(|w| w.value)
            .unwrap_or(Decimal::ZERO);
        let avg_win = if wins.is_empty() {
            Decimal::ZERO
        } else {
            gross_profit / Decimal::from(wins.len())
        };
        let avg_loss = if losses.is_empty() {
            Decimal::ZERO
        } else {
            gross_loss / Decimal::from(losses.len())
        };

        let returns: Vec<Decimal> = round_trips.iter().map(|rt| rt.pnl_pct).collect();
        let outcomes: Vec<bool> = round_trips
            .iter()
            .map(|rt| rt.pnl_usd > Decimal::ZERO)
            .collect();
        let streaks = Streaks::calculate(&outcomes);
        let max_dd = MaxDrawdown::calculate(journal.equity_curve());

        let profit_factor = ProfitFactor::calculate(gross_profit, gross_loss)
            .map(|pf| pf.value)
            .unwrap_or(Decimal::ZERO);
        let sharpe = SharpeRatio::calculate(&returns, Decimal::ZERO, PERIODS_PER_YEAR)
            .map(|s| s.value)
            .unwrap_or(Decimal::ZERO);
        let sortino = SortinoRatio::calculate(&returns, Decimal::ZERO, PERIODS_PER_YEAR)
            .map(|s| s.value)
            .unwrap_or(Decimal::ZERO);
        let recovery_factor = RecoveryFactor::calculate(total_pnl, max_dd.value * initial_equity)
            .map(|r| r.value)
            .unwrap_or(Decimal::ZERO);
        let total_return_pct = if initial_equity > Decimal::ZERO {
            (current_equity - initial_equity) / initial_equity * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        Self {
            trade_count: round_trips.len(),
            win_count: wins.len(),
            loss_count: losses.len(),
            win_rate,
            total_pnl,
            gross_profit,
            gross_loss,
            profit_factor,
            expectancy: Expectancy::calculate(win_rate, avg_win, avg_loss).value,
            avg_win,
            avg_loss,
            sharpe,
            sortino,
            max_drawdown: max_dd.value,
            max_drawdown_duration: drawdown_duration(journal.equity_curve()),
            recovery_factor,
            max_win_streak: streaks.max_win_streak,
            max_loss_streak: streaks.max_loss_streak,
            current_equity,
            total_return_pct,
        }
    }

    /// Renders the summary as a printable tear-sheet table.
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();
        table.add_row(row!["Trades", self.trade_count]);
        table.add_row(row![
            "Wins / Losses",
            format!("{} / {}", self.win_count, self.loss_count)
        ]);
        table.add_row(row!["Win Rate", format!("{:.2}%", self.win_rate * Decimal::ONE_HUNDRED)]);
        table.add_row(row!["Total PnL", format!("${:.4}", self.total_pnl)]);
        table.add_row(row!["Profit Factor", format!("{:.4}", self.profit_factor)]);
        table.add_row(row!["Expectancy", format!("${:.4}", self.expectancy)]);
        table.add_row(row!["Sharpe", format!("{:.4}", self.sharpe)]);
        table.add_row(row!["Sortino", format!("{:.4}", self.sortino)]);
        table.add_row(row![
            "Max Drawdown",
            format!("{:.2}%", self.max_drawdown * Decimal::ONE_HUNDRED)
        ]);
        table.add_row(row!["Drawdown Periods", self.max_drawdown_duration]);
        table.add_row(row!["Recovery Factor", format!("{:.4}", self.recovery_factor)]);
        table.add_row(row![
            "Streaks (W/L)",
            format!("{} / {}", self.max_win_streak, self.max_loss_streak)
        ]);
        table.add_row(row!["Equity", format!("${:.4}", self.current_equity)]);
        table.add_row(row!["Total Return", format!("{:+.2}%", self.total_return_pct)]);
        table
    }
}
