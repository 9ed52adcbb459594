// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Graduation sniper.
//!
//! Scores every graduation on a 0-100 scale across momentum, holder
//! quality, liquidity depth and activity; hard filters veto regardless of
//! score; position size scales with conviction. Held positions run a strict
//! exit priority on every tick: take-profit, stop-loss, trailing stop,
//! timeout. A dev-wallet dump forces an immediate exit as well.

use fnv::FnvHashMap;
use martim_core::{
    config::EngineConfig,
    event::{DevAction, DevActivityEvent, GraduationEvent, PriceUpdate, SignalPayload},
    Event, EventKind, EventPayload, Strategy, StrategyCtx,
};
use rust_decimal::Decimal;
use serde::Serialize;
use smol_str::SmolStr;

pub mod score;

pub use score::{score_graduation, ScoreBreakdown};

/// Why a position was closed.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
    TrailingStop,
    Timeout,
    DevSell,
}

/// Exit counter per reason; the histogram is part of every backtest report.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize)]
pub struct ExitCounts {
    pub take_profit: u32,
    pub stop_loss: u32,
    pub trailing_stop: u32,
    pub timeout: u32,
    pub dev_sell: u32,
}

impl ExitCounts {
    fn increment(&mut self, reason: ExitReason) {
        match reason {
            ExitReason::TakeProfit => self.take_profit += 1,
            ExitReason::StopLoss => self.stop_loss += 1,
            ExitReason::TrailingStop => self.trailing_stop += 1,
            ExitReason::Timeout => self.timeout += 1,
            ExitReason::DevSell => self.dev_sell += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.take_profit + self.stop_loss + self.trailing_stop + self.timeout + self.dev_sell
    }

    /// Winners by construction: take-profit and trailing-stop exits.
    pub fn wins(&self) -> u32 {
        self.take_profit + self.trailing_stop
    }
}

/// Sniper configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SniperConfig {
    /// Full position size for scores of 80 and above.
    pub base_position_usd: Decimal,
    pub max_positions: usize,
    /// Minimum conviction score to enter.
    pub min_score: i32,
    pub take_profit_pct: Decimal,
    pub stop_loss_pct: Decimal,
    pub trailing_stop_pct: Decimal,
    pub trailing_activate_pct: Decimal,
    pub max_hold_seconds: i64,
    pub exit_on_dev_sell: bool,
    /// Hard floor on pool liquidity (only enforced when liquidity is known).
    pub min_liquidity_usd: Decimal,
    /// Hard ceiling on mcap/liquidity.
    pub max_mcap_liq_ratio: Decimal,
    /// Hard ceiling on top-10 holder share, in percent.
    pub max_top10_concentration: Decimal,
    /// Threshold filters; zero disables them.
    pub min_holders: u32,
    pub min_sol_raised: Decimal,
    pub entry_slippage_bps: u32,
    pub exit_slippage_bps: u32,
}

impl Default for SniperConfig {
    fn default() -> Self {
        Self {
            base_position_usd: Decimal::from(50),
            max_positions: 5,
            min_score: 60,
            take_profit_pct: Decimal::new(50, 2),
            stop_loss_pct: Decimal::new(20, 2),
            trailing_stop_pct: Decimal::new(15, 2),
            trailing_activate_pct: Decimal::new(30, 2),
            max_hold_seconds: 600,
            exit_on_dev_sell: true,
            min_liquidity_usd: Decimal::from(3_000),
            max_mcap_liq_ratio: Decimal::from(200),
            max_top10_concentration: Decimal::from(90),
            min_holders: 0,
            min_sol_raised: Decimal::ZERO,
            entry_slippage_bps: 300,
            exit_slippage_bps: 500,
        }
    }
}

impl SniperConfig {
    /// Maps the engine configuration onto the sniper's knobs.
    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self {
            base_position_usd: config.position_size_usd,
            max_positions: config.max_positions,
            take_profit_pct: config.take_profit_pct,
            stop_loss_pct: config.stop_loss_pct,
            trailing_stop_pct: config.trailing_stop_pct,
            trailing_activate_pct: config.trailing_activate_pct,
            max_hold_seconds: config.max_hold_seconds,
            exit_on_dev_sell: config.exit_on_dev_sell,
            min_holders: config.grad_min_holders,
            min_sol_raised: config.grad_min_sol,
            entry_slippage_bps: config.slippage_bps,
            ..Default::default()
        }
    }
}

/// One held position.
#[derive(Debug, Clone, PartialEq)]
pub struct SniperPosition {
    pub mint: SmolStr,
    pub symbol: SmolStr,
    pub entry_price: Decimal,
    pub amount_usd: Decimal,
    pub amount_tokens: Decimal,
    pub entered_at_ns: i64,
    pub score: i32,
    /// Monotone running maximum since entry.
    pub highest_price: Decimal,
    /// Last tick observed for the token; `None` until the first update.
    pub last_price: Option<Decimal>,
}

/// Multi-factor graduation sniper strategy.
#[derive(Debug)]
pub struct GraduationSniper {
    config: SniperConfig,
    positions: FnvHashMap<SmolStr, SniperPosition>,
    entered: u32,
    filtered: u32,
    scores: Vec<i32>,
    exits: ExitCounts,
    /// Realized P&L over exits with a known exit price.
    realized_pnl: Decimal,
}

impl GraduationSniper {
    pub const NAME: &'static str = "graduation_sniper";

    pub fn new(config: SniperConfig) -> Self {
        Self {
            config,
            positions: FnvHashMap::default(),
            entered: 0,
            filtered: 0,
            scores: Vec::new(),
            exits: ExitCounts::default(),
            realized_pnl: Decimal::ZERO,
        }
    }

    pub fn exit_counts(&self) -> ExitCounts {
        self.exits
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    pub fn entered(&self) -> u32 {
        self.entered
    }

    pub fn filtered(&self) -> u32 {
        self.filtered
    }

    pub fn realized_pnl(&self) -> Decimal {
        self.realized_pnl
    }

    pub fn average_score(&self) -> Decimal {
        if self.scores.is_empty() {
            return Decimal::ZERO;
        }
        Decimal::from(self.scores.iter().sum::<i32>()) / Decimal::from(self.scores.len())
    }

    fn on_graduation(&mut self, event: &GraduationEvent, ctx: &StrategyCtx) {
        let mint = &event.mint;
        let symbol = if event.symbol.is_empty() {
            mint.clone()
        } else {
            event.symbol.clone()
        };

        if self.positions.contains_key(mint) {
            return;
        }
        if self.positions.len() >= self.config.max_positions {
            self.filtered += 1;
            return;
        }
        if event.initial_price_usd <= Decimal::ZERO {
            self.filtered += 1;
            return;
        }
        if self.config.min_holders > 0 && event.holder_count < self.config.min_holders {
            self.filtered += 1;
            tracing::debug!(%symbol, holders = event.holder_count, "skip: too few holders");
            return;
        }
        if self.config.min_sol_raised > Decimal::ZERO
            && event.sol_raised < self.config.min_sol_raised
        {
            self.filtered += 1;
            tracing::debug!(%symbol, sol_raised = %event.sol_raised, "skip: curve underfilled");
            return;
        }

        let breakdown = score_graduation(event);
        let conviction = breakdown.total;
        self.scores.push(conviction);

        // Hard filters override any score.
        let liquidity = event.liquidity_usd;
        if liquidity > Decimal::ZERO && liquidity < self.config.min_liquidity_usd {
            self.filtered += 1;
            tracing::debug!(%symbol, %liquidity, "skip: liquidity below floor");
            return;
        }
        if liquidity > Decimal::ZERO {
            let ratio = score::effective_mcap(event) / liquidity;
            if ratio > self.config.max_mcap_liq_ratio {
                self.filtered += 1;
                tracing::debug!(%symbol, %ratio, "skip: mcap/liq above ceiling");
                return;
            }
        }
        if event.top10_concentration > Decimal::ZERO
            && event.top10_concentration > self.config.max_top10_concentration
        {
            self.filtered += 1;
            tracing::debug!(%symbol, top10 = %event.top10_concentration, "skip: concentration");
            return;
        }
        if conviction < self.config.min_score {
            self.filtered += 1;
            tracing::debug!(
                %symbol,
                score = conviction,
                reasons = ?breakdown.reasons,
                "skip: score below threshold"
            );
            return;
        }

        // Conviction-tiered sizing.
        let position_usd = if conviction >= 80 {
            self.config.base_position_usd
        } else if conviction >= 70 {
            self.config.base_position_usd * Decimal::new(75, 2)
        } else {
            self.config.base_position_usd * Decimal::new(50, 2)
        };

        let entry_price = event.initial_price_usd;
        self.entered += 1;
        self.positions.insert(
            mint.clone(),
            SniperPosition {
                mint: mint.clone(),
                symbol: symbol.clone(),
                entry_price,
                amount_usd: position_usd,
                amount_tokens: position_usd / entry_price,
                entered_at_ns: ctx.now_ns(),
                score: conviction,
                highest_price: entry_price,
                last_price: None,
            },
        );

        ctx.buy(mint.clone(), position_usd, self.config.entry_slippage_bps);
        tracing::info!(
            %symbol,
            score = conviction,
            entry = %entry_price,
            size_usd = %position_usd,
            reasons = ?breakdown.reasons,
            "sniper entry"
        );
    }

    fn on_price(&mut self, update: &PriceUpdate, ctx: &StrategyCtx) {
        let price = update.price_usd;
        if price <= Decimal::ZERO {
            return;
        }

        let decision = {
            let Some(position) = self.positions.get_mut(&update.token) else {
                return;
            };
            position.last_price = Some(price);
            if price > position.highest_price {
                position.highest_price = price;
            }

            let pnl_pct = (price - position.entry_price) / position.entry_price;
            let drawdown_from_high = (position.highest_price - price) / position.highest_price;
            let peak_pnl =
                (position.highest_price - position.entry_price) / position.entry_price;
            let age_ns = ctx.now_ns() - position.entered_at_ns;

            if pnl_pct >= self.config.take_profit_pct {
                Some(ExitReason::TakeProfit)
            } else if pnl_pct <= -self.config.stop_loss_pct {
                Some(ExitReason::StopLoss)
            } else if peak_pnl >= self.config.trailing_activate_pct
                && drawdown_from_high >= self.config.trailing_stop_pct
            {
                Some(ExitReason::TrailingStop)
            } else if age_ns >= self.config.max_hold_seconds * 1_000_000_000 {
                Some(ExitReason::Timeout)
            } else {
                None
            }
        };

        if let Some(reason) = decision {
            self.exit(&update.token, price, true, reason, ctx);
        }
    }

    fn on_dev_activity(&mut self, event: &DevActivityEvent, ctx: &StrategyCtx) {
        if !self.config.exit_on_dev_sell || event.action != DevAction::Sell {
            return;
        }
        let Some(position) = self.positions.get(&event.mint) else {
            return;
        };
        tracing::warn!(
            symbol = %position.symbol,
            amount_pct = %event.amount_pct,
            "dev wallet sold"
        );
        // Book at the last observed price; before the first tick only the
        // entry price exists, and that exit is flagged as price-unknown so
        // it cannot flatter the P&L tally.
        let (exit_price, price_known) = match position.last_price {
            Some(last) => (last, true),
            None => (position.entry_price, false),
        };
        self.exit(&event.mint, exit_price, price_known, ExitReason::DevSell, ctx);
    }

    fn exit(
        &mut self,
        mint: &SmolStr,
        exit_price: Decimal,
        price_known: bool,
        reason: ExitReason,
        ctx: &StrategyCtx,
    ) {
        let Some(position) = self.positions.remove(mint) else {
            return;
        };

        let realized = position.amount_tokens * (exit_price - position.entry_price);
        if price_known {
            self.realized_pnl += realized;
        }
        self.exits.increment(reason);

        ctx.sell(
            mint.clone(),
            position.amount_tokens,
            self.config.exit_slippage_bps,
        );

        let held_s = (ctx.now_ns() - position.entered_at_ns) / 1_000_000_000;
        tracing::info!(
            symbol = %position.symbol,
            ?reason,
            score = position.score,
            pnl_usd = %realized,
            price_known,
            held_s,
            "sniper exit"
        );
    }
}

impl Strategy for GraduationSniper {
    fn name(&self) -> SmolStr {
        SmolStr::new_static(Self::NAME)
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::Signal, EventKind::PriceUpdate]
    }

    fn on_event(&mut self, event: &Event, ctx: &StrategyCtx) {
        match event.payload() {
            EventPayload::Signal(SignalPayload::Graduation(graduation)) => {
                self.on_graduation(graduation, ctx)
            }
            EventPayload::Signal(SignalPayload::DevActivity(activity)) => {
                self.on_dev_activity(activity, ctx)
            }
            EventPayload::PriceUpdate(update) => self.on_price(update, ctx),
            _ => {}
        }
    }

    fn on_stop(&mut self, _ctx: &StrategyCtx) {
        tracing::info!(
            entries = self.entered,
            filtered = self.filtered,
            avg_score = %self.average_score().round_dp(1),
            pnl = %self.realized_pnl,
            exits = ?self.exits,
            "sniper final"
        );
    }
}
