// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Backtest replayer.
//!
//! Replays recorded graduations and their price histories through the same
//! strategy code that runs live. Records are linearised by `graduated_at`,
//! every dispatch completes synchronously before the next event is read and
//! the only clock is the simulated one. Same input, bit-identical result.

use crate::{
    adapter::PaperExecution,
    bus::EventBus,
    clock::SimClock,
    error::MartimError,
    event::{Event, EventPayload, PriceUpdate, SignalPayload},
    strategy::{bind_strategy, OrderGate, Strategy, StrategyCtx},
};
use martim_analytics::{TradeJournal, TradeRecord, TradeSide, TradingSummary};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::{cell::RefCell, rc::Rc};

pub mod market_data;

pub use market_data::{load_records, parse_records, GraduationRecord, PricePoint};

/// Multiplier from 5-minute volume to the 24h figure carried on price
/// updates (288 five-minute windows per day).
const VOLUME_5M_TO_24H: i64 = 288;

/// Outcome of one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub total_graduations: usize,
    pub records_skipped: usize,
    pub trades_entered: u64,
    pub round_trips: usize,
    pub win_count: usize,
    pub loss_count: usize,
    pub best_trade_usd: Decimal,
    pub worst_trade_usd: Decimal,
    pub total_pnl: Decimal,
    pub max_drawdown: Decimal,
    pub initial_balance: Decimal,
    pub final_balance: Decimal,
    pub summary: TradingSummary,
}

impl std::fmt::Display for BacktestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "graduations:   {}", self.total_graduations)?;
        writeln!(f, "skipped:       {}", self.records_skipped)?;
        writeln!(f, "fills:         {}", self.trades_entered)?;
        writeln!(f, "round trips:   {}", self.round_trips)?;
        writeln!(f, "wins/losses:   {}/{}", self.win_count, self.loss_count)?;
        writeln!(f, "pnl:           {:.4}", self.total_pnl)?;
        writeln!(f, "max drawdown:  {:.4}", self.max_drawdown)?;
        write!(f, "final balance: {:.4}", self.final_balance)
    }
}

/// Deterministic replayer: one strategy, one paper ledger, one record set.
pub struct BacktestRunner {
    bus: Rc<EventBus>,
    clock: Rc<SimClock>,
    strategy: Rc<RefCell<dyn Strategy>>,
    paper: Rc<dyn PaperExecution>,
    gate: Option<Rc<dyn OrderGate>>,
    records: Vec<GraduationRecord>,
}

impl std::fmt::Debug for BacktestRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BacktestRunner")
            .field("records", &self.records.len())
            .finish()
    }
}

impl BacktestRunner {
    pub fn new(
        strategy: Rc<RefCell<dyn Strategy>>,
        paper: Rc<dyn PaperExecution>,
        records: Vec<GraduationRecord>,
    ) -> Self {
        Self {
            bus: Rc::new(EventBus::new()),
            clock: Rc::new(SimClock::default()),
            strategy,
            paper,
            gate: None,
            records,
        }
    }

    pub fn with_order_gate(mut self, gate: Rc<dyn OrderGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// Replays every record and produces the report.
    pub fn run(&mut self) -> Result<BacktestReport, MartimError> {
        let initial_balance = self.paper.balance_usd();
        let journal = Rc::new(RefCell::new(TradeJournal::new(initial_balance)));

        self.paper.attach(&self.bus);
        self.wire_journal(&journal);

        let name = self.strategy.borrow().name();
        let mut ctx = StrategyCtx::new(Rc::clone(&self.bus), self.clock.clone(), name);
        if let Some(gate) = &self.gate {
            ctx = ctx.with_gate(Rc::clone(gate));
        }
        let ctx = Rc::new(ctx);
        bind_strategy(&self.bus, &self.strategy, &ctx);

        let mut records = std::mem::take(&mut self.records);
        records.sort_by_key(|record| record.graduated_at);
        if let Some(first) = records.iter().find(|record| record.is_valid()) {
            self.clock.set_ns(first.graduated_at * 1_000_000_000);
        }

        self.strategy.borrow_mut().on_start(&ctx);

        let mut skipped = 0usize;
        let mut peak_balance = initial_balance;
        let mut max_drawdown = Decimal::ZERO;
        let track = |balance: Decimal, peak: &mut Decimal, max_dd: &mut Decimal| {
            if balance > *peak {
                *peak = balance;
            }
            if *peak > Decimal::ZERO {
                let dd = (*peak - balance) / *peak;
                if dd > *max_dd {
                    *max_dd = dd;
                }
            }
        };

        for record in &records {
            if !record.is_valid() {
                tracing::warn!(symbol = %record.symbol, "skipping bad graduation record");
                skipped += 1;
                continue;
            }

            let graduated_ns = record.graduated_at * 1_000_000_000;
            self.clock.set_ns(graduated_ns);

            if record.initial_price_usd > Decimal::ZERO {
                self.paper
                    .seed_price(record.mint.clone(), record.initial_price_usd);
            }

            self.bus.publish(Event::new(
                EventPayload::Signal(SignalPayload::Graduation(record.to_event())),
                graduated_ns,
                SmolStr::new_static("backtest"),
            ));
            track(self.paper.balance_usd(), &mut peak_balance, &mut max_drawdown);

            let mut history = record.price_history.clone();
            history.sort_by_key(|point| point.timestamp);
            for point in &history {
                if point.price <= Decimal::ZERO {
                    continue;
                }
                let point_ns = point.timestamp * 1_000_000_000;
                self.clock.set_ns(point_ns);
                self.bus.publish(Event::new(
                    EventPayload::PriceUpdate(PriceUpdate {
                        token: record.mint.clone(),
                        price_usd: point.price,
                        volume_24h: point.volume_5m * Decimal::from(VOLUME_5M_TO_24H),
                        liquidity_usd: Decimal::ZERO,
                    }),
                    point_ns,
                    SmolStr::new_static("backtest"),
                ));
                track(self.paper.balance_usd(), &mut peak_balance, &mut max_drawdown);
            }
        }

        self.strategy.borrow_mut().on_stop(&ctx);

        let journal = journal.borrow();
        let round_trips = journal.round_trips();
        let win_count = round_trips
            .iter()
            .filter(|rt| rt.pnl_usd > Decimal::ZERO)
            .count();
        let best_trade_usd = round_trips
            .iter()
            .map(|rt| rt.pnl_usd)
            .max()
            .unwrap_or(Decimal::ZERO);
        let worst_trade_usd = round_trips
            .iter()
            .map(|rt| rt.pnl_usd)
            .min()
            .unwrap_or(Decimal::ZERO);

        Ok(BacktestReport {
            total_graduations: records.len() - skipped,
            records_skipped: skipped,
            trades_entered: self.paper.fill_count(),
            round_trips: round_trips.len(),
            win_count,
            loss_count: round_trips.len() - win_count,
            best_trade_usd,
            worst_trade_usd,
            total_pnl: self.paper.pnl(),
            max_drawdown,
            initial_balance,
            final_balance: self.paper.balance_usd(),
            summary: journal.summary(),
        })
    }

    /// Routes every fill event into the journal.
    fn wire_journal(&self, journal: &Rc<RefCell<TradeJournal>>) {
        for kind in [
            crate::event::EventKind::OrderFilled,
            crate::event::EventKind::OrderPartiallyFilled,
        ] {
            let journal = Rc::clone(journal);
            self.bus.subscribe(kind, move |event| {
                let (EventPayload::OrderFilled(update)
                | EventPayload::OrderPartiallyFilled(update)) = event.payload()
                else {
                    return Ok(());
                };
                let side = match update.side {
                    crate::event::Side::Buy => TradeSide::Buy,
                    crate::event::Side::Sell => TradeSide::Sell,
                };
                journal.borrow_mut().record(
                    TradeRecord::new(
                        update.token.clone(),
                        side,
                        update.price,
                        update.quantity,
                        event.timestamp_ns(),
                    )
                    .with_signature(update.tx_signature.clone()),
                );
                Ok(())
            });
        }
    }
}
