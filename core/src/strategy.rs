// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Strategy interface.
//!
//! Strategies name the event kinds they consume, receive each event through
//! a single synchronous entry point and produce order intents through their
//! [`StrategyCtx`]. Write the strategy once, run it in backtest, paper or
//! live with zero code changes.

use crate::{
    bus::{EventBus, HandlerError},
    clock::EngineClock,
    event::{Event, EventKind, EventPayload, OrderIntent, OrderUpdate},
};
use smol_str::SmolStr;
use std::{cell::RefCell, rc::Rc};

/// Pre-trade gate consulted before an order intent reaches the bus.
///
/// `Err` carries the refusal reason, surfaced as an `OrderRejected` event.
pub trait OrderGate {
    fn review(&self, intent: &OrderIntent) -> Result<(), SmolStr>;
}

/// Per-strategy handle to the engine: clock access and order submission.
pub struct StrategyCtx {
    bus: Rc<EventBus>,
    clock: Rc<dyn EngineClock>,
    gate: Option<Rc<dyn OrderGate>>,
    strategy: SmolStr,
}

impl std::fmt::Debug for StrategyCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyCtx")
            .field("strategy", &self.strategy)
            .field("gated", &self.gate.is_some())
            .finish()
    }
}

impl StrategyCtx {
    pub fn new(bus: Rc<EventBus>, clock: Rc<dyn EngineClock>, strategy: SmolStr) -> Self {
        Self {
            bus,
            clock,
            gate: None,
            strategy,
        }
    }

    pub fn with_gate(mut self, gate: Rc<dyn OrderGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn now_ns(&self) -> i64 {
        self.clock.now_ns()
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    /// Publishes an event stamped with the strategy name and current time.
    pub fn publish(&self, payload: EventPayload) {
        self.bus
            .publish(Event::new(payload, self.clock.now_ns(), self.strategy.clone()));
    }

    /// Submits a buy intent denominated in USD notional.
    pub fn buy(&self, token: SmolStr, amount_usd: rust_decimal::Decimal, slippage_bps: u32) {
        let mut intent = OrderIntent::buy(token, amount_usd, slippage_bps);
        intent.strategy = self.strategy.clone();
        self.submit(intent);
    }

    /// Submits a sell intent denominated in token units.
    pub fn sell(&self, token: SmolStr, amount: rust_decimal::Decimal, slippage_bps: u32) {
        let mut intent = OrderIntent::sell(token, amount, slippage_bps);
        intent.strategy = self.strategy.clone();
        self.submit(intent);
    }

    fn submit(&self, intent: OrderIntent) {
        if let Some(gate) = &self.gate {
            if let Err(reason) = gate.review(&intent) {
                tracing::warn!(
                    strategy = %self.strategy,
                    token = %intent.token,
                    %reason,
                    "order intent refused by risk gate"
                );
                self.publish(EventPayload::OrderRejected(OrderUpdate {
                    token: intent.token,
                    side: intent.side,
                    amount_usd: intent.amount_usd,
                    quantity: intent.amount,
                    reason,
                    ..Default::default()
                }));
                return;
            }
        }
        self.publish(EventPayload::OrderSubmitted(intent));
    }
}

/// A trading strategy driven by bus events.
pub trait Strategy {
    fn name(&self) -> SmolStr;

    /// Event kinds this strategy consumes; bound once at wiring time.
    fn subscriptions(&self) -> &'static [EventKind];

    /// Called once when the engine starts, before any event is delivered.
    fn on_start(&mut self, _ctx: &StrategyCtx) {}

    /// Called once at shutdown. Must not perform unbounded work.
    fn on_stop(&mut self, _ctx: &StrategyCtx) {}

    fn on_event(&mut self, event: &Event, ctx: &StrategyCtx);
}

/// Wires a strategy's subscriptions onto the bus.
///
/// Each subscription routes through the shared `Rc<RefCell<..>>` so the
/// strategy keeps exclusive mutable state; the bus's drained dispatch
/// guarantees the borrow is never contended.
pub fn bind_strategy(
    bus: &Rc<EventBus>,
    strategy: &Rc<RefCell<dyn Strategy>>,
    ctx: &Rc<StrategyCtx>,
) {
    let kinds = strategy.borrow().subscriptions();
    for kind in kinds {
        let strategy = Rc::clone(strategy);
        let ctx = Rc::clone(ctx);
        bus.subscribe(*kind, move |event| {
            let mut strategy = strategy
                .try_borrow_mut()
                .map_err(|_| HandlerError::new("strategy re-entered"))?;
            strategy.on_event(event, &ctx);
            Ok(())
        });
    }
}
