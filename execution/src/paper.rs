// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Paper trading adapter.
//!
//! Simulates execution without touching the chain: every `order-submitted`
//! is filled synchronously at the last observed price for the token, and the
//! ledger (balance, positions, trade log) lives here and nowhere else.
//! The same adapter backs paper mode and the backtest replayer.

use fnv::FnvHashMap;
use indexmap::IndexMap;
use martim_core::{
    adapter::{announce_connected, AdapterError, ExecutionAdapter, PaperExecution},
    bus::EventBus,
    clock::EngineClock,
    event::{Event, EventPayload, OrderIntent, OrderUpdate},
    Side,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use smol_str::SmolStr;
use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

/// One simulated execution, kept for post-run analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaperTrade {
    pub side: Side,
    pub token: SmolStr,
    pub amount_usd: Decimal,
    pub amount_tokens: Decimal,
    pub price: Decimal,
    pub timestamp_ns: i64,
    pub signature: SmolStr,
}

#[derive(Debug)]
struct Ledger {
    initial_balance_usd: Decimal,
    balance_usd: Decimal,
    positions: IndexMap<SmolStr, Decimal>,
    entry_prices: FnvHashMap<SmolStr, Decimal>,
    last_prices: FnvHashMap<SmolStr, Decimal>,
    trades: Vec<PaperTrade>,
    fill_count: u64,
    total_volume_usd: Decimal,
}

impl Ledger {
    fn new(initial_balance_usd: Decimal) -> Self {
        Self {
            initial_balance_usd,
            balance_usd: initial_balance_usd,
            positions: IndexMap::new(),
            entry_prices: FnvHashMap::default(),
            last_prices: FnvHashMap::default(),
            trades: Vec::new(),
            fill_count: 0,
            total_volume_usd: Decimal::ZERO,
        }
    }
}

#[derive(Debug)]
struct PaperInner {
    clock: Rc<dyn EngineClock>,
    ledger: RefCell<Ledger>,
    bus: RefCell<Weak<EventBus>>,
    connected: Cell<bool>,
}

/// Simulated execution adapter. Cheap to clone; all clones share one ledger.
#[derive(Debug, Clone)]
pub struct PaperAdapter {
    inner: Rc<PaperInner>,
}

impl PaperAdapter {
    pub const NAME: &'static str = "paper";

    pub fn new(initial_balance_usd: Decimal, clock: Rc<dyn EngineClock>) -> Self {
        Self {
            inner: Rc::new(PaperInner {
                clock,
                ledger: RefCell::new(Ledger::new(initial_balance_usd)),
                bus: RefCell::new(Weak::new()),
                connected: Cell::new(false),
            }),
        }
    }

    /// Manually sets the last observed price (used by the replayer to seed
    /// the graduation price before the first tick arrives).
    pub fn set_price(&self, token: SmolStr, price_usd: Decimal) {
        self.inner
            .ledger
            .borrow_mut()
            .last_prices
            .insert(token, price_usd);
    }

    pub fn balance(&self) -> Decimal {
        self.inner.ledger.borrow().balance_usd
    }

    pub fn position(&self, token: &SmolStr) -> Decimal {
        self.inner
            .ledger
            .borrow()
            .positions
            .get(token)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// Average entry price of an open position, if the token is held.
    pub fn entry_price(&self, token: &SmolStr) -> Option<Decimal> {
        self.inner.ledger.borrow().entry_prices.get(token).copied()
    }

    pub fn open_positions(&self) -> usize {
        self.inner.ledger.borrow().positions.len()
    }

    pub fn trades(&self) -> Vec<PaperTrade> {
        self.inner.ledger.borrow().trades.clone()
    }

    pub fn total_volume_usd(&self) -> Decimal {
        self.inner.ledger.borrow().total_volume_usd
    }

    /// Realized P&L is the balance change; unrealized marks open positions
    /// at their last observed price.
    pub fn total_pnl(&self) -> Decimal {
        let ledger = self.inner.ledger.borrow();
        let realized = ledger.balance_usd - ledger.initial_balance_usd;
        let unrealized: Decimal = ledger
            .positions
            .iter()
            .map(|(token, quantity)| {
                *quantity
                    * ledger
                        .last_prices
                        .get(token)
                        .copied()
                        .unwrap_or(Decimal::ZERO)
            })
            .sum();
        realized + unrealized
    }

    fn publish(&self, payload: EventPayload) {
        if let Some(bus) = self.inner.bus.borrow().upgrade() {
            bus.publish(Event::new(
                payload,
                self.inner.clock.now_ns(),
                SmolStr::new_static(Self::NAME),
            ));
        }
    }

    /// Executes an intent against the ledger. Returns the fill update to
    /// publish, or the rejection reason.
    fn execute(&self, intent: &OrderIntent) -> Result<OrderUpdate, AdapterError> {
        let mut ledger = self.inner.ledger.borrow_mut();
        let now_ns = self.inner.clock.now_ns();
        let signature = SmolStr::new(format!(
            "paper_{}_{}",
            ledger.fill_count,
            now_ns / 1_000_000_000
        ));
        let price = ledger
            .last_prices
            .get(&intent.token)
            .copied()
            .unwrap_or(Decimal::ZERO);

        let update = match intent.side {
            Side::Buy => {
                if intent.amount_usd > ledger.balance_usd {
                    return Err(AdapterError::InsufficientBalance(SmolStr::new(format!(
                        "balance ${:.2} < ${:.2}",
                        ledger.balance_usd, intent.amount_usd
                    ))));
                }
                ledger.balance_usd -= intent.amount_usd;
                // Degraded 1:1 fallback when no price has been observed yet.
                let tokens = if price > Decimal::ZERO {
                    intent.amount_usd / price
                } else {
                    intent.amount_usd
                };
                *ledger
                    .positions
                    .entry(intent.token.clone())
                    .or_insert(Decimal::ZERO) += tokens;
                ledger.entry_prices.insert(
                    intent.token.clone(),
                    if price > Decimal::ZERO { price } else { Decimal::ONE },
                );
                ledger.total_volume_usd += intent.amount_usd;
                tracing::info!(token = %intent.token, amount_usd = %intent.amount_usd, %price, "paper buy");
                OrderUpdate {
                    token: intent.token.clone(),
                    side: Side::Buy,
                    price,
                    quantity: tokens,
                    amount_usd: intent.amount_usd,
                    tx_signature: signature,
                    ..Default::default()
                }
            }
            Side::Sell => {
                let held = ledger
                    .positions
                    .get(&intent.token)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let sell_amount = if intent.amount > Decimal::ZERO {
                    intent.amount.min(held)
                } else {
                    held
                };
                let proceeds = sell_amount * price;
                ledger.balance_usd += proceeds;
                let remaining = held - sell_amount;
                if remaining <= Decimal::ZERO {
                    ledger.positions.shift_remove(&intent.token);
                    ledger.entry_prices.remove(&intent.token);
                } else {
                    ledger.positions.insert(intent.token.clone(), remaining);
                }
                ledger.total_volume_usd += proceeds;
                tracing::info!(token = %intent.token, %sell_amount, %price, %proceeds, "paper sell");
                OrderUpdate {
                    token: intent.token.clone(),
                    side: Side::Sell,
                    price,
                    quantity: sell_amount,
                    amount_usd: proceeds,
                    tx_signature: signature,
                    ..Default::default()
                }
            }
        };

        ledger.fill_count += 1;
        ledger.trades.push(PaperTrade {
            side: intent.side,
            token: intent.token.clone(),
            amount_usd: update.amount_usd,
            amount_tokens: update.quantity,
            price,
            timestamp_ns: now_ns,
            signature: update.tx_signature.clone(),
        });
        Ok(update)
    }

    /// Bus-driven fill path: `order-submitted` in, fill or reject event out.
    fn handle_intent(&self, intent: &OrderIntent) {
        match self.execute(intent) {
            Ok(update) => self.publish(EventPayload::OrderFilled(update)),
            Err(error) => {
                tracing::warn!(token = %intent.token, %error, "paper order rejected");
                self.publish(EventPayload::OrderRejected(OrderUpdate {
                    token: intent.token.clone(),
                    side: intent.side,
                    amount_usd: intent.amount_usd,
                    reason: SmolStr::new(error.to_string()),
                    ..Default::default()
                }));
            }
        }
    }
}

impl PaperExecution for PaperAdapter {
    fn attach(&self, bus: &Rc<EventBus>) {
        *self.inner.bus.borrow_mut() = Rc::downgrade(bus);

        let adapter = self.clone();
        bus.subscribe(martim_core::EventKind::PriceUpdate, move |event| {
            if let EventPayload::PriceUpdate(update) = event.payload() {
                if update.price_usd > Decimal::ZERO {
                    adapter.set_price(update.token.clone(), update.price_usd);
                }
            }
            Ok(())
        });

        let adapter = self.clone();
        bus.subscribe(martim_core::EventKind::OrderSubmitted, move |event| {
            if let EventPayload::OrderSubmitted(intent) = event.payload() {
                adapter.handle_intent(intent);
            }
            Ok(())
        });
    }

    fn seed_price(&self, token: SmolStr, price_usd: Decimal) {
        self.set_price(token, price_usd);
    }

    fn balance_usd(&self) -> Decimal {
        self.balance()
    }

    fn pnl(&self) -> Decimal {
        self.total_pnl()
    }

    fn fill_count(&self) -> u64 {
        self.inner.ledger.borrow().fill_count
    }
}

#[async_trait(?Send)]
impl ExecutionAdapter for PaperAdapter {
    fn name(&self) -> SmolStr {
        SmolStr::new_static(Self::NAME)
    }

    async fn connect(&self, bus: Rc<EventBus>) -> Result<(), AdapterError> {
        self.attach(&bus);
        self.inner.connected.set(true);
        announce_connected(&bus, self.name(), self.inner.clock.now_ns());
        tracing::info!(balance = %self.balance(), "paper adapter ready");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), AdapterError> {
        self.inner.connected.set(false);
        let ledger = self.inner.ledger.borrow();
        tracing::info!(
            trades = ledger.fill_count,
            volume = %ledger.total_volume_usd,
            balance = %ledger.balance_usd,
            "paper adapter stopped"
        );
        Ok(())
    }

    async fn submit_order(&self, intent: &OrderIntent) -> Result<SmolStr, AdapterError> {
        if !self.inner.connected.get() {
            return Err(AdapterError::NotConnected);
        }
        let update = self.execute(intent)?;
        let signature = update.tx_signature.clone();
        self.publish(EventPayload::OrderFilled(update));
        Ok(signature)
    }

    fn is_connected(&self) -> bool {
        self.inner.connected.get()
    }
}
