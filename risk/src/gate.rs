// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Composed pre-trade gate.
//!
//! Bundles the breaker, portfolio limits and exposure tracker behind the
//! engine's [`OrderGate`] seam so every buy intent is reviewed before it
//! reaches the bus. Sells always pass: blocking an exit can only make a bad
//! situation worse.

use crate::{
    breaker::DrawdownCircuitBreaker, exposure::ExposureTracker, limits::PortfolioLimits,
};
use martim_core::{
    bus::EventBus,
    clock::EngineClock,
    event::{EventPayload, OrderIntent, Side},
    strategy::OrderGate,
    EventKind,
};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::{cell::RefCell, rc::Rc};

/// Default sector tag for freshly graduated tokens.
pub const DEFAULT_SECTOR: &str = "memecoin";

/// Pre-trade risk gate combining the drawdown breaker, portfolio limits and
/// live exposure. Shared between the engine wiring (which feeds fills and
/// marks) and every strategy context (which consults it).
#[derive(Debug)]
pub struct RiskGate {
    limits: PortfolioLimits,
    breaker: RefCell<DrawdownCircuitBreaker>,
    exposure: RefCell<ExposureTracker>,
    clock: Rc<dyn EngineClock>,
}

impl RiskGate {
    pub fn new(
        limits: PortfolioLimits,
        breaker: DrawdownCircuitBreaker,
        exposure: ExposureTracker,
        clock: Rc<dyn EngineClock>,
    ) -> Self {
        Self {
            limits,
            breaker: RefCell::new(breaker),
            exposure: RefCell::new(exposure),
            clock,
        }
    }

    /// Subscribes the gate to fills and ticks so exposure and the breaker
    /// track the ledger without any component reaching into another's state.
    pub fn attach(self: &Rc<Self>, bus: &EventBus) {
        let gate = Rc::clone(self);
        bus.subscribe(EventKind::OrderFilled, move |event| {
            if let EventPayload::OrderFilled(update) = event.payload() {
                match update.side {
                    Side::Buy => {
                        gate.on_buy_fill(update.token.clone(), update.quantity, update.price)
                    }
                    Side::Sell => {
                        gate.on_sell_fill(&update.token, update.price);
                    }
                }
            }
            Ok(())
        });
        let gate = Rc::clone(self);
        bus.subscribe(EventKind::PriceUpdate, move |event| {
            if let EventPayload::PriceUpdate(update) = event.payload() {
                gate.on_price(&update.token, update.price_usd);
            }
            Ok(())
        });
    }

    /// Records an executed buy so subsequent reviews see the exposure.
    pub fn on_buy_fill(&self, token: SmolStr, quantity: Decimal, price_usd: Decimal) {
        let mut exposure = self.exposure.borrow_mut();
        exposure.open_position(token, quantity, price_usd, SmolStr::new_static(DEFAULT_SECTOR));
        let equity = exposure.equity();
        drop(exposure);
        self.breaker.borrow_mut().update(equity, self.clock.now_ns());
    }

    /// Records an executed sell, realizing P&L and feeding the breaker.
    pub fn on_sell_fill(&self, token: &SmolStr, price_usd: Decimal) -> Decimal {
        let mut exposure = self.exposure.borrow_mut();
        let realized = exposure.close_position(token, price_usd);
        let equity = exposure.equity();
        drop(exposure);
        self.breaker.borrow_mut().update(equity, self.clock.now_ns());
        realized
    }

    /// Marks a position to market and feeds the breaker.
    pub fn on_price(&self, token: &SmolStr, price_usd: Decimal) {
        let mut exposure = self.exposure.borrow_mut();
        exposure.update_price(token, price_usd);
        let equity = exposure.equity();
        drop(exposure);
        self.breaker.borrow_mut().update(equity, self.clock.now_ns());
    }

    pub fn is_tripped(&self) -> bool {
        self.breaker.borrow().is_tripped()
    }

    pub fn equity(&self) -> Decimal {
        self.exposure.borrow().equity()
    }
}

impl OrderGate for RiskGate {
    fn review(&self, intent: &OrderIntent) -> Result<(), SmolStr> {
        if intent.side == Side::Sell {
            return Ok(());
        }
        if self.breaker.borrow().is_tripped() {
            return Err(SmolStr::new_static("drawdown circuit breaker tripped"));
        }

        let exposure = self.exposure.borrow();
        let equity = exposure.equity();
        let token_pct = if equity > Decimal::ZERO {
            // exposure the position would have after the buy
            (exposure
                .position(&intent.token)
                .map(|p| p.quantity * p.current_price_usd)
                .unwrap_or(Decimal::ZERO)
                + intent.amount_usd)
                / equity
        } else {
            Decimal::ZERO
        };
        let total_pct = if equity > Decimal::ZERO {
            exposure.total_exposure_pct() + intent.amount_usd / equity
        } else {
            Decimal::ZERO
        };

        self.limits.check(
            exposure.position_count(),
            token_pct,
            total_pct,
            DEFAULT_SECTOR,
            exposure.sector_count(DEFAULT_SECTOR),
        )
    }
}
