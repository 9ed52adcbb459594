// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Fill simulator.
//!
//! Processes active orders against a stream of price ticks, filling market
//! orders immediately and limit/stop/trailing orders when their trigger
//! conditions are met. Slippage and fees are both expressed in basis points
//! of the execution price.

use crate::{
    book::OrderBook,
    order::{Fill, Order, OrderType},
};
use fnv::FnvHashMap;
use martim_core::Side;
use rust_decimal::Decimal;
use smol_str::SmolStr;

const BPS_DIVISOR: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);

/// Simulates order fills against a price stream.
#[derive(Debug)]
pub struct FillSimulator {
    book: OrderBook,
    slippage_bps: u32,
    fee_bps: u32,
    /// Running extreme per trailing-stop order: max price for sells,
    /// min price for buys. Removed when the order fills.
    trailing_peaks: FnvHashMap<SmolStr, Decimal>,
}

impl FillSimulator {
    pub fn new(book: OrderBook, slippage_bps: u32, fee_bps: u32) -> Self {
        Self {
            book,
            slippage_bps,
            fee_bps,
            trailing_peaks: FnvHashMap::default(),
        }
    }

    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut OrderBook {
        &mut self.book
    }

    /// Processes one price tick: expires due GTD orders, then attempts to
    /// match every active order on the token. Returns the fills generated.
    pub fn on_price(&mut self, token: &SmolStr, price: Decimal, now_ns: i64) -> Vec<Fill> {
        self.book.expire_due(now_ns);

        let candidates: Vec<SmolStr> = self
            .book
            .active_orders()
            .iter()
            .filter(|order| &order.token == token)
            .map(|order| order.order_id.clone())
            .collect();

        let mut fills = Vec::new();
        for order_id in candidates {
            if let Some(fill) = self.try_match(&order_id, price, now_ns) {
                fills.push(fill);
            }
        }
        fills
    }

    fn try_match(&mut self, order_id: &SmolStr, price: Decimal, now_ns: i64) -> Option<Fill> {
        let order = self.book.get(order_id)?.clone();
        let slip = price * Decimal::from(self.slippage_bps) / BPS_DIVISOR;
        let fee_rate = Decimal::from(self.fee_bps) / BPS_DIVISOR;
        let remaining = order.remaining_quantity();

        match order.order_type {
            OrderType::Market => {
                let fill_price = slipped(price, slip, order.side);
                self.fill(order_id, fill_price, remaining, fee_rate, now_ns)
            }
            OrderType::Limit => {
                let limit = order.limit_price?;
                let crosses = match order.side {
                    Side::Buy => price <= limit,
                    Side::Sell => price >= limit,
                };
                if crosses {
                    self.fill(order_id, limit, remaining, fee_rate, now_ns)
                } else {
                    None
                }
            }
            OrderType::Stop => {
                let stop = order.stop_price?;
                let triggered = match order.side {
                    Side::Sell => price <= stop,
                    Side::Buy => price >= stop,
                };
                if triggered {
                    let fill_price = slipped(price, slip, order.side);
                    self.fill(order_id, fill_price, remaining, fee_rate, now_ns)
                } else {
                    None
                }
            }
            OrderType::TrailingStop => self.match_trailing(&order, price, slip, fee_rate, now_ns),
            // Reserved order types: validated but not matched yet.
            OrderType::StopLimit | OrderType::Twap | OrderType::Iceberg => None,
        }
    }

    fn match_trailing(
        &mut self,
        order: &Order,
        price: Decimal,
        slip: Decimal,
        fee_rate: Decimal,
        now_ns: i64,
    ) -> Option<Fill> {
        let previous = self
            .trailing_peaks
            .get(&order.order_id)
            .copied()
            .unwrap_or(price);

        let (peak, triggered) = match order.side {
            Side::Sell => {
                let peak = previous.max(price);
                (peak, price <= peak * (Decimal::ONE - order.trail_offset_pct))
            }
            Side::Buy => {
                let peak = previous.min(price);
                (peak, price >= peak * (Decimal::ONE + order.trail_offset_pct))
            }
        };
        self.trailing_peaks.insert(order.order_id.clone(), peak);
        if !triggered {
            return None;
        }

        let fill_price = slipped(price, slip, order.side);
        let fill = self.fill(
            &order.order_id,
            fill_price,
            order.remaining_quantity(),
            fee_rate,
            now_ns,
        );
        if fill.is_some() {
            self.trailing_peaks.remove(&order.order_id);
        }
        fill
    }

    fn fill(
        &mut self,
        order_id: &SmolStr,
        fill_price: Decimal,
        quantity: Decimal,
        fee_rate: Decimal,
        now_ns: i64,
    ) -> Option<Fill> {
        let fees = fill_price * quantity * fee_rate;
        self.book
            .try_fill(order_id, fill_price, quantity, fees, SmolStr::default(), now_ns)
    }
}

fn slipped(price: Decimal, slip: Decimal, side: Side) -> Decimal {
    match side {
        Side::Buy => price + slip,
        Side::Sell => price - slip,
    }
}
