//! In-memory order book for managing pending and active orders.

use crate::order::{Fill, Order, OrderStatus, TimeInForce, ValidationErrors};
use fnv::FnvHashMap;
use rust_decimal::Decimal;
use smol_str::SmolStr;

/// Mapping from order id to order plus the ordered set of active ids.
///
/// An order is *active* while its status is `Pending`, `Submitted`,
/// `Accepted` or `PartiallyFilled`.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: FnvHashMap<SmolStr, Order>,
    active_ids: Vec<SmolStr>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and admits an order. On success the order is `Submitted`
    /// and its id returned; on failure it is dropped as `Rejected`.
    pub fn submit(&mut self, mut order: Order, now_ns: i64) -> Result<SmolStr, ValidationErrors> {
        let errors = order.validate();
        if !errors.is_empty() {
            order.status = OrderStatus::Rejected;
            order.updated_at_ns = now_ns;
            return Err(ValidationErrors { errors });
        }
        order.status = OrderStatus::Submitted;
        if order.created_at_ns == 0 {
            order.created_at_ns = now_ns;
        }
        order.updated_at_ns = now_ns;
        let order_id = order.order_id.clone();
        self.active_ids.push(order_id.clone());
        self.orders.insert(order_id.clone(), order);
        Ok(order_id)
    }

    /// Cancels an active order. Terminal orders cannot be cancelled.
    pub fn cancel(&mut self, order_id: &SmolStr, now_ns: i64) -> bool {
        let Some(order) = self.orders.get_mut(order_id) else {
            return false;
        };
        order.cancel(now_ns);
        self.active_ids.retain(|id| id != order_id);
        true
    }

    /// Attempts to fill an active order, clipping the quantity to what
    /// remains. Returns `None` for unknown or inactive orders.
    pub fn try_fill(
        &mut self,
        order_id: &SmolStr,
        fill_price: Decimal,
        fill_qty: Decimal,
        fees_usd: Decimal,
        tx_signature: SmolStr,
        now_ns: i64,
    ) -> Option<Fill> {
        let order = self.orders.get_mut(order_id)?;
        if !order.is_active() {
            return None;
        }
        let quantity = fill_qty.min(order.remaining_quantity());
        if quantity <= Decimal::ZERO {
            return None;
        }
        let fill = order.record_fill(fill_price, quantity, fees_usd, tx_signature, now_ns);
        if !order.is_active() {
            self.active_ids.retain(|id| id != order_id);
        }
        Some(fill)
    }

    /// Expires active GTD orders whose deadline has passed. Returns the
    /// number of orders expired.
    pub fn expire_due(&mut self, now_ns: i64) -> usize {
        let due: Vec<SmolStr> = self
            .active_ids
            .iter()
            .filter(|id| {
                self.orders.get(*id).is_some_and(|order| {
                    order.time_in_force == TimeInForce::Gtd
                        && order.expire_at_ns > 0
                        && now_ns >= order.expire_at_ns
                })
            })
            .cloned()
            .collect();
        for id in &due {
            if let Some(order) = self.orders.get_mut(id) {
                order.expire(now_ns);
            }
            self.active_ids.retain(|active| active != id);
        }
        due.len()
    }

    pub fn get(&self, order_id: &SmolStr) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Active order ids in submission order.
    pub fn active_ids(&self) -> &[SmolStr] {
        &self.active_ids
    }

    /// All orders that can still receive fills, in submission order.
    pub fn active_orders(&self) -> Vec<&Order> {
        self.active_ids
            .iter()
            .filter_map(|id| self.orders.get(id))
            .collect()
    }

    pub fn all_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.values()
    }

    /// Cancels every active order, returning how many were cancelled.
    pub fn cancel_all(&mut self, now_ns: i64) -> usize {
        let ids: Vec<SmolStr> = self.active_ids.clone();
        for id in &ids {
            self.cancel(id, now_ns);
        }
        ids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use martim_core::Side;
    use rust_decimal_macros::dec;

    fn market(qty: Decimal) -> Order {
        Order::market(SmolStr::new("MINT"), Side::Buy, qty)
    }

    #[test]
    fn test_submit_and_fill_lifecycle() {
        let mut book = OrderBook::new();
        let id = book.submit(market(dec!(10)), 100).unwrap();
        assert_eq!(book.get(&id).unwrap().status, OrderStatus::Submitted);
        assert_eq!(book.get(&id).unwrap().created_at_ns, 100);
        assert_eq!(book.active_orders().len(), 1);

        let fill = book
            .try_fill(&id, dec!(1.5), dec!(4), Decimal::ZERO, SmolStr::default(), 200)
            .unwrap();
        assert_eq!(fill.quantity, dec!(4));
        assert_eq!(book.get(&id).unwrap().status, OrderStatus::PartiallyFilled);

        // over-ask gets clipped to remaining
        let fill = book
            .try_fill(&id, dec!(1.5), dec!(100), Decimal::ZERO, SmolStr::default(), 300)
            .unwrap();
        assert_eq!(fill.quantity, dec!(6));
        assert_eq!(book.get(&id).unwrap().status, OrderStatus::Filled);
        assert!(book.active_orders().is_empty());

        // filled orders accept nothing further
        assert!(book
            .try_fill(&id, dec!(1.5), dec!(1), Decimal::ZERO, SmolStr::default(), 400)
            .is_none());
    }

    #[test]
    fn test_invalid_order_is_rejected() {
        let mut book = OrderBook::new();
        let err = book.submit(market(Decimal::ZERO), 1).unwrap_err();
        assert_eq!(err.errors, vec!["quantity must be > 0"]);
        assert!(book.active_orders().is_empty());
    }

    #[test]
    fn test_cancel_semantics() {
        let mut book = OrderBook::new();
        let id = book.submit(market(dec!(1)), 1).unwrap();
        assert!(book.cancel(&id, 2));
        assert_eq!(book.get(&id).unwrap().status, OrderStatus::Cancelled);
        assert!(!book.cancel(&SmolStr::new("missing"), 3));

        // cancelled order cannot be filled
        assert!(book
            .try_fill(&id, dec!(1), dec!(1), Decimal::ZERO, SmolStr::default(), 4)
            .is_none());
    }

    #[test]
    fn test_cancel_all() {
        let mut book = OrderBook::new();
        book.submit(market(dec!(1)), 1).unwrap();
        book.submit(market(dec!(2)), 1).unwrap();
        assert_eq!(book.cancel_all(2), 2);
        assert!(book.active_orders().is_empty());
    }

    #[test]
    fn test_gtd_expiry() {
        let mut book = OrderBook::new();
        let id = book
            .submit(
                market(dec!(1)).with_time_in_force(TimeInForce::Gtd, 1_000),
                1,
            )
            .unwrap();
        assert_eq!(book.expire_due(999), 0);
        assert_eq!(book.expire_due(1_000), 1);
        assert_eq!(book.get(&id).unwrap().status, OrderStatus::Expired);
    }
}
