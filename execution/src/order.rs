// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Order type system.
//!
//! A rich order model with multiple order types, time-in-force semantics,
//! status tracking and fill recording. The model itself is clock-free:
//! every mutation takes the caller's timestamp, so the same code is exact
//! under replay.

use martim_core::Side;
use rand::RngCore;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use thiserror::Error;

/// Supported order types.
///
/// `StopLimit`, `Twap` and `Iceberg` are accepted and validated but the fill
/// simulator does not match them yet.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Execute immediately at best available price.
    #[default]
    Market,
    /// Execute at the specified price or better.
    Limit,
    /// Trigger a market order when the stop price is reached.
    Stop,
    /// Trigger a limit order when the stop price is reached.
    StopLimit,
    /// Stop that trails the market by a fractional offset.
    TrailingStop,
    /// Time-weighted average price, split into slices over time.
    Twap,
    /// Show only a portion of the total size at a time.
    Iceberg,
}

/// Lifecycle states of an order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Submitted,
    Accepted,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Cancelled | Self::Rejected | Self::Expired
        )
    }
}

/// How long an order remains active.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeInForce {
    /// Good-til-cancelled.
    #[default]
    Gtc,
    /// Immediate-or-cancel.
    Ioc,
    /// Fill-or-kill.
    Fok,
    /// Good-til-date, expires at `expire_at_ns`.
    Gtd,
}

/// Record of a partial or complete fill. Append-only.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Fill {
    pub fill_id: SmolStr,
    pub order_id: SmolStr,
    pub price: Decimal,
    pub quantity: Decimal,
    pub timestamp_ns: i64,
    pub fees_usd: Decimal,
    pub tx_signature: SmolStr,
}

/// Validation failure: the offending order is marked `Rejected` and not
/// admitted to the book.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("order validation failed: {}", errors.join("; "))]
pub struct ValidationErrors {
    pub errors: Vec<String>,
}

fn generate_hex_id(len_bytes: usize) -> SmolStr {
    let mut bytes = vec![0u8; len_bytes];
    rand::rng().fill_bytes(&mut bytes);
    SmolStr::new(hex::encode(bytes))
}

/// A trading order with full lifecycle tracking.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Order {
    /// Unique 16-hex identifier.
    pub order_id: SmolStr,
    pub token: SmolStr,
    pub side: Side,
    pub order_type: OrderType,
    pub quantity: Decimal,
    pub limit_price: Option<Decimal>,
    pub stop_price: Option<Decimal>,
    /// Trailing offset as a fraction in (0, 1); 0.05 = 5%.
    pub trail_offset_pct: Decimal,
    pub time_in_force: TimeInForce,
    pub expire_at_ns: i64,
    pub slippage_bps: u32,
    pub twap_slices: u32,
    pub twap_interval_s: u64,
    pub iceberg_show_qty: Decimal,
    pub status: OrderStatus,
    pub filled_quantity: Decimal,
    /// Volume-weighted average fill price, recomputed on each fill.
    pub avg_fill_price: Decimal,
    pub fills: Vec<Fill>,
    pub created_at_ns: i64,
    pub updated_at_ns: i64,
    pub strategy: SmolStr,
}

impl Order {
    fn base(token: SmolStr, side: Side, order_type: OrderType, quantity: Decimal) -> Self {
        Self {
            order_id: generate_hex_id(8),
            token,
            side,
            order_type,
            quantity,
            limit_price: None,
            stop_price: None,
            trail_offset_pct: Decimal::new(5, 2),
            time_in_force: TimeInForce::Gtc,
            expire_at_ns: 0,
            slippage_bps: 50,
            twap_slices: 5,
            twap_interval_s: 60,
            iceberg_show_qty: Decimal::ZERO,
            status: OrderStatus::Pending,
            filled_quantity: Decimal::ZERO,
            avg_fill_price: Decimal::ZERO,
            fills: Vec::new(),
            created_at_ns: 0,
            updated_at_ns: 0,
            strategy: SmolStr::default(),
        }
    }

    pub fn market(token: SmolStr, side: Side, quantity: Decimal) -> Self {
        Self::base(token, side, OrderType::Market, quantity)
    }

    pub fn limit(token: SmolStr, side: Side, quantity: Decimal, limit_price: Decimal) -> Self {
        let mut order = Self::base(token, side, OrderType::Limit, quantity);
        order.limit_price = Some(limit_price);
        order
    }

    pub fn stop(token: SmolStr, side: Side, quantity: Decimal, stop_price: Decimal) -> Self {
        let mut order = Self::base(token, side, OrderType::Stop, quantity);
        order.stop_price = Some(stop_price);
        order
    }

    pub fn trailing_stop(
        token: SmolStr,
        side: Side,
        quantity: Decimal,
        trail_offset_pct: Decimal,
    ) -> Self {
        let mut order = Self::base(token, side, OrderType::TrailingStop, quantity);
        order.trail_offset_pct = trail_offset_pct;
        order
    }

    pub fn with_slippage(mut self, slippage_bps: u32) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    pub fn with_time_in_force(mut self, tif: TimeInForce, expire_at_ns: i64) -> Self {
        self.time_in_force = tif;
        self.expire_at_ns = expire_at_ns;
        self
    }

    pub fn with_strategy(mut self, strategy: SmolStr) -> Self {
        self.strategy = strategy;
        self
    }

    /// Whether this order can still receive fills.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Pending
                | OrderStatus::Submitted
                | OrderStatus::Accepted
                | OrderStatus::PartiallyFilled
        )
    }

    pub fn remaining_quantity(&self) -> Decimal {
        (self.quantity - self.filled_quantity).max(Decimal::ZERO)
    }

    /// Records a fill: updates the filled quantity, recomputes the VWAP and
    /// advances the status.
    pub fn record_fill(
        &mut self,
        price: Decimal,
        quantity: Decimal,
        fees_usd: Decimal,
        tx_signature: SmolStr,
        now_ns: i64,
    ) -> Fill {
        let fill = Fill {
            fill_id: generate_hex_id(6),
            order_id: self.order_id.clone(),
            price,
            quantity,
            timestamp_ns: now_ns,
            fees_usd,
            tx_signature,
        };

        let prev_notional = self.avg_fill_price * self.filled_quantity;
        self.filled_quantity += quantity;
        if self.filled_quantity > Decimal::ZERO {
            self.avg_fill_price = (prev_notional + price * quantity) / self.filled_quantity;
        }

        self.fills.push(fill.clone());
        self.updated_at_ns = now_ns;
        self.status = if self.filled_quantity >= self.quantity {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };

        fill
    }

    /// Cancels the order if it is still active.
    pub fn cancel(&mut self, now_ns: i64) {
        if self.is_active() {
            self.status = OrderStatus::Cancelled;
            self.updated_at_ns = now_ns;
        }
    }

    /// Expires the order if it is still active.
    pub fn expire(&mut self, now_ns: i64) {
        if self.is_active() {
            self.status = OrderStatus::Expired;
            self.updated_at_ns = now_ns;
        }
    }

    /// Validates the order fields; the list is empty when valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.quantity <= Decimal::ZERO {
            errors.push("quantity must be > 0".to_owned());
        }
        if self.token.is_empty() {
            errors.push("token is required".to_owned());
        }
        if matches!(self.order_type, OrderType::Limit | OrderType::StopLimit)
            && self.limit_price.is_none_or(|p| p <= Decimal::ZERO)
        {
            errors.push(format!("{:?} requires a positive limit_price", self.order_type));
        }
        if matches!(self.order_type, OrderType::Stop | OrderType::StopLimit)
            && self.stop_price.is_none_or(|p| p <= Decimal::ZERO)
        {
            errors.push(format!("{:?} requires a positive stop_price", self.order_type));
        }
        if self.order_type == OrderType::TrailingStop
            && (self.trail_offset_pct <= Decimal::ZERO || self.trail_offset_pct >= Decimal::ONE)
        {
            errors.push("trail_offset_pct must be between 0 and 1".to_owned());
        }
        if self.time_in_force == TimeInForce::Gtd && self.expire_at_ns <= 0 {
            errors.push("GTD orders require a positive expire_at_ns".to_owned());
        }
        if self.order_type == OrderType::Iceberg
            && (self.iceberg_show_qty <= Decimal::ZERO || self.iceberg_show_qty >= self.quantity)
        {
            errors.push("iceberg_show_qty must be > 0 and < quantity".to_owned());
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ids_are_hex_of_expected_length() {
        let order = Order::market(SmolStr::new("SOL"), Side::Buy, dec!(10));
        assert_eq!(order.order_id.len(), 16);
        assert!(order.order_id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_vwap_over_multiple_fills() {
        let mut order = Order::market(SmolStr::new("SOL"), Side::Buy, dec!(10));
        order.record_fill(dec!(100), dec!(4), Decimal::ZERO, SmolStr::default(), 1);
        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.avg_fill_price, dec!(100));

        order.record_fill(dec!(110), dec!(6), Decimal::ZERO, SmolStr::default(), 2);
        assert_eq!(order.status, OrderStatus::Filled);
        // (100*4 + 110*6) / 10 = 106
        assert_eq!(order.avg_fill_price, dec!(106));
        assert_eq!(order.remaining_quantity(), Decimal::ZERO);

        // invariant: avg * filled == sum(price * qty)
        let notional: Decimal = order.fills.iter().map(|f| f.price * f.quantity).sum();
        assert_eq!(order.avg_fill_price * order.filled_quantity, notional);
    }

    #[test]
    fn test_filled_order_is_terminal() {
        let mut order = Order::market(SmolStr::new("SOL"), Side::Sell, dec!(1));
        order.record_fill(dec!(100), dec!(1), Decimal::ZERO, SmolStr::default(), 1);
        assert!(order.status.is_terminal());
        assert!(!order.is_active());

        // cancelling a terminal order must not change its status
        order.cancel(2);
        assert_eq!(order.status, OrderStatus::Filled);
    }

    #[test]
    fn test_validation_rules() {
        let ok = Order::market(SmolStr::new("SOL"), Side::Buy, dec!(1));
        assert!(ok.validate().is_empty());

        let no_qty = Order::market(SmolStr::new("SOL"), Side::Buy, Decimal::ZERO);
        assert_eq!(no_qty.validate(), vec!["quantity must be > 0"]);

        let no_token = Order::market(SmolStr::default(), Side::Buy, dec!(1));
        assert_eq!(no_token.validate(), vec!["token is required"]);

        let mut bad_limit = Order::market(SmolStr::new("SOL"), Side::Buy, dec!(1));
        bad_limit.order_type = OrderType::Limit;
        assert_eq!(bad_limit.validate().len(), 1);

        let mut bad_stop = Order::market(SmolStr::new("SOL"), Side::Sell, dec!(1));
        bad_stop.order_type = OrderType::Stop;
        assert_eq!(bad_stop.validate().len(), 1);

        let bad_trail = Order::trailing_stop(SmolStr::new("SOL"), Side::Sell, dec!(1), dec!(1.5));
        assert_eq!(bad_trail.validate().len(), 1);

        let bad_gtd = Order::market(SmolStr::new("SOL"), Side::Buy, dec!(1))
            .with_time_in_force(TimeInForce::Gtd, 0);
        assert_eq!(bad_gtd.validate().len(), 1);

        let mut bad_iceberg = Order::market(SmolStr::new("SOL"), Side::Buy, dec!(1));
        bad_iceberg.order_type = OrderType::Iceberg;
        bad_iceberg.iceberg_show_qty = dec!(2);
        assert_eq!(bad_iceberg.validate().len(), 1);
    }

    #[test]
    fn test_fill_clipping_is_callers_concern() {
        // record_fill trusts its input; the book clips to remaining first
        let mut order = Order::market(SmolStr::new("SOL"), Side::Buy, dec!(5));
        order.record_fill(dec!(10), dec!(5), Decimal::ZERO, SmolStr::default(), 1);
        assert_eq!(order.filled_quantity, dec!(5));
    }
}
