// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Event taxonomy, the backbone of the event-driven architecture.
//!
//! All market data, order updates and strategy signals flow through the
//! [`EventBus`](crate::bus::EventBus) as one discriminated union with a
//! nanosecond creation timestamp. Events are immutable once constructed;
//! ordering across events is bus dispatch order, never the timestamp.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Payload-free discriminant of an [`Event`], used by the bus for routing.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    // Market data
    PriceUpdate,
    Trade,
    OrderbookUpdate,
    LiquidityUpdate,
    // Order lifecycle
    OrderSubmitted,
    OrderAccepted,
    OrderFilled,
    OrderPartiallyFilled,
    OrderRejected,
    OrderCancelled,
    // Strategy signals (graduation / bonding-progress / dev-activity)
    Signal,
    // System
    EngineStart,
    EngineStop,
    AdapterConnected,
    AdapterDisconnected,
    Heartbeat,
    Error,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PriceUpdate => "price-update",
            Self::Trade => "trade",
            Self::OrderbookUpdate => "orderbook-update",
            Self::LiquidityUpdate => "liquidity-update",
            Self::OrderSubmitted => "order-submitted",
            Self::OrderAccepted => "order-accepted",
            Self::OrderFilled => "order-filled",
            Self::OrderPartiallyFilled => "order-partially-filled",
            Self::OrderRejected => "order-rejected",
            Self::OrderCancelled => "order-cancelled",
            Self::Signal => "signal",
            Self::EngineStart => "engine-start",
            Self::EngineStop => "engine-stop",
            Self::AdapterConnected => "adapter-connected",
            Self::AdapterDisconnected => "adapter-disconnected",
            Self::Heartbeat => "heartbeat",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// Trade direction.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    #[default]
    Buy,
    Sell,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        })
    }
}

/// AMM venue a graduated token migrated to.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PoolKind {
    #[default]
    Pumpswap,
    Raydium,
}

/// Real-time price update for a token.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PriceUpdate {
    pub token: SmolStr,
    pub price_usd: Decimal,
    pub volume_24h: Decimal,
    pub liquidity_usd: Decimal,
}

/// A completed swap observed on a DEX (not necessarily ours).
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct Trade {
    pub token_in: SmolStr,
    pub token_out: SmolStr,
    pub amount_in: Decimal,
    pub amount_out: Decimal,
    pub price: Decimal,
    pub pool: SmolStr,
    pub tx_signature: SmolStr,
}

/// Top-of-book snapshot for venues that expose one.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OrderbookUpdate {
    pub token: SmolStr,
    pub best_bid: Decimal,
    pub best_ask: Decimal,
    pub bid_volume: Decimal,
    pub ask_volume: Decimal,
}

/// Pool liquidity change.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct LiquidityUpdate {
    pub token: SmolStr,
    pub liquidity_usd: Decimal,
}

/// Order intent produced by strategies and consumed by execution adapters.
///
/// Buys are denominated in USD notional (`amount_usd`); sells in token units
/// (`amount`).
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OrderIntent {
    pub side: Side,
    pub token: SmolStr,
    pub amount_usd: Decimal,
    pub amount: Decimal,
    pub slippage_bps: u32,
    pub pool_address: Option<SmolStr>,
    pub strategy: SmolStr,
}

impl OrderIntent {
    pub fn buy(token: SmolStr, amount_usd: Decimal, slippage_bps: u32) -> Self {
        Self {
            side: Side::Buy,
            token,
            amount_usd,
            slippage_bps,
            ..Default::default()
        }
    }

    pub fn sell(token: SmolStr, amount: Decimal, slippage_bps: u32) -> Self {
        Self {
            side: Side::Sell,
            token,
            amount,
            slippage_bps,
            ..Default::default()
        }
    }
}

/// Order state change published by execution adapters.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct OrderUpdate {
    pub order_id: SmolStr,
    pub token: SmolStr,
    pub side: Side,
    pub price: Decimal,
    pub quantity: Decimal,
    pub amount_usd: Decimal,
    pub tx_signature: SmolStr,
    pub reason: SmolStr,
}

/// Emitted when a token graduates from the bonding curve to a DEX pool.
///
/// The enrichment fields (`market_cap_usd` onwards) are zero when unknown;
/// consumers must treat zero as "no signal", never as a measured zero.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct GraduationEvent {
    pub mint: SmolStr,
    pub symbol: SmolStr,
    pub pool_address: SmolStr,
    pub pool_kind: PoolKind,
    pub sol_raised: Decimal,
    pub holder_count: u32,
    pub creator: SmolStr,
    pub initial_price_usd: Decimal,
    pub market_cap_usd: Decimal,
    pub liquidity_usd: Decimal,
    pub buys_1h: u32,
    pub sells_1h: u32,
    /// Price changes are percentages (+15 = +15%).
    pub price_change_5m: Decimal,
    pub price_change_1h: Decimal,
    pub price_change_24h: Decimal,
    /// Share of supply held by the top 10 wallets, in percent.
    pub top10_concentration: Decimal,
    pub dev_holdings_pct: Decimal,
    pub sniper_count: u32,
    pub txns_24h: u32,
}

/// Emitted when a token's bonding curve makes significant progress.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct BondingProgressEvent {
    pub mint: SmolStr,
    pub symbol: SmolStr,
    pub progress_pct: Decimal,
    pub sol_raised: Decimal,
    pub holder_count: u32,
}

/// What the creator wallet did post-graduation.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default, Deserialize, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DevAction {
    #[default]
    Sell,
    Transfer,
    AddLiquidity,
}

/// Emitted when the dev wallet makes a significant move post-graduation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct DevActivityEvent {
    pub mint: SmolStr,
    pub symbol: SmolStr,
    pub action: DevAction,
    /// Share of supply involved, in percent.
    pub amount_pct: Decimal,
}

/// Strategy signals routed under the single `Signal` kind.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalPayload {
    Graduation(GraduationEvent),
    BondingProgress(BondingProgressEvent),
    DevActivity(DevActivityEvent),
}

/// Engine status snapshot carried by heartbeats.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct EngineStatus {
    pub mode: SmolStr,
    pub running: bool,
    pub uptime_ms: i64,
    pub adapters: u32,
    pub feeds: u32,
    pub strategies: u32,
    pub events_processed: u64,
    pub handler_errors: u64,
}

/// A handler failure surfaced on the bus.
#[derive(Debug, Clone, Eq, PartialEq, Default, Deserialize, Serialize)]
pub struct ErrorEvent {
    pub message: String,
    /// Source tag of the event whose handler failed.
    pub origin: SmolStr,
    pub origin_kind: Option<EventKind>,
}

/// Kind-specific payload of an [`Event`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventPayload {
    PriceUpdate(PriceUpdate),
    Trade(Trade),
    OrderbookUpdate(OrderbookUpdate),
    LiquidityUpdate(LiquidityUpdate),
    OrderSubmitted(OrderIntent),
    OrderAccepted(OrderUpdate),
    OrderFilled(OrderUpdate),
    OrderPartiallyFilled(OrderUpdate),
    OrderRejected(OrderUpdate),
    OrderCancelled(OrderUpdate),
    Signal(SignalPayload),
    EngineStart { mode: SmolStr },
    EngineStop,
    AdapterConnected { name: SmolStr },
    AdapterDisconnected { name: SmolStr },
    Heartbeat(EngineStatus),
    Error(ErrorEvent),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::PriceUpdate(_) => EventKind::PriceUpdate,
            Self::Trade(_) => EventKind::Trade,
            Self::OrderbookUpdate(_) => EventKind::OrderbookUpdate,
            Self::LiquidityUpdate(_) => EventKind::LiquidityUpdate,
            Self::OrderSubmitted(_) => EventKind::OrderSubmitted,
            Self::OrderAccepted(_) => EventKind::OrderAccepted,
            Self::OrderFilled(_) => EventKind::OrderFilled,
            Self::OrderPartiallyFilled(_) => EventKind::OrderPartiallyFilled,
            Self::OrderRejected(_) => EventKind::OrderRejected,
            Self::OrderCancelled(_) => EventKind::OrderCancelled,
            Self::Signal(_) => EventKind::Signal,
            Self::EngineStart { .. } => EventKind::EngineStart,
            Self::EngineStop => EventKind::EngineStop,
            Self::AdapterConnected { .. } => EventKind::AdapterConnected,
            Self::AdapterDisconnected { .. } => EventKind::AdapterDisconnected,
            Self::Heartbeat(_) => EventKind::Heartbeat,
            Self::Error(_) => EventKind::Error,
        }
    }
}

/// An immutable event with its creation timestamp and source tag.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Event {
    payload: EventPayload,
    timestamp_ns: i64,
    source: SmolStr,
}

impl Event {
    pub fn new(payload: EventPayload, timestamp_ns: i64, source: SmolStr) -> Self {
        Self {
            payload,
            timestamp_ns,
            source,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn timestamp_ns(&self) -> i64 {
        self.timestamp_ns
    }

    pub fn timestamp_ms(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000.0
    }

    pub fn timestamp_s(&self) -> f64 {
        self.timestamp_ns as f64 / 1_000_000_000.0
    }

    pub fn source(&self) -> &SmolStr {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_payload_kind_mapping() {
        let update = PriceUpdate {
            token: SmolStr::new("SOL"),
            price_usd: dec!(148.50),
            ..Default::default()
        };
        let event = Event::new(
            EventPayload::PriceUpdate(update),
            1_000_000_000,
            SmolStr::new("test"),
        );

        assert_eq!(event.kind(), EventKind::PriceUpdate);
        assert_eq!(event.timestamp_ms(), 1000.0);
        assert_eq!(event.timestamp_s(), 1.0);
    }

    #[test]
    fn test_signal_routes_under_one_kind() {
        let grad = Event::new(
            EventPayload::Signal(SignalPayload::Graduation(GraduationEvent::default())),
            0,
            SmolStr::new("test"),
        );
        let dev = Event::new(
            EventPayload::Signal(SignalPayload::DevActivity(DevActivityEvent::default())),
            0,
            SmolStr::new("test"),
        );

        assert_eq!(grad.kind(), EventKind::Signal);
        assert_eq!(dev.kind(), EventKind::Signal);
    }

    #[test]
    fn test_kind_display_is_kebab_case() {
        assert_eq!(EventKind::OrderPartiallyFilled.to_string(), "order-partially-filled");
        assert_eq!(EventKind::EngineStart.to_string(), "engine-start");
    }

    #[test]
    fn test_event_serde_round_trip() {
        let event = Event::new(
            EventPayload::OrderSubmitted(OrderIntent::buy(SmolStr::new("MINT"), dec!(50), 300)),
            42,
            SmolStr::new("sniper"),
        );
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
