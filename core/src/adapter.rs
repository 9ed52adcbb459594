//! Interfaces shared by execution adapters and market data feeds.
//!
//! The split between execution adapters (submit orders) and data feeds
//! (stream events) is deliberate: a deployment may stream from one venue and
//! execute on another. Wire-level clients implement these traits outside of
//! this workspace.

use crate::{
    bus::EventBus,
    event::{Event, EventPayload, OrderIntent},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::rc::Rc;
use thiserror::Error;

/// Failure taxonomy of [`ExecutionAdapter::submit_order`].
#[derive(Debug, Clone, Eq, PartialEq, Error, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdapterError {
    #[error("insufficient balance: {0}")]
    InsufficientBalance(SmolStr),
    #[error("unknown token: {0}")]
    UnknownToken(SmolStr),
    #[error("quote failed: {0}")]
    QuoteFailed(SmolStr),
    #[error("submit failed: {0}")]
    SubmitFailed(SmolStr),
    #[error("pool missing for {0}")]
    PoolMissing(SmolStr),
    #[error("adapter not connected")]
    NotConnected,
}

/// Failure taxonomy of [`MarketFeed`] operations and replay input loading.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FeedError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),
    #[error("feed not connected")]
    NotConnected,
    #[error("bad record: {0}")]
    BadRecord(String),
    #[error("io: {0}")]
    Io(String),
}

/// Submits and manages orders on a venue.
///
/// Adapters install an `order-submitted` subscription during `connect`,
/// publish `adapter-connected`, and translate accepted intents into venue
/// actions, reporting outcomes as fill/reject events.
#[async_trait(?Send)]
pub trait ExecutionAdapter {
    fn name(&self) -> SmolStr;

    async fn connect(&self, bus: Rc<EventBus>) -> Result<(), AdapterError>;

    /// Idempotent: disconnecting an unconnected adapter is a no-op.
    async fn disconnect(&self) -> Result<(), AdapterError>;

    /// Executes an order intent, returning the venue's external identifier
    /// (transaction signature or order id).
    async fn submit_order(&self, intent: &OrderIntent) -> Result<SmolStr, AdapterError>;

    fn is_connected(&self) -> bool;
}

/// Streams market data into the event bus.
///
/// Feeds produce `price-update`, `trade` and `signal` events.
#[async_trait(?Send)]
pub trait MarketFeed {
    fn name(&self) -> SmolStr;

    async fn connect(&self, bus: Rc<EventBus>) -> Result<(), FeedError>;

    async fn disconnect(&self) -> Result<(), FeedError>;

    fn is_connected(&self) -> bool;
}

/// The contract the backtest runner needs from a simulated execution ledger:
/// synchronous wiring, price seeding and balance observation.
pub trait PaperExecution {
    /// Installs the price-tracking and order-fill subscriptions. Synchronous
    /// counterpart of `connect` for use inside the replay loop.
    fn attach(&self, bus: &Rc<EventBus>);

    /// Seeds the last-observed price for a token so the first fill after a
    /// graduation happens at the recorded initial price.
    fn seed_price(&self, token: SmolStr, price_usd: Decimal);

    fn balance_usd(&self) -> Decimal;

    /// Realized plus unrealized P&L.
    fn pnl(&self) -> Decimal;

    fn fill_count(&self) -> u64;
}

/// Publishes the standard `adapter-connected` event for an adapter or feed.
pub fn announce_connected(bus: &EventBus, name: SmolStr, timestamp_ns: i64) {
    bus.publish(Event::new(
        EventPayload::AdapterConnected { name },
        timestamp_ns,
        SmolStr::new_static("adapter"),
    ));
}

/// Publishes the standard `adapter-disconnected` event.
pub fn announce_disconnected(bus: &EventBus, name: SmolStr, timestamp_ns: i64) {
    bus.publish(Event::new(
        EventPayload::AdapterDisconnected { name },
        timestamp_ns,
        SmolStr::new_static("adapter"),
    ));
}
