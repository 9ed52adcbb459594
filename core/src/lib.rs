#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]
//! # 🧠 Core - Main Engine of the Martim Framework
//!
//! Event-driven engine for sniping token graduations on Solana DEX venues.
//! The same strategy code runs in live, paper and backtest modes
//! because every causal chain (tick → decision → risk gate → fill → journal)
//! completes synchronously on one bus before the next event is read.
//!
//! ## 🏗️ Architecture
//!
//! ```text
//! Feeds / Replayer
//!        ↓
//!    Event Bus  ←——————————┐
//!        ↓                 │
//!    Strategies → Risk Gate│
//!        ↓                 │
//!    Order Intents         │
//!        ↓                 │
//!    Execution Adapters ———┘  (fills, rejects)
//! ```
//!
//! ## Modules
//!
//! - [`event`]: the tagged event union with nanosecond timestamps
//! - [`bus`]: synchronous pub/sub with depth-first nested dispatch
//! - [`engine`]: lifecycle orchestration (connect, heartbeat, shutdown)
//! - [`backtest`]: deterministic replay of recorded graduations
//! - [`telemetry`]: latency percentiles, counters, JSON-lines export

/// Interfaces shared by execution adapters and market data feeds.
pub mod adapter;

/// Deterministic replay of historical graduations.
pub mod backtest;

/// Typed synchronous publish-subscribe dispatcher.
pub mod bus;

/// Engine time sources (live and simulated).
pub mod clock;

/// Recognized configuration options and their defaults.
pub mod config;

/// Engine lifecycle orchestrator.
pub mod engine;

/// Defines all possible errors in the Martim core.
pub mod error;

/// Immutable event records with nanosecond timestamps.
pub mod event;

/// Provides default Martim tracing initialisers.
pub mod logging;

/// Cooperative shutdown signalling.
pub mod shutdown;

/// Strategy interface and order-intent submission context.
pub mod strategy;

/// Latency percentiles, counters and JSON-lines export.
pub mod telemetry;

pub use bus::{EventBus, HandlerError, HandlerId};
pub use clock::{EngineClock, LiveClock, SimClock};
pub use engine::{Engine, EngineMode};
pub use error::MartimError;
pub use event::{Event, EventKind, EventPayload, Side};
pub use strategy::{Strategy, StrategyCtx};
