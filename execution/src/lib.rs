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
//! # ⚡ Execution - Order Execution Module
//!
//! Order model, in-memory book, fill simulation and paper execution for the
//! Martim engine.
//!
//! ## 🎯 Main Features
//!
//! * **Order model**: market / limit / stop / trailing-stop orders with
//!   time-in-force semantics, validation and VWAP fill tracking
//! * **Fill simulator**: matches active orders against a price stream with
//!   slippage and fees, for backtests and paper fills
//! * **Paper adapter**: last-observed-price ledger implementing the same
//!   [`ExecutionAdapter`](martim_core::adapter::ExecutionAdapter) contract
//!   live adapters implement
//! * **Venue math**: PumpSwap constant-product quoting and pool decoding
//!
//! Wire-level venue clients (HTTP, websockets, transaction signing) live
//! outside this workspace and plug in through the adapter contract.

/// In-memory order book (submit, cancel, fill, expire).
pub mod book;

/// Order type system: orders, fills, validation, status machine.
pub mod order;

/// Paper trading adapter.
pub mod paper;

/// Bounded exponential backoff for transient venue failures.
pub mod retry;

/// Fill simulation against a price stream.
pub mod sim;

/// Venue-specific math and account layouts.
pub mod venue;

pub use book::OrderBook;
pub use order::{Fill, Order, OrderStatus, OrderType, TimeInForce};
pub use paper::PaperAdapter;
pub use sim::FillSimulator;
