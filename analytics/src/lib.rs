// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
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
//! # 📊 Analytics - Performance Analysis Module
//!
//! Quantitative analysis tools for the Martim trading engine: performance
//! ratios, drawdown analysis, rolling statistics and a trade journal that
//! matches fills into round trips.
//!
//! ## 🎯 Main Features
//!
//! - **Financial Metrics**: Sharpe, Sortino, Calmar, Win Rate, Profit Factor
//! - **Drawdown Analysis**: Maximum drawdown, duration, recovery factor
//! - **Trade Journal**: FIFO round-trip matching with an equity curve
//! - **Summaries**: `TradingSummary` with a printable tear-sheet table
//!
//! Every monetary value and ratio is a [`rust_decimal::Decimal`] so that a
//! backtest run is reproducible bit-for-bit.

/// Rolling statistical algorithms (windowed mean / variance / deviation).
pub mod algorithm;

/// Fill log, FIFO round-trip matching and the equity curve.
pub mod journal;

/// Financial metrics, one struct per metric.
///
/// eg/ `SharpeRatio`, `SortinoRatio`, `ProfitFactor`, `MaxDrawdown`.
pub mod metric;

/// Aggregated performance reports.
///
/// eg/ `TradingSummary`, win/loss `Streaks`.
pub mod summary;

pub use journal::{RoundTrip, TradeJournal, TradeRecord, TradeSide};
pub use summary::TradingSummary;
