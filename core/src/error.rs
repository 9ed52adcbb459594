//! Central error type aggregating failures from the engine's subsystems.

use crate::adapter::{AdapterError, FeedError};
use thiserror::Error;

/// Top-level error of the Martim core.
#[derive(Debug, Clone, Error)]
pub enum MartimError {
    /// Engine construction was given an unrecognised execution mode.
    #[error("invalid engine mode: {0}")]
    InvalidMode(String),

    /// Execution adapter failure (orders, balances, connectivity).
    #[error("adapter: {0}")]
    Adapter(#[from] AdapterError),

    /// Market data feed failure (streaming, parsing, replay input).
    #[error("feed: {0}")]
    Feed(#[from] FeedError),

    /// Backtest replay failure.
    #[error("backtest: {0}")]
    Backtest(String),

    /// Telemetry sink I/O failure.
    #[error("telemetry: {0}")]
    Telemetry(String),
}
