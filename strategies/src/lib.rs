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
//! Concrete strategies for the Martim engine.
//!
//! All of them implement [`martim_core::Strategy`] and are therefore
//! identical in backtest, paper and live modes:
//!
//! - [`graduation_sniper`]: the flagship; multi-factor scoring of token
//!   graduations with a strict exit state machine
//! - [`mean_reversion`]: Bollinger/Z-score reversion with adaptive bands
//! - [`volume_breakout`]: volume-spike detection with confirmation bars
//! - [`composite`]: weighted aggregation of normalised signal sources

/// Weighted multi-signal aggregation.
pub mod composite;

/// Multi-factor graduation sniper.
pub mod graduation_sniper;

/// Bollinger/Z-score mean reversion.
pub mod mean_reversion;

/// Shared building blocks (bounded series).
pub mod shared;

/// Volume-spike breakout detection.
pub mod volume_breakout;

pub use composite::{CompositeConfig, CompositeStrategy, SignalSource};
pub use graduation_sniper::{GraduationSniper, SniperConfig};
pub use mean_reversion::{MeanReversionConfig, MeanReversionStrategy};
pub use volume_breakout::{VolumeBreakoutConfig, VolumeBreakoutStrategy};
