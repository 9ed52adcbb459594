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
//! # 🛡️ Risk - Risk Management Module
//!
//! Pre-trade validations and capital protection for the Martim engine:
//!
//! - **PositionSizer**: fixed, percent-equity, half-Kelly and
//!   volatility-scaled sizing with a hard cap and dust floor
//! - **PortfolioLimits**: position count, per-token / total exposure and
//!   sector-correlation caps
//! - **DrawdownCircuitBreaker**: halts entries past a drawdown threshold,
//!   re-arms after recovery plus cooldown
//! - **ExposureTracker**: mark-to-market equity and exposure fractions
//! - **RiskGate**: the composition wired into strategy contexts as the
//!   engine's [`OrderGate`](martim_core::strategy::OrderGate)
//!
//! Every check either approves or refuses with a reason; nothing here
//! mutates an order.

/// Drawdown circuit breaker.
pub mod breaker;

/// Real-time exposure tracking.
pub mod exposure;

/// Composed pre-trade gate.
pub mod gate;

/// Portfolio limit checks.
pub mod limits;

/// Position sizing algorithms.
pub mod sizer;

use derive_more::{Constructor, Display, From};
use serde::{Deserialize, Serialize};

pub use breaker::{BreakerState, DrawdownCircuitBreaker};
pub use exposure::{ExposureTracker, PositionRecord};
pub use gate::RiskGate;
pub use limits::PortfolioLimits;
pub use sizer::{PositionSizer, SizingMethod, SizingOutcome};

/// Approved result of a risk check.
#[derive(
    Debug,
    Clone,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Serialize,
    Deserialize,
    Display,
    From,
    Constructor,
)]
pub struct RiskApproved<T>(pub T);

impl<T> RiskApproved<T> {
    /// Extracts the approved item from the wrapper.
    pub fn into_item(self) -> T {
        self.0
    }
}

/// Refused result of a risk check, carrying the reason.
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, Constructor,
)]
pub struct RiskRefused<T> {
    pub item: T,
    pub reason: String,
}

impl<T> RiskRefused<T> {
    pub fn into_item(self) -> T {
        self.item
    }
}
