//! "martim" facade crate
//!
//! Provides a single entry point that re-exports the main modules of the
//! Martim ecosystem. Useful for users who prefer to depend on just one
//! crate.
//!
//! # Example
//! ```rust
//! use martim::core::EngineMode;
//! let mode: EngineMode = "paper".parse().unwrap();
//! assert_eq!(mode, EngineMode::Paper);
//! ```

// Re-export of internal crates with organized namespaces
pub use martim_analytics as analytics;
pub use martim_core as core;
pub use martim_execution as execution;
pub use martim_risk as risk;
pub use martim_strategies as strategies;

// Flat (shallow) re-export of very frequently used symbols
pub use martim_core::{Engine, EngineMode, Event, EventBus, EventKind, Side};

// Optional prelude for single import
pub mod prelude {
    pub use crate::core::{
        backtest::BacktestRunner, Engine, EngineMode, Event, EventBus, EventKind, Side, Strategy,
        StrategyCtx,
    };
    pub use crate::execution::{paper::PaperAdapter, Order, OrderBook};
    pub use crate::risk::{DrawdownCircuitBreaker, PortfolioLimits, PositionSizer, RiskGate};
    pub use crate::strategies::{GraduationSniper, SniperConfig};
}
