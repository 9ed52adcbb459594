//! Financial metrics and the methods for calculating them.
//!
//! Each metric is a small value struct with a `calculate` constructor so the
//! numerics stay testable in isolation from the journal that feeds them.

pub mod calmar;
pub mod drawdown;
pub mod expectancy;
pub mod profit_factor;
pub mod sharpe;
pub mod sortino;
pub mod win_rate;

pub use calmar::CalmarRatio;
pub use drawdown::{drawdown_duration, MaxDrawdown, RecoveryFactor};
pub use expectancy::Expectancy;
pub use profit_factor::ProfitFactor;
pub use sharpe::SharpeRatio;
pub use sortino::SortinoRatio;
pub use win_rate::WinRate;
