// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Drawdown circuit breaker.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Breaker state.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    #[default]
    Active,
    Tripped,
}

/// Construction failure: the recovery threshold must sit below the trip
/// threshold or the breaker could flap on one observation.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("recovery ({recovery}) must be < threshold ({threshold})")]
pub struct BreakerConfigError {
    pub threshold: Decimal,
    pub recovery: Decimal,
}

/// Halts trading when drawdown from peak equity exceeds a threshold.
///
/// Trips when `(peak − equity)/peak ≥ threshold`; resets when drawdown has
/// recovered to `≤ recovery` *and* at least `cooldown_seconds` have elapsed
/// since the trip. Time is supplied by the caller so the breaker behaves
/// identically under replay.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawdownCircuitBreaker {
    threshold: Decimal,
    recovery: Decimal,
    cooldown_seconds: i64,
    state: BreakerState,
    peak_equity: Decimal,
    tripped_at_ns: i64,
    trip_count: u32,
}

impl DrawdownCircuitBreaker {
    pub fn new(
        threshold: Decimal,
        recovery: Decimal,
        cooldown_seconds: i64,
    ) -> Result<Self, BreakerConfigError> {
        if recovery >= threshold {
            return Err(BreakerConfigError {
                threshold,
                recovery,
            });
        }
        Ok(Self {
            threshold,
            recovery,
            cooldown_seconds,
            state: BreakerState::Active,
            peak_equity: Decimal::ZERO,
            tripped_at_ns: 0,
            trip_count: 0,
        })
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn is_tripped(&self) -> bool {
        self.state == BreakerState::Tripped
    }

    pub fn trip_count(&self) -> u32 {
        self.trip_count
    }

    pub fn peak_equity(&self) -> Decimal {
        self.peak_equity
    }

    /// Feeds a new equity observation and returns the updated state.
    pub fn update(&mut self, equity: Decimal, now_ns: i64) -> BreakerState {
        if equity > self.peak_equity {
            self.peak_equity = equity;
        }
        if self.peak_equity <= Decimal::ZERO {
            return self.state;
        }

        let drawdown = (self.peak_equity - equity) / self.peak_equity;
        match self.state {
            BreakerState::Active => {
                if drawdown >= self.threshold {
                    self.state = BreakerState::Tripped;
                    self.tripped_at_ns = now_ns;
                    self.trip_count += 1;
                    tracing::warn!(
                        drawdown = %drawdown,
                        threshold = %self.threshold,
                        "circuit breaker TRIPPED"
                    );
                }
            }
            BreakerState::Tripped => {
                let elapsed_s = (now_ns - self.tripped_at_ns) / 1_000_000_000;
                if drawdown <= self.recovery && elapsed_s >= self.cooldown_seconds {
                    self.state = BreakerState::Active;
                    tracing::info!(
                        drawdown = %drawdown,
                        recovery = %self.recovery,
                        "circuit breaker RESET"
                    );
                }
            }
        }

        self.state
    }

    /// Manual reset: re-arms the breaker and forgets the peak.
    pub fn reset(&mut self) {
        self.state = BreakerState::Active;
        self.peak_equity = Decimal::ZERO;
        tracing::info!("circuit breaker manually reset");
    }
}
