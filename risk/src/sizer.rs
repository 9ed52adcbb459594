// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Position sizing algorithms.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Supported sizing algorithms.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizingMethod {
    #[default]
    Fixed,
    PercentEquity,
    Kelly,
    VolatilityScaled,
}

/// Output of a sizing calculation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SizingOutcome {
    /// Dollar amount to allocate, after cap and floor.
    pub amount_usd: Decimal,
    /// Amount before the cap was applied.
    pub raw_amount_usd: Decimal,
    pub method: SizingMethod,
    /// Whether the raw amount was clipped by `max_position_usd`.
    pub capped: bool,
}

/// Computes trade size using one of several algorithms.
///
/// Every algorithm produces a raw amount that is then capped at
/// `max_position_usd` and zeroed when it falls below `min_position_usd`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionSizer {
    pub method: SizingMethod,
    pub fixed_amount_usd: Decimal,
    /// Fraction of equity for percent-equity and vol-scaled sizing.
    pub equity_fraction: Decimal,
    pub kelly_win_rate: Decimal,
    /// Average winning return as a ratio (0.40 = +40%).
    pub kelly_avg_win: Decimal,
    /// Average losing return as a positive ratio.
    pub kelly_avg_loss: Decimal,
    /// Fractional Kelly multiplier; 0.5 (half-Kelly) by default.
    pub kelly_fraction: Decimal,
    /// Target annualised volatility for vol-scaled sizing.
    pub volatility_target: Decimal,
    pub max_position_usd: Decimal,
    pub min_position_usd: Decimal,
}

impl Default for PositionSizer {
    fn default() -> Self {
        Self {
            method: SizingMethod::Fixed,
            fixed_amount_usd: Decimal::from(100),
            equity_fraction: Decimal::new(2, 2),
            kelly_win_rate: Decimal::new(55, 2),
            kelly_avg_win: Decimal::new(40, 2),
            kelly_avg_loss: Decimal::new(20, 2),
            kelly_fraction: Decimal::new(50, 2),
            volatility_target: Decimal::new(20, 2),
            max_position_usd: Decimal::from(1_000),
            min_position_usd: Decimal::from(5),
        }
    }
}

impl PositionSizer {
    pub fn new(method: SizingMethod) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    /// Computes the position size for a new trade.
    ///
    /// `recent_volatility` is only consulted by `VolatilityScaled`; a
    /// non-positive value falls back to fixed sizing.
    pub fn size(&self, equity: Decimal, recent_volatility: Decimal) -> SizingOutcome {
        let raw = match self.method {
            SizingMethod::Fixed => self.fixed_amount_usd,
            SizingMethod::PercentEquity => equity * self.equity_fraction,
            SizingMethod::Kelly => self.kelly(equity),
            SizingMethod::VolatilityScaled => self.vol_scaled(equity, recent_volatility),
        };

        let capped = raw > self.max_position_usd;
        let mut amount = raw.min(self.max_position_usd);
        if amount < self.min_position_usd {
            amount = Decimal::ZERO;
        }

        SizingOutcome {
            amount_usd: amount,
            raw_amount_usd: raw,
            method: self.method,
            capped,
        }
    }

    /// Kelly criterion `f* = W − (1−W)/R`, clamped at zero and scaled by
    /// `kelly_fraction`.
    fn kelly(&self, equity: Decimal) -> Decimal {
        if self.kelly_avg_loss <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let r = self.kelly_avg_win / self.kelly_avg_loss;
        if r <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let kelly_pct = self.kelly_win_rate - (Decimal::ONE - self.kelly_win_rate) / r;
        equity * kelly_pct.max(Decimal::ZERO) * self.kelly_fraction
    }

    /// Scales the allocation so its volatility contribution approximates the
    /// target: `equity · min(target/vol, 1) · fraction`.
    fn vol_scaled(&self, equity: Decimal, volatility: Decimal) -> Decimal {
        if volatility <= Decimal::ZERO {
            return self.fixed_amount_usd;
        }
        let scalar = (self.volatility_target / volatility).min(Decimal::ONE);
        equity * scalar * self.equity_fraction
    }
}
