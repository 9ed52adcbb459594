use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

/// Annualised Sortino Ratio over a series of periodic returns.
///
/// Like the Sharpe Ratio but penalising only downside deviation: the
/// denominator is the root of the average squared *negative* excess return,
/// so upside volatility does not reduce the score.
///
/// Reference: <https://www.investopedia.com/terms/s/sortinoratio.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct SortinoRatio {
    pub value: Decimal,
}

impl SortinoRatio {
    /// Calculates the annualised [`SortinoRatio`].
    ///
    /// Returns `None` with fewer than two returns or zero downside deviation.
    pub fn calculate(
        returns: &[Decimal],
        risk_free_per_period: Decimal,
        periods_per_year: u32,
    ) -> Option<Self> {
        if returns.len() < 2 {
            return None;
        }
        let n = Decimal::from(returns.len());
        let excess: Vec<Decimal> = returns.iter().map(|r| *r - risk_free_per_period).collect();
        let mean = excess.iter().sum::<Decimal>() / n;

        let downside_sq = excess
            .iter()
            .map(|r| {
                let d = r.min(&Decimal::ZERO);
                *d * *d
            })
            .sum::<Decimal>()
            / (n - Decimal::ONE);
        let downside_dev = downside_sq.sqrt()?;
        if downside_dev.is_zero() {
            return None;
        }

        let annualisation = Decimal::from(periods_per_year).sqrt()?;
        let value = mean.checked_div(downside_dev)?.checked_mul(annualisation)?;
        Some(Self { value })
    }
}
