// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Peak-to-trough drawdown analysis over an equity curve.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Maximum drawdown of an equity curve, as a positive fraction of the peak,
/// with the indices of the peak and the trough that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct MaxDrawdown {
    pub value: Decimal,
    pub peak_index: usize,
    pub trough_index: usize,
}

impl MaxDrawdown {
    /// Scans the curve once, tracking the running peak.
    ///
    /// A curve with fewer than two points has zero drawdown.
    pub fn calculate(equity_curve: &[Decimal]) -> Self {
        if equity_curve.len() < 2 {
            return Self::default();
        }

        let mut peak = equity_curve[0];
        let mut peak_idx = 0;
        let mut max = Self::default();

        for (i, value) in equity_curve.iter().enumerate() {
            if *value > peak {
                peak = *value;
                peak_idx = i;
            }
            let dd = if peak > Decimal::ZERO {
                (peak - *value) / peak
            } else {
                Decimal::ZERO
            };
            if dd > max.value {
                max = Self {
                    value: dd,
                    peak_index: peak_idx,
                    trough_index: i,
                };
            }
        }

        max
    }
}

/// Longest contiguous run of periods spent below a prior equity peak.
pub fn drawdown_duration(equity_curve: &[Decimal]) -> usize {
    if equity_curve.len() < 2 {
        return 0;
    }
    let mut peak = equity_curve[0];
    let mut current = 0;
    let mut longest = 0;
    for value in equity_curve {
        if *value >= peak {
            peak = *value;
            current = 0;
        } else {
            current += 1;
            longest = longest.max(current);
        }
    }
    longest
}

/// Recovery factor: total return divided by the maximum drawdown, both in
/// account currency.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct RecoveryFactor {
    pub value: Decimal,
}

impl RecoveryFactor {
    /// Returns `None` when the drawdown magnitude is not positive.
    pub fn calculate(total_return: Decimal, max_drawdown_abs: Decimal) -> Option<Self> {
        if max_drawdown_abs <= Decimal::ZERO {
            return None;
        }
        let value = total_return.checked_div(max_drawdown_abs)?;
        Some(Self { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_max_drawdown_simple_curve() {
        let curve = vec![dec!(100), dec!(110), dec!(95), dec!(120), dec!(90)];
        let dd = MaxDrawdown::calculate(&curve);

        // 120 -> 90 is the worst decline: 25%
        assert_eq!(dd.value, dec!(0.25));
        assert_eq!(dd.peak_index, 3);
        assert_eq!(dd.trough_index, 4);
    }

    #[test]
    fn test_max_drawdown_monotone_curve_is_zero() {
        let curve = vec![dec!(100), dec!(105), dec!(110)];
        assert_eq!(MaxDrawdown::calculate(&curve), MaxDrawdown::default());
    }

    #[test]
    fn test_max_drawdown_short_curve() {
        assert_eq!(MaxDrawdown::calculate(&[dec!(100)]), MaxDrawdown::default());
    }

    #[test]
    fn test_drawdown_duration() {
        // below the 110 peak for 3 periods, then a new peak resets the run
        let curve = vec![dec!(100), dec!(110), dec!(105), dec!(102), dec!(108), dec!(115)];
        assert_eq!(drawdown_duration(&curve), 3);

        let flat = vec![dec!(100), dec!(100), dec!(100)];
        assert_eq!(drawdown_duration(&flat), 0);
    }

    #[test]
    fn test_recovery_factor() {
        assert_eq!(
            RecoveryFactor::calculate(dec!(500), dec!(250)).unwrap().value,
            dec!(2)
        );
        assert_eq!(RecoveryFactor::calculate(dec!(500), Decimal::ZERO), None);
    }
}
