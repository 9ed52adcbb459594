use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Calmar Ratio: annualised return divided by maximum drawdown.
///
/// Reference: <https://www.investopedia.com/terms/c/calmarratio.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct CalmarRatio {
    pub value: Decimal,
}

impl CalmarRatio {
    /// Calculates the [`CalmarRatio`] from a cumulative return fraction, a
    /// positive max-drawdown fraction and the observation period in years.
    ///
    /// Returns `None` when the drawdown or the period is not positive.
    pub fn calculate(
        total_return: Decimal,
        max_drawdown: Decimal,
        period_years: Decimal,
    ) -> Option<Self> {
        if max_drawdown <= Decimal::ZERO || period_years <= Decimal::ZERO {
            return None;
        }
        let annualised = total_return.checked_div(period_years)?;
        let value = annualised.checked_div(max_drawdown)?;
        Some(Self { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_calmar_calculate() {
        let calmar = CalmarRatio::calculate(dec!(0.30), dec!(0.10), Decimal::ONE).unwrap();
        assert_eq!(calmar.value, dec!(3));

        // two-year window halves the annualised return
        let calmar = CalmarRatio::calculate(dec!(0.30), dec!(0.10), dec!(2)).unwrap();
        assert_eq!(calmar.value, dec!(1.5));
    }

    #[test]
    fn test_calmar_undefined_without_drawdown() {
        assert_eq!(CalmarRatio::calculate(dec!(0.30), Decimal::ZERO, Decimal::ONE), None);
        assert_eq!(CalmarRatio::calculate(dec!(0.30), dec!(0.1), Decimal::ZERO), None);
    }
}
