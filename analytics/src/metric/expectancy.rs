use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Expected value per trade in account currency.
///
/// `expectancy = win_rate * avg_win - (1 - win_rate) * avg_loss`, with
/// `avg_loss` supplied as a positive magnitude.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct Expectancy {
    pub value: Decimal,
}

impl Expectancy {
    pub fn calculate(win_rate: Decimal, avg_win: Decimal, avg_loss: Decimal) -> Self {
        let value = win_rate * avg_win - (Decimal::ONE - win_rate) * avg_loss;
        Self { value }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_expectancy_calculate() {
        // 60% winners at +10, 40% losers at -5 => 6 - 2 = 4
        let e = Expectancy::calculate(dec!(0.6), dec!(10), dec!(5));
        assert_eq!(e.value, dec!(4));

        // coin flip with symmetric outcomes is zero expectancy
        let e = Expectancy::calculate(dec!(0.5), dec!(10), dec!(10));
        assert_eq!(e.value, Decimal::ZERO);
    }
}
