// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

/// Representa o Sharpe Ratio anualizado de uma série de retornos periódicos.
///
/// O Sharpe Ratio mede o retorno ajustado ao risco comparando o retorno em
/// excesso (acima da taxa livre de risco) com o desvio padrão amostral dos
/// retornos, escalado por `sqrt(periods_per_year)`.
///
/// Referência: <https://www.investopedia.com/articles/07/sharpe_ratio.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct SharpeRatio {
    pub value: Decimal,
}

impl SharpeRatio {
    /// Calcula o [`SharpeRatio`] anualizado a partir de retornos periódicos.
    ///
    /// Retorna `None` com menos de dois retornos ou desvio padrão nulo.
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
        let variance = excess
            .iter()
            .map(|r| (*r - mean) * (*r - mean))
            .sum::<Decimal>()
            / (n - Decimal::ONE);
        let std_dev = variance.max(Decimal::ZERO).sqrt()?;
        if std_dev.is_zero() {
            return None;
        }

        let annualisation = Decimal::from(periods_per_year).sqrt()?;
        let value = mean.checked_div(std_dev)?.checked_mul(annualisation)?;
        Some(Self { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sharpe_insufficient_data() {
        assert_eq!(SharpeRatio::calculate(&[], Decimal::ZERO, 365), None);
        assert_eq!(SharpeRatio::calculate(&[dec!(0.1)], Decimal::ZERO, 365), None);
    }

    #[test]
    fn test_sharpe_zero_std_dev() {
        let returns = vec![dec!(0.01), dec!(0.01), dec!(0.01)];
        assert_eq!(SharpeRatio::calculate(&returns, Decimal::ZERO, 365), None);
    }

    #[test]
    fn test_sharpe_positive_returns() {
        // mean = 0.02, sample std = 0.01, sqrt(365) ~ 19.1049
        let returns = vec![dec!(0.01), dec!(0.02), dec!(0.03)];
        let sharpe = SharpeRatio::calculate(&returns, Decimal::ZERO, 365).unwrap();
        assert_eq!(sharpe.value.round_dp(4), dec!(38.2099));
    }

    #[test]
    fn test_sharpe_risk_free_shifts_mean() {
        let returns = vec![dec!(0.01), dec!(0.02), dec!(0.03)];
        let with_rf = SharpeRatio::calculate(&returns, dec!(0.02), 365).unwrap();
        // excess mean is zero once the risk-free rate equals the mean return
        assert_eq!(with_rf.value, Decimal::ZERO);
    }
}
