// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ProfitFactor divide o valor absoluto dos lucros brutos pelo valor absoluto
/// das perdas brutas. Valor > 1 indica estratégia lucrativa.
///
/// Casos especiais:
/// - Retorna `None` quando lucros e perdas são zero (indefinido)
/// - Retorna `Decimal::MAX` quando há lucros e nenhuma perda
/// - Retorna zero quando há perdas e nenhum lucro
///
/// Referência: <https://www.investopedia.com/articles/fundamental-analysis/10/strategy-performance-reports.asp#toc-profit-factor>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct ProfitFactor {
    pub value: Decimal,
}

impl ProfitFactor {
    /// Calcula o [`ProfitFactor`] a partir dos lucros e perdas brutos.
    pub fn calculate(profits_gross_abs: Decimal, losses_gross_abs: Decimal) -> Option<Self> {
        if profits_gross_abs.is_zero() && losses_gross_abs.is_zero() {
            return None;
        }

        let value = if losses_gross_abs.is_zero() {
            Decimal::MAX
        } else if profits_gross_abs.is_zero() {
            Decimal::ZERO
        } else {
            profits_gross_abs
                .abs()
                .checked_div(losses_gross_abs.abs())?
        };

        Some(Self { value })
    }
}
