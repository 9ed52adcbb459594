use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Representa a taxa de acerto (win rate) entre 0 e 1, calculada como
/// `wins / total`.
///
/// Retorna `None` se não há trades (total = 0).
///
/// Referência: <https://www.investopedia.com/terms/w/win-loss-ratio.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct WinRate {
    pub value: Decimal,
}

impl WinRate {
    /// Calcula o [`WinRate`] a partir do número de vitórias e total de trades.
    pub fn calculate(wins: usize, total: usize) -> Option<Self> {
        if total == 0 {
            None
        } else {
            let value = Decimal::from(wins).checked_div(Decimal::from(total))?;
            Some(Self { value })
        }
    }
}
