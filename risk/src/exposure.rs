//! Real-time portfolio exposure tracking.

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Snapshot of a single open position.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PositionRecord {
    pub token: SmolStr,
    pub quantity: Decimal,
    pub entry_price_usd: Decimal,
    pub current_price_usd: Decimal,
    pub sector: SmolStr,
}

/// Tracks open positions and computes the aggregate exposure metrics
/// consumed by [`PortfolioLimits`](crate::limits::PortfolioLimits) and the
/// circuit breaker.
///
/// Invariant: equity = cash + Σ quantity · current_price (mark-to-market).
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureTracker {
    cash_usd: Decimal,
    positions: IndexMap<SmolStr, PositionRecord>,
}

impl ExposureTracker {
    pub fn new(starting_cash_usd: Decimal) -> Self {
        Self {
            cash_usd: starting_cash_usd,
            positions: IndexMap::new(),
        }
    }

    /// Cash plus mark-to-market value of every open position.
    pub fn equity(&self) -> Decimal {
        self.cash_usd
            + self
                .positions
                .values()
                .map(|p| p.quantity * p.current_price_usd)
                .sum::<Decimal>()
    }

    pub fn cash(&self) -> Decimal {
        self.cash_usd
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn position(&self, token: &SmolStr) -> Option<&PositionRecord> {
        self.positions.get(token)
    }

    /// Records a new position or blends into an existing one with a
    /// quantity-weighted average entry price. Cash decreases by the cost.
    pub fn open_position(
        &mut self,
        token: SmolStr,
        quantity: Decimal,
        price_usd: Decimal,
        sector: SmolStr,
    ) {
        self.cash_usd -= quantity * price_usd;
        match self.positions.get_mut(&token) {
            Some(position) => {
                let total_qty = position.quantity + quantity;
                if total_qty > Decimal::ZERO {
                    position.entry_price_usd = (position.entry_price_usd * position.quantity
                        + price_usd * quantity)
                        / total_qty;
                }
                position.quantity = total_qty;
                position.current_price_usd = price_usd;
            }
            None => {
                self.positions.insert(
                    token.clone(),
                    PositionRecord {
                        token,
                        quantity,
                        entry_price_usd: price_usd,
                        current_price_usd: price_usd,
                        sector,
                    },
                );
            }
        }
    }

    /// Closes a position entirely; cash increases by the proceeds. Returns
    /// the realized P&L (zero for unknown tokens).
    pub fn close_position(&mut self, token: &SmolStr, price_usd: Decimal) -> Decimal {
        let Some(position) = self.positions.shift_remove(token) else {
            return Decimal::ZERO;
        };
        let proceeds = position.quantity * price_usd;
        self.cash_usd += proceeds;
        proceeds - position.quantity * position.entry_price_usd
    }

    /// Marks a position to market.
    pub fn update_price(&mut self, token: &SmolStr, price_usd: Decimal) {
        if let Some(position) = self.positions.get_mut(token) {
            position.current_price_usd = price_usd;
        }
    }

    pub fn total_unrealized_pnl(&self) -> Decimal {
        self.positions
            .values()
            .map(|p| p.quantity * (p.current_price_usd - p.entry_price_usd))
            .sum()
    }

    /// Fraction of equity a single token represents.
    pub fn token_exposure_pct(&self, token: &SmolStr) -> Decimal {
        let equity = self.equity();
        let Some(position) = self.positions.get(token) else {
            return Decimal::ZERO;
        };
        if equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        position.quantity * position.current_price_usd / equity
    }

    /// Fraction of equity deployed across all positions.
    pub fn total_exposure_pct(&self) -> Decimal {
        let equity = self.equity();
        if equity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.positions
            .values()
            .map(|p| p.quantity * p.current_price_usd)
            .sum::<Decimal>()
            / equity
    }

    pub fn sector_count(&self, sector: &str) -> usize {
        self.positions
            .values()
            .filter(|p| p.sector == sector)
            .count()
    }

    /// Per-token exposure breakdown as a fraction of equity, in insertion
    /// order.
    pub fn exposure_summary(&self) -> IndexMap<SmolStr, Decimal> {
        let equity = self.equity();
        if equity <= Decimal::ZERO {
            return IndexMap::new();
        }
        self.positions
            .iter()
            .map(|(token, p)| (token.clone(), p.quantity * p.current_price_usd / equity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn mint(s: &str) -> SmolStr {
        SmolStr::new(s)
    }

    #[test]
    fn test_open_position_preserves_equity() {
        let mut tracker = ExposureTracker::new(dec!(10000));
        tracker.open_position(mint("A"), dec!(1000), dec!(2), mint("memecoin"));

        // buying converts cash to position value; equity is unchanged
        assert_eq!(tracker.cash(), dec!(8000));
        assert_eq!(tracker.equity(), dec!(10000));
        assert_eq!(tracker.position_count(), 1);
    }

    #[test]
    fn test_blending_uses_quantity_weighted_entry() {
        let mut tracker = ExposureTracker::new(dec!(10000));
        tracker.open_position(mint("A"), dec!(100), dec!(1), mint("memecoin"));
        tracker.open_position(mint("A"), dec!(300), dec!(2), mint("memecoin"));

        let position = tracker.position(&mint("A")).unwrap();
        assert_eq!(position.quantity, dec!(400));
        // (100*1 + 300*2) / 400 = 1.75
        assert_eq!(position.entry_price_usd, dec!(1.75));
    }

    #[test]
    fn test_close_position_realizes_pnl() {
        let mut tracker = ExposureTracker::new(dec!(10000));
        tracker.open_position(mint("A"), dec!(1000), dec!(2), mint("memecoin"));

        let pnl = tracker.close_position(&mint("A"), dec!(3));
        assert_eq!(pnl, dec!(1000));
        assert_eq!(tracker.cash(), dec!(11000));
        assert_eq!(tracker.position_count(), 0);

        assert_eq!(tracker.close_position(&mint("A"), dec!(3)), Decimal::ZERO);
    }

    #[test]
    fn test_mark_to_market_moves_equity() {
        let mut tracker = ExposureTracker::new(dec!(10000));
        tracker.open_position(mint("A"), dec!(1000), dec!(2), mint("memecoin"));
        tracker.update_price(&mint("A"), dec!(2.5));

        assert_eq!(tracker.total_unrealized_pnl(), dec!(500));
        assert_eq!(tracker.equity(), dec!(10500));
    }

    #[test]
    fn test_exposure_fractions() {
        let mut tracker = ExposureTracker::new(dec!(10000));
        tracker.open_position(mint("A"), dec!(1000), dec!(2), mint("memecoin"));
        tracker.open_position(mint("B"), dec!(500), dec!(1), mint("defi"));

        assert_eq!(tracker.token_exposure_pct(&mint("A")), dec!(0.2));
        assert_eq!(tracker.token_exposure_pct(&mint("B")), dec!(0.05));
        assert_eq!(tracker.total_exposure_pct(), dec!(0.25));
        assert_eq!(tracker.token_exposure_pct(&mint("C")), Decimal::ZERO);

        let summary = tracker.exposure_summary();
        assert_eq!(summary[&mint("A")], dec!(0.2));
    }

    #[test]
    fn test_sector_counts() {
        let mut tracker = ExposureTracker::new(dec!(10000));
        tracker.open_position(mint("A"), dec!(1), dec!(1), mint("memecoin"));
        tracker.open_position(mint("B"), dec!(1), dec!(1), mint("memecoin"));
        tracker.open_position(mint("C"), dec!(1), dec!(1), mint("defi"));

        assert_eq!(tracker.sector_count("memecoin"), 2);
        assert_eq!(tracker.sector_count("defi"), 1);
        assert_eq!(tracker.sector_count("rwa"), 0);
    }
}
