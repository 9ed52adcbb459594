//! Portfolio-level limit enforcement.

use fnv::FnvHashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Portfolio risk constraints checked before every entry.
///
/// `check` evaluates the limits in a fixed order and reports the first
/// violation: position count, per-token exposure, total exposure,
/// sector-specific cap, then the correlated-positions cap.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PortfolioLimits {
    pub max_positions: usize,
    /// Maximum fraction of equity a single token may represent.
    pub max_exposure_pct: Decimal,
    /// Maximum fraction of equity deployed across all positions.
    pub max_total_exposure_pct: Decimal,
    /// Maximum positions sharing one sector tag.
    pub max_correlated_positions: usize,
    /// Per-sector position caps, overriding the correlated cap downwards.
    pub sector_limits: FnvHashMap<SmolStr, usize>,
}

impl Default for PortfolioLimits {
    fn default() -> Self {
        Self {
            max_positions: 10,
            max_exposure_pct: Decimal::new(25, 2),
            max_total_exposure_pct: Decimal::new(90, 2),
            max_correlated_positions: 5,
            sector_limits: FnvHashMap::default(),
        }
    }
}

impl PortfolioLimits {
    /// Validates a proposed trade. Returns `Ok(())` or the refusal reason.
    pub fn check(
        &self,
        current_positions: usize,
        token_exposure_pct: Decimal,
        total_exposure_pct: Decimal,
        sector: &str,
        sector_count: usize,
    ) -> Result<(), SmolStr> {
        if current_positions >= self.max_positions {
            return Err(SmolStr::new(format!(
                "max_positions ({}) reached",
                self.max_positions
            )));
        }
        if token_exposure_pct > self.max_exposure_pct {
            return Err(SmolStr::new(format!(
                "token exposure {token_exposure_pct} exceeds limit {}",
                self.max_exposure_pct
            )));
        }
        if total_exposure_pct > self.max_total_exposure_pct {
            return Err(SmolStr::new(format!(
                "total exposure {total_exposure_pct} exceeds limit {}",
                self.max_total_exposure_pct
            )));
        }
        if !sector.is_empty() {
            if let Some(limit) = self.sector_limits.get(sector) {
                if sector_count >= *limit {
                    return Err(SmolStr::new(format!(
                        "sector '{sector}' limit ({limit}) reached"
                    )));
                }
            }
            if sector_count >= self.max_correlated_positions {
                return Err(SmolStr::new(format!(
                    "correlated position limit ({}) reached for sector '{sector}'",
                    self.max_correlated_positions
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_within_limits_passes() {
        let limits = PortfolioLimits::default();
        assert!(limits
            .check(3, dec!(0.10), dec!(0.50), "memecoin", 2)
            .is_ok());
    }

    #[test]
    fn test_max_positions_checked_first() {
        let limits = PortfolioLimits::default();
        // everything else violated too; position count must win
        let reason = limits
            .check(10, dec!(0.99), dec!(0.99), "memecoin", 99)
            .unwrap_err();
        assert!(reason.contains("max_positions"));
    }

    #[test]
    fn test_token_exposure_cap() {
        let limits = PortfolioLimits::default();
        let reason = limits.check(0, dec!(0.30), dec!(0.50), "", 0).unwrap_err();
        assert!(reason.contains("token exposure"));
    }

    #[test]
    fn test_total_exposure_cap() {
        let limits = PortfolioLimits::default();
        let reason = limits.check(0, dec!(0.10), dec!(0.95), "", 0).unwrap_err();
        assert!(reason.contains("total exposure"));
    }

    #[test]
    fn test_sector_specific_limit_beats_correlated_cap() {
        let mut limits = PortfolioLimits::default();
        limits.sector_limits.insert(SmolStr::new("memecoin"), 2);

        let reason = limits
            .check(0, dec!(0.01), dec!(0.10), "memecoin", 2)
            .unwrap_err();
        assert!(reason.contains("sector 'memecoin' limit"));
    }

    #[test]
    fn test_correlated_positions_cap() {
        let limits = PortfolioLimits::default();
        let reason = limits
            .check(0, dec!(0.01), dec!(0.10), "memecoin", 5)
            .unwrap_err();
        assert!(reason.contains("correlated position limit"));
    }

    #[test]
    fn test_empty_sector_skips_sector_checks() {
        let limits = PortfolioLimits::default();
        assert!(limits.check(0, dec!(0.01), dec!(0.10), "", 99).is_ok());
    }
}
