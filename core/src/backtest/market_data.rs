//! Historical graduation records: the backtest input format.
//!
//! A replay input is a JSON array of records, one per graduation, each
//! carrying the price history observed after the pool went live.

use crate::{
    adapter::FeedError,
    event::{GraduationEvent, PoolKind},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::path::Path;

/// One observed price point after graduation.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PricePoint {
    /// Unix seconds.
    pub timestamp: i64,
    pub price: Decimal,
    pub volume_5m: Decimal,
}

/// One recorded graduation with its subsequent price history.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GraduationRecord {
    pub mint: SmolStr,
    pub symbol: SmolStr,
    /// Unix seconds.
    pub graduated_at: i64,
    pub initial_price_usd: Decimal,
    pub sol_raised: Decimal,
    pub holder_count: u32,
    pub creator: SmolStr,
    pub pool_address: SmolStr,
    pub pool_type: PoolKind,
    pub price_history: Vec<PricePoint>,
}

impl GraduationRecord {
    /// A record is replayable when it identifies a token and a point in time.
    pub fn is_valid(&self) -> bool {
        !self.mint.is_empty() && self.graduated_at > 0
    }

    /// Builds the graduation signal published at replay time. Enrichment
    /// fields the collector did not capture stay zero ("unknown").
    pub fn to_event(&self) -> GraduationEvent {
        GraduationEvent {
            mint: self.mint.clone(),
            symbol: self.symbol.clone(),
            pool_address: self.pool_address.clone(),
            pool_kind: self.pool_type,
            sol_raised: self.sol_raised,
            holder_count: self.holder_count,
            creator: self.creator.clone(),
            initial_price_usd: self.initial_price_usd,
            ..Default::default()
        }
    }
}

/// Parses a JSON array of graduation records.
pub fn parse_records(json: &str) -> Result<Vec<GraduationRecord>, FeedError> {
    serde_json::from_str(json).map_err(|e| FeedError::BadRecord(e.to_string()))
}

/// Loads graduation records from a JSON file.
pub fn load_records(path: &Path) -> Result<Vec<GraduationRecord>, FeedError> {
    let raw = std::fs::read_to_string(path).map_err(|e| FeedError::Io(e.to_string()))?;
    parse_records(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_records() {
        let json = r#"[
            {
                "mint": "Mint111",
                "symbol": "TEST",
                "graduated_at": 1708000000,
                "initial_price_usd": 0.000042,
                "sol_raised": 85.0,
                "holder_count": 200,
                "creator": "creator111",
                "pool_address": "pool111",
                "pool_type": "pumpswap",
                "price_history": [
                    { "timestamp": 1708000060, "price": 0.000045, "volume_5m": 12000 }
                ]
            }
        ]"#;

        let records = parse_records(json).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.mint, "Mint111");
        assert_eq!(record.pool_type, PoolKind::Pumpswap);
        assert_eq!(record.initial_price_usd, dec!(0.000042));
        assert_eq!(record.price_history[0].timestamp, 1708000060);
        assert!(record.is_valid());
    }

    #[test]
    fn test_partial_record_fills_defaults() {
        let records =
            parse_records(r#"[{ "mint": "OnlyMint", "graduated_at": 1 }]"#).unwrap();
        assert!(records[0].is_valid());
        assert_eq!(records[0].holder_count, 0);
        assert!(records[0].price_history.is_empty());
    }

    #[test]
    fn test_invalid_records_detected() {
        let records = parse_records(
            r#"[{ "symbol": "NOMINT", "graduated_at": 1 }, { "mint": "NoTime" }]"#,
        )
        .unwrap();
        assert!(!records[0].is_valid());
        assert!(!records[1].is_valid());
    }

    #[test]
    fn test_to_event_keeps_unknowns_zero() {
        let record = GraduationRecord {
            mint: SmolStr::new("M"),
            graduated_at: 10,
            initial_price_usd: dec!(0.001),
            holder_count: 150,
            ..Default::default()
        };
        let event = record.to_event();
        assert_eq!(event.holder_count, 150);
        assert_eq!(event.market_cap_usd, Decimal::ZERO);
        assert_eq!(event.top10_concentration, Decimal::ZERO);
    }
}
