// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Trade journal: records every fill and matches sells against buys per
//! token, FIFO, into [`RoundTrip`]s for per-trade P&L accounting.

use crate::summary::TradingSummary;
use fnv::FnvHashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::VecDeque;

/// Trade direction of a recorded fill.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Immutable record of a single fill.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TradeRecord {
    pub token: SmolStr,
    pub side: TradeSide,
    pub price: Decimal,
    pub quantity: Decimal,
    pub notional_usd: Decimal,
    pub timestamp_ns: i64,
    pub strategy: SmolStr,
    pub fees_usd: Decimal,
    pub signature: SmolStr,
}

impl TradeRecord {
    pub fn new(
        token: SmolStr,
        side: TradeSide,
        price: Decimal,
        quantity: Decimal,
        timestamp_ns: i64,
    ) -> Self {
        Self {
            token,
            side,
            price,
            quantity,
            notional_usd: price * quantity,
            timestamp_ns,
            strategy: SmolStr::default(),
            fees_usd: Decimal::ZERO,
            signature: SmolStr::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: SmolStr) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_fees(mut self, fees_usd: Decimal) -> Self {
        self.fees_usd = fees_usd;
        self
    }

    pub fn with_signature(mut self, signature: SmolStr) -> Self {
        self.signature = signature;
        self
    }
}

/// A matched entry/exit pair representing one complete trade.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RoundTrip {
    pub token: SmolStr,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub quantity: Decimal,
    pub pnl_usd: Decimal,
    /// Return as a fraction of the entry price (0.5 = +50%).
    pub pnl_pct: Decimal,
    pub hold_ns: i64,
    pub entry_ns: i64,
    pub exit_ns: i64,
}

/// Records trades and computes performance analytics.
///
/// Keeps the full audit trail of fills, pairs buys and sells per token in
/// FIFO order and appends one equity-curve point per closed round trip.
#[derive(Debug, Clone)]
pub struct TradeJournal {
    initial_equity: Decimal,
    current_equity: Decimal,
    trades: Vec<TradeRecord>,
    round_trips: Vec<RoundTrip>,
    open_buys: FnvHashMap<SmolStr, VecDeque<TradeRecord>>,
    equity_curve: Vec<Decimal>,
}

impl TradeJournal {
    pub fn new(initial_equity: Decimal) -> Self {
        Self {
            initial_equity,
            current_equity: initial_equity,
            trades: Vec::new(),
            round_trips: Vec::new(),
            open_buys: FnvHashMap::default(),
            equity_curve: vec![initial_equity],
        }
    }

    /// Records a fill and, for sells, attempts to close a round trip.
    pub fn record(&mut self, record: TradeRecord) {
        self.trades.push(record.clone());
        match record.side {
            TradeSide::Buy => {
                self.open_buys
                    .entry(record.token.clone())
                    .or_default()
                    .push_back(record);
            }
            TradeSide::Sell => self.match_round_trip(record),
        }
    }

    /// FIFO matching of a sell against the oldest open buy for the token.
    fn match_round_trip(&mut self, sell: TradeRecord) {
        let Some(buys) = self.open_buys.get_mut(&sell.token) else {
            return;
        };
        let Some(buy) = buys.pop_front() else {
            return;
        };

        let quantity = buy.quantity.min(sell.quantity);
        let pnl_usd = quantity * (sell.price - buy.price) - buy.fees_usd - sell.fees_usd;
        let pnl_pct = if buy.price > Decimal::ZERO {
            (sell.price - buy.price) / buy.price
        } else {
            Decimal::ZERO
        };

        self.round_trips.push(RoundTrip {
            token: sell.token.clone(),
            entry_price: buy.price,
            exit_price: sell.price,
            quantity,
            pnl_usd,
            pnl_pct,
            hold_ns: sell.timestamp_ns - buy.timestamp_ns,
            entry_ns: buy.timestamp_ns,
            exit_ns: sell.timestamp_ns,
        });
        self.current_equity += pnl_usd;
        self.equity_curve.push(self.current_equity);
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn round_trips(&self) -> &[RoundTrip] {
        &self.round_trips
    }

    /// Equity curve: the starting equity plus one point per closed round trip.
    pub fn equity_curve(&self) -> &[Decimal] {
        &self.equity_curve
    }

    pub fn initial_equity(&self) -> Decimal {
        self.initial_equity
    }

    pub fn current_equity(&self) -> Decimal {
        self.current_equity
    }

    /// Number of buys not yet matched by a sell.
    pub fn open_lots(&self) -> usize {
        self.open_buys.values().map(VecDeque::len).sum()
    }

    /// Builds the full performance summary from the closed round trips.
    pub fn summary(&self) -> TradingSummary {
        TradingSummary::generate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn buy(token: &str, price: Decimal, qty: Decimal, ts: i64) -> TradeRecord {
        TradeRecord::new(SmolStr::new(token), TradeSide::Buy, price, qty, ts)
    }

    fn sell(token: &str, price: Decimal, qty: Decimal, ts: i64) -> TradeRecord {
        TradeRecord::new(SmolStr::new(token), TradeSide::Sell, price, qty, ts)
    }

    #[test]
    fn test_round_trip_matching_fifo() {
        let mut journal = TradeJournal::new(dec!(10000));
        journal.record(buy("ABC", dec!(0.001), dec!(50000), 1_000_000_000));
        journal.record(buy("ABC", dec!(0.002), dec!(25000), 2_000_000_000));
        journal.record(sell("ABC", dec!(0.0015), dec!(50000), 3_000_000_000));

        // FIFO: the sell matches the first buy at 0.001
        assert_eq!(journal.round_trips().len(), 1);
        let rt = &journal.round_trips()[0];
        assert_eq!(rt.entry_price, dec!(0.001));
        assert_eq!(rt.pnl_usd, dec!(25));
        assert_eq!(rt.pnl_pct, dec!(0.5));
        assert_eq!(rt.hold_ns, 2_000_000_000);
        assert_eq!(journal.open_lots(), 1);
    }

    #[test]
    fn test_sell_without_buy_is_ignored() {
        let mut journal = TradeJournal::new(dec!(10000));
        journal.record(sell("ABC", dec!(0.001), dec!(1000), 1));

        assert!(journal.round_trips().is_empty());
        assert_eq!(journal.current_equity(), dec!(10000));
    }

    #[test]
    fn test_equity_curve_one_point_per_round_trip() {
        let mut journal = TradeJournal::new(dec!(1000));
        journal.record(buy("A", dec!(1), dec!(100), 1));
        journal.record(sell("A", dec!(2), dec!(100), 2));
        journal.record(buy("B", dec!(10), dec!(5), 3));
        journal.record(sell("B", dec!(8), dec!(5), 4));

        assert_eq!(journal.equity_curve(), &[dec!(1000), dec!(1100), dec!(1090)]);
    }

    #[test]
    fn test_fees_reduce_pnl() {
        let mut journal = TradeJournal::new(dec!(1000));
        journal.record(buy("A", dec!(1), dec!(100), 1).with_fees(dec!(3)));
        journal.record(sell("A", dec!(2), dec!(100), 2).with_fees(dec!(2)));

        assert_eq!(journal.round_trips()[0].pnl_usd, dec!(95));
    }
}
