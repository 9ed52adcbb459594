// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Multi-factor scoring of graduation events.
//!
//! Each graduation starts at a neutral 50 and earns five signed adjustments:
//! momentum (±30), on-chain quality (±30), liquidity health (±25),
//! activity (±15) and freshness (±10), clamped to [0, 100].
//!
//! Enrichment fields are zero when the collector could not measure them. A
//! zero contributes nothing: bands (including bonuses such as "dev holds
//! nothing") only fire when the surrounding data shows the signal was
//! actually observed, so an un-enriched event scores exactly the baseline.

use martim_core::event::GraduationEvent;
use rust_decimal::Decimal;

/// Assumed circulating supply when no market cap was captured; pump.fun
/// launches mint a fixed 10^9 tokens.
const DEFAULT_SUPPLY: i64 = 1_000_000_000;

/// Detailed scoring for logging and analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub momentum: i32,
    pub quality: i32,
    pub liquidity: i32,
    pub activity: i32,
    pub freshness: i32,
    pub total: i32,
    pub reasons: Vec<String>,
}

impl ScoreBreakdown {
    fn clamp_total(&mut self) {
        let raw = 50 + self.momentum + self.quality + self.liquidity + self.activity
            + self.freshness;
        self.total = raw.clamp(0, 100);
    }

    /// Folds in an externally computed freshness adjustment (live feeds only;
    /// replays have no notion of "now").
    pub fn apply_freshness(&mut self, bonus: i32) {
        self.freshness = bonus.clamp(-10, 10);
        self.clamp_total();
    }
}

/// Market cap used for the liquidity-health ratio: the captured value, else
/// the graduation price times the default supply.
pub fn effective_mcap(event: &GraduationEvent) -> Decimal {
    if event.market_cap_usd > Decimal::ZERO {
        event.market_cap_usd
    } else {
        event.initial_price_usd * Decimal::from(DEFAULT_SUPPLY)
    }
}

/// Scores a graduation event on a 0-100 scale. Higher = stronger candidate.
pub fn score_graduation(event: &GraduationEvent) -> ScoreBreakdown {
    let mut score = ScoreBreakdown::default();

    score_momentum(event, &mut score);
    score_quality(event, &mut score);
    score_liquidity(event, &mut score);
    score_activity(event, &mut score);
    score.clamp_total();
    score
}

fn score_momentum(event: &GraduationEvent, score: &mut ScoreBreakdown) {
    let total_1h = event.buys_1h + event.sells_1h;
    if total_1h > 0 {
        let buy_ratio = Decimal::from(event.buys_1h) / Decimal::from(total_1h);
        if buy_ratio > Decimal::new(65, 2) {
            score.momentum += 15;
            score.reasons.push(format!("strong buying {buy_ratio:.2}"));
        } else if buy_ratio > Decimal::new(55, 2) {
            score.momentum += 8;
        } else if buy_ratio < Decimal::new(35, 2) {
            score.momentum -= 15;
            score.reasons.push(format!("heavy selling {buy_ratio:.2}"));
        } else if buy_ratio < Decimal::new(45, 2) {
            score.momentum -= 5;
        }
    }

    let change_5m = event.price_change_5m;
    if change_5m > Decimal::from(15) {
        score.momentum += 10;
        score.reasons.push(format!("5m pump +{change_5m:.0}%"));
    } else if change_5m > Decimal::ZERO {
        score.momentum += 3;
    } else if change_5m < Decimal::from(-15) {
        score.momentum -= 10;
        score.reasons.push(format!("5m dump {change_5m:.0}%"));
    } else if change_5m < Decimal::ZERO {
        score.momentum -= 3;
    }

    if event.price_change_1h > Decimal::from(50) {
        score.momentum += 5;
    } else if event.price_change_1h < Decimal::from(-30) {
        score.momentum -= 10;
        score
            .reasons
            .push(format!("1h down {:.0}%", event.price_change_1h));
    }
}

fn score_quality(event: &GraduationEvent, score: &mut ScoreBreakdown) {
    let top10 = event.top10_concentration;
    if top10 > Decimal::from(80) {
        score.quality -= 25;
        score.reasons.push(format!("top10 hold {top10:.0}%"));
    } else if top10 > Decimal::from(50) {
        score.quality -= 10;
    } else if top10 > Decimal::ZERO && top10 < Decimal::from(30) {
        score.quality += 5;
    }

    // Holder-distribution data present: zero dev holdings and a clean sniper
    // count are measurements, not gaps.
    let distribution_known = top10 > Decimal::ZERO;

    let dev = event.dev_holdings_pct;
    if dev > Decimal::from(10) {
        score.quality -= 15;
        score.reasons.push(format!("dev holds {dev:.1}%"));
    } else if dev > Decimal::from(5) {
        score.quality -= 5;
    } else if dev.is_zero() && distribution_known {
        score.quality += 5;
    }

    if event.sniper_count > 50 {
        score.quality -= 10;
        score.reasons.push(format!("{} snipers", event.sniper_count));
    } else if event.sniper_count > 20 {
        score.quality -= 5;
    } else if event.sniper_count < 5 && distribution_known {
        score.quality += 3;
    }

    if event.holder_count > 500 {
        score.quality += 5;
    } else if event.holder_count > 0 && event.holder_count < 50 {
        score.quality -= 5;
    }
}

fn score_liquidity(event: &GraduationEvent, score: &mut ScoreBreakdown) {
    let mcap = effective_mcap(event);
    let liquidity = event.liquidity_usd;

    if liquidity > Decimal::ZERO {
        let ratio = mcap / liquidity;
        if ratio > Decimal::from(200) {
            score.liquidity -= 25;
            score.reasons.push(format!("mcap/liq {ratio:.0}:1 (rug risk)"));
        } else if ratio > Decimal::from(100) {
            score.liquidity -= 15;
        } else if ratio > Decimal::from(50) {
            score.liquidity -= 5;
        } else if ratio < Decimal::from(10) {
            score.liquidity += 5;
        }
    } else if mcap > Decimal::ZERO {
        // a valuation with no measurable pool depth is itself a warning
        score.liquidity -= 15;
    }

    if liquidity > Decimal::ZERO && liquidity < Decimal::from(3_000) {
        score.liquidity -= 10;
        score.reasons.push(format!("liq ${liquidity:.0} thin"));
    } else if liquidity > Decimal::from(50_000) {
        score.liquidity += 5;
    }
}

fn score_activity(event: &GraduationEvent, score: &mut ScoreBreakdown) {
    let txns = event.txns_24h;
    if txns > 10_000 {
        score.activity += 10;
    } else if txns > 5_000 {
        score.activity += 5;
    } else if txns > 1_000 {
        score.activity += 2;
    } else if txns > 0 && txns < 200 {
        score.activity -= 10;
        score.reasons.push(format!("low txns ({txns})"));
    }
}
