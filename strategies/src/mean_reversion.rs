// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Mean reversion on Bollinger Band Z-scores.
//!
//! Enters long when a token's price has deviated far below its rolling mean
//! and exits on reversion. Meant for tokens with established liquidity,
//! not for freshly graduated ones with a handful of ticks of history.

use crate::shared::BoundedSeries;
use fnv::FnvHashMap;
use martim_analytics::algorithm::RollingStats;
use martim_core::{
    event::PriceUpdate, Event, EventKind, EventPayload, Strategy, StrategyCtx,
};
use rust_decimal::Decimal;
use smol_str::SmolStr;

/// Rolling Bollinger Band state for a single token.
#[derive(Debug, Clone)]
pub struct BollingerState {
    prices: BoundedSeries,
    lookback: usize,
    pub band_multiplier: Decimal,
    pub mean: Decimal,
    pub std: Decimal,
    pub upper: Decimal,
    pub lower: Decimal,
    pub z_score: Decimal,
}

impl BollingerState {
    pub fn new(lookback: usize, band_multiplier: Decimal) -> Self {
        Self {
            // 2x lookback keeps the window full while old ticks age out
            prices: BoundedSeries::new(lookback * 2),
            lookback,
            band_multiplier,
            mean: Decimal::ZERO,
            std: Decimal::ZERO,
            upper: Decimal::ZERO,
            lower: Decimal::ZERO,
            z_score: Decimal::ZERO,
        }
    }

    /// Adds a price observation and recomputes the bands.
    pub fn update(&mut self, price: Decimal) {
        self.prices.push(price);
        if self.prices.len() < 2 {
            self.mean = price;
            self.std = Decimal::ZERO;
            self.z_score = Decimal::ZERO;
            self.upper = price;
            self.lower = price;
            return;
        }

        self.mean = self.prices.window_mean(self.lookback);
        self.std = self.prices.window_std(self.lookback);
        self.upper = self.mean + self.band_multiplier * self.std;
        self.lower = self.mean - self.band_multiplier * self.std;
        self.z_score = if self.std > Decimal::ZERO {
            (price - self.mean) / self.std
        } else {
            Decimal::ZERO
        };
    }

    pub fn ready(&self) -> bool {
        self.prices.len() >= self.lookback
    }

    /// Bollinger bandwidth `(upper − lower) / mean`.
    pub fn bandwidth(&self) -> Decimal {
        if self.mean <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.upper - self.lower) / self.mean
    }
}

/// Mean-reversion configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MeanReversionConfig {
    pub lookback: usize,
    /// Entry threshold; negative = oversold.
    pub entry_z: Decimal,
    pub exit_z: Decimal,
    pub band_multiplier: Decimal,
    pub position_usd: Decimal,
    pub max_positions: usize,
    /// Minimum bandwidth: filters out dead, low-volatility regimes.
    pub min_bandwidth: Decimal,
    /// Scale the band multiplier with the fast/slow volatility ratio.
    pub adaptive_bands: bool,
    pub adaptive_fast: usize,
    pub adaptive_slow: usize,
    pub enable_short: bool,
    pub short_entry_z: Decimal,
    pub short_exit_z: Decimal,
    pub slippage_bps: u32,
}

impl Default for MeanReversionConfig {
    fn default() -> Self {
        Self {
            lookback: 20,
            entry_z: Decimal::from(-2),
            exit_z: Decimal::new(-5, 1),
            band_multiplier: Decimal::from(2),
            position_usd: Decimal::from(50),
            max_positions: 5,
            min_bandwidth: Decimal::new(1, 2),
            adaptive_bands: true,
            adaptive_fast: 5,
            adaptive_slow: 50,
            enable_short: false,
            short_entry_z: Decimal::from(2),
            short_exit_z: Decimal::new(5, 1),
            slippage_bps: 50,
        }
    }
}

/// Bollinger/Z-score mean reversion strategy.
#[derive(Debug)]
pub struct MeanReversionStrategy {
    config: MeanReversionConfig,
    states: FnvHashMap<SmolStr, BollingerState>,
    vol_fast: FnvHashMap<SmolStr, RollingStats>,
    vol_slow: FnvHashMap<SmolStr, RollingStats>,
    long_entries: FnvHashMap<SmolStr, Decimal>,
    short_entries: FnvHashMap<SmolStr, Decimal>,
}

impl MeanReversionStrategy {
    pub const NAME: &'static str = "mean_reversion";

    pub fn new(config: MeanReversionConfig) -> Self {
        Self {
            config,
            states: FnvHashMap::default(),
            vol_fast: FnvHashMap::default(),
            vol_slow: FnvHashMap::default(),
            long_entries: FnvHashMap::default(),
            short_entries: FnvHashMap::default(),
        }
    }

    pub fn open_longs(&self) -> usize {
        self.long_entries.len()
    }

    pub fn open_shorts(&self) -> usize {
        self.short_entries.len()
    }

    pub fn tracked_tokens(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, token: &SmolStr) -> Option<&BollingerState> {
        self.states.get(token)
    }

    /// Widens bands when recent volatility runs hot against the slow
    /// baseline and tightens them when it contracts, clamped to [0.5x, 2x]
    /// of the configured multiplier.
    fn adaptive_multiplier(&self, token: &SmolStr) -> Decimal {
        let base = self.config.band_multiplier;
        let (Some(fast), Some(slow)) = (self.vol_fast.get(token), self.vol_slow.get(token))
        else {
            return base;
        };
        if fast.count() < 2 || slow.count() < 2 {
            return base;
        }
        let slow_std = slow.std_dev();
        if slow_std <= Decimal::ZERO {
            return base;
        }
        let ratio = fast.std_dev() / slow_std;
        base * ratio.clamp(Decimal::new(5, 1), Decimal::from(2))
    }

    fn on_price(&mut self, update: &PriceUpdate, ctx: &StrategyCtx) {
        let token = &update.token;
        let price = update.price_usd;
        if price <= Decimal::ZERO {
            return;
        }

        if self.config.adaptive_bands {
            self.vol_fast
                .entry(token.clone())
                .or_insert_with(|| RollingStats::new(self.config.adaptive_fast.max(2)))
                .push(price);
            self.vol_slow
                .entry(token.clone())
                .or_insert_with(|| RollingStats::new(self.config.adaptive_slow.max(2)))
                .push(price);
        }

        let multiplier = if self.config.adaptive_bands {
            self.adaptive_multiplier(token)
        } else {
            self.config.band_multiplier
        };

        let state = self
            .states
            .entry(token.clone())
            .or_insert_with(|| BollingerState::new(self.config.lookback, multiplier));
        state.band_multiplier = multiplier;
        state.update(price);

        if !state.ready() {
            return;
        }
        if state.bandwidth() < self.config.min_bandwidth {
            return;
        }
        let z = state.z_score;

        let active = self.long_entries.len() + self.short_entries.len();

        if self.long_entries.contains_key(token) {
            if z >= self.config.exit_z {
                tracing::info!(%token, %z, %price, mean = %state.mean, "exit long");
                ctx.sell(token.clone(), Decimal::ZERO, self.config.slippage_bps);
                self.long_entries.remove(token);
            }
        } else if z <= self.config.entry_z && active < self.config.max_positions {
            tracing::info!(%token, %z, %price, lower = %state.lower, "enter long");
            ctx.buy(token.clone(), self.config.position_usd, self.config.slippage_bps);
            self.long_entries.insert(token.clone(), price);
        }

        if !self.config.enable_short {
            return;
        }
        let active = self.long_entries.len() + self.short_entries.len();
        if self.short_entries.contains_key(token) {
            if z <= self.config.short_exit_z {
                tracing::info!(%token, %z, %price, "exit short");
                ctx.buy(token.clone(), self.config.position_usd, self.config.slippage_bps);
                self.short_entries.remove(token);
            }
        } else if z >= self.config.short_entry_z && active < self.config.max_positions {
            tracing::info!(%token, %z, %price, upper = %state.upper, "enter short");
            ctx.sell(token.clone(), Decimal::ZERO, self.config.slippage_bps);
            self.short_entries.insert(token.clone(), price);
        }
    }
}

impl Strategy for MeanReversionStrategy {
    fn name(&self) -> SmolStr {
        SmolStr::new_static(Self::NAME)
    }

    fn subscriptions(&self) -> &'static [EventKind] {
        &[EventKind::PriceUpdate]
    }

    fn on_event(&mut self, event: &Event, ctx: &StrategyCtx) {
        if let EventPayload::PriceUpdate(update) = event.payload() {
            self.on_price(update, ctx);
        }
    }

    fn on_stop(&mut self, _ctx: &StrategyCtx) {
        tracing::info!(
            longs = self.long_entries.len(),
            shorts = self.short_entries.len(),
            tracked = self.states.len(),
            "mean reversion stopped"
        );
    }
}
