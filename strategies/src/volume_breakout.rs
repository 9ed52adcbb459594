// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Volume breakout detection.
//!
//! Detects volume spikes that often precede large moves on newly graduated
//! tokens, waits for confirming price action, scales the entry with the
//! spike magnitude and exits on a trailing stop or when volume reverts.

use crate::shared::BoundedSeries;
use fnv::FnvHashMap;
use martim_core::{
    event::PriceUpdate, Event, EventKind, EventPayload, Strategy, StrategyCtx,
};
use rust_decimal::Decimal;
use smol_str::SmolStr;

/// Volume and price history for one token.
#[derive(Debug, Clone)]
pub struct VolumeState {
    volumes: BoundedSeries,
    prices: BoundedSeries,
    lookback: usize,
    /// Index into the price series when the last spike was seen; `None`
    /// when no spike is pending confirmation.
    spike_pending: bool,
    pub confirmation_count: u32,
    pub in_position: bool,
    pub entry_price: Decimal,
    pub spike_magnitude: Decimal,
}

impl VolumeState {
    pub fn new(lookback: usize) -> Self {
        Self {
            volumes: BoundedSeries::new(lookback * 3),
            prices: BoundedSeries::new(lookback * 3),
            lookback,
            spike_pending: false,
            confirmation_count: 0,
            in_position: false,
            entry_price: Decimal::ZERO,
            spike_magnitude: Decimal::ZERO,
        }
    }

    pub fn add(&mut self, price: Decimal, volume: Decimal) {
        self.prices.push(price);
        self.volumes.push(volume);
    }

    pub fn ready(&self) -> bool {
        self.volumes.len() >= self.lookback
    }

    pub fn avg_volume(&self) -> Decimal {
        self.volumes.window_mean(self.lookback)
    }

    pub fn volume_std(&self) -> Decimal {
        self.volumes.window_std(self.lookback)
    }

    pub fn last_volume(&self) -> Decimal {
        self.volumes.last().unwrap_or(Decimal::ZERO)
    }

    /// Short-term price momentum: change over the last 3 bars.
    pub fn price_momentum(&self) -> Decimal {
        let Some(old) = self.prices.back(3) else {
            return Decimal::ZERO;
        };
        let Some(last) = self.prices.last() else {
            return Decimal::ZERO;
        };
        if old <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (last - old) / old
    }

    /// Whether the latest volume is a spike, and its magnitude in standard
    /// deviations.
    pub fn volume_spike(&self, threshold: Decimal) -> (bool, Decimal) {
        let std = self.volume_std();
        if std <= Decimal::ZERO {
            return (false, Decimal::ZERO);
        }
        let z = (self.last_volume() - self.avg_volume()) / std;
        (z >= threshold, z)
    }

    /// Volume up sharply over 5 bars while price stays flat: accumulation.
    pub fn price_volume_divergence(&self) -> bool {
        let (Some(old_price), Some(old_vol)) = (self.prices.back(4), self.volumes.back(4)) else {
            return false;
        };
        let (Some(price), Some(volume)) = (self.prices.last(), self.volumes.last()) else {
            return false;
        };
        if old_price <= Decimal::ZERO || old_vol <= Decimal::ZERO {
            return false;
        }
        let price_change = (price - old_price) / old_price;
        let vol_change = (volume - old_vol) / old_vol;
        vol_change > Decimal::new(5, 1) && price_change < Decimal::new(5, 2)
    }
}

/// Volume breakout configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeBreakoutConfig {
    /// Z-score threshold for spike detection.
    pub spike_threshold: Decimal,
    /// Bars of positive price action required after a spike.
    pub confirmation_bars: u32,
    pub base_position_usd: Decimal,
    pub max_position_usd: Decimal,
    /// Extra size per standard deviation of spike magnitude.
    pub scale_factor: Decimal,
    pub lookback: usize,
    pub trailing_stop_pct: Decimal,
    pub max_positions: usize,
    /// Exit when volume falls below this fraction of the rolling average.
    pub volume_exit_threshold: Decimal,
    /// Also enter on price/volume divergence.
    pub divergence_mode: bool,
    pub slippage_bps: u32,
}

impl Default for VolumeBreakoutConfig {
    fn default() -> Self {
        Self {
            spike_threshold: Decimal::from(3),
            confirmation_bars: 2,
            base_position_usd: Decimal::from(50),
            max_position_usd: Decimal::from(200),
            scale_factor: Decimal::new(25, 2),
            lookback: 20,
            trailing_stop_pct: Decimal::new(10, 2),
            max_positions: 5,
            volume_exit_threshold: Decimal::new(30, 2),
            divergence_mode: false,
            slippage_bps: 50,
        }
    }
}

/// Volume breakout strategy with confirmation and magnitude-scaled sizing.
#[derive(Debug)]
pub struct VolumeBreakoutStrategy {
    config: VolumeBreakoutConfig,
    states: FnvHashMap<SmolStr, VolumeState>,
    trailing_highs: FnvHashMap<SmolStr, Decimal>,
}

impl VolumeBreakoutStrategy {
    pub const NAME: &'static str = "volume_breakout";

    pub fn new(config: VolumeBreakoutConfig) -> Self {
        Self {
            config,
            states: FnvHashMap::default(),
            trailing_highs: FnvHashMap::default(),
        }
    }

    pub fn active_positions(&self) -> usize {
        self.states.values().filter(|s| s.in_position).count()
    }

    pub fn tracked_tokens(&self) -> usize {
        self.states.len()
    }

    /// `base · (1 + scale · magnitude)`, capped at the maximum.
    fn position_size(config: &VolumeBreakoutConfig, magnitude: Decimal) -> Decimal {
        let scaled = config.base_position_usd * (Decimal::ONE + config.scale_factor * magnitude);
        scaled.min(config.max_position_usd)
    }

    fn on_price(&mut self, update: &PriceUpdate, ctx: &StrategyCtx) {
        let token = &update.token;
        let price = update.price_usd;
        let volume = update.volume_24h;
        if price <= Decimal::ZERO {
            return;
        }

        let active = self.active_positions();
        let config = self.config.clone();
        let state = self
            .states
            .entry(token.clone())
            .or_insert_with(|| VolumeState::new(config.lookback));
        state.add(price, volume);

        if !state.ready() {
            return;
        }

        if state.in_position {
            Self::manage_position(state, &mut self.trailing_highs, &config, token, price, ctx);
            return;
        }

        if active >= config.max_positions {
            return;
        }

        let (mut is_spike, mut magnitude) = state.volume_spike(config.spike_threshold);
        if config.divergence_mode && !is_spike && state.price_volume_divergence() {
            is_spike = true;
            magnitude = config.spike_threshold;
        }

        if is_spike && !state.spike_pending {
            state.spike_pending = true;
            state.spike_magnitude = magnitude;
            state.confirmation_count = 0;
            tracing::info!(%token, magnitude = %magnitude.round_dp(1), volume = %volume, "volume spike");
        }

        if state.spike_pending {
            if state.price_momentum() > Decimal::ZERO {
                state.confirmation_count += 1;
            } else {
                // price turned: stand down
                state.spike_pending = false;
                state.confirmation_count = 0;
                return;
            }

            if state.confirmation_count >= config.confirmation_bars {
                let size = Self::position_size(&config, state.spike_magnitude);
                tracing::info!(%token, %price, size_usd = %size, "breakout entry");
                ctx.buy(token.clone(), size, config.slippage_bps);
                state.in_position = true;
                state.entry_price = price;
                state.spike_pending = false;
                self.trailing_highs.insert(token.clone(), price);
            }
        }
    }

    fn manage_position(
        state: &mut VolumeState,
        trailing_highs: &mut FnvHashMap<SmolStr, Decimal>,
        config: &VolumeBreakoutConfig,
        token: &SmolStr,
        price: Decimal,
        ctx: &StrategyCtx,
    ) {
        let high = trailing_highs
            .get(token)
            .copied()
            .unwrap_or(price)
            .max(price);
        trailing_highs.insert(token.clone(), high);

        let stop_price = high * (Decimal::ONE - config.trailing_stop_pct);
        if price <= stop_price {
            tracing::info!(%token, %price, "breakout exit: trailing stop");
            ctx.sell(token.clone(), Decimal::ZERO, config.slippage_bps);
            state.in_position = false;
            state.entry_price = Decimal::ZERO;
            trailing_highs.remove(token);
            return;
        }

        let avg = state.avg_volume();
        if avg > Decimal::ZERO {
            let ratio = state.last_volume() / avg;
            if ratio < config.volume_exit_threshold {
                tracing::info!(%token, %price, ratio = %ratio.round_dp(2), "breakout exit: volume died");
                ctx.sell(token.clone(), Decimal::ZERO, config.slippage_bps);
                state.in_position = false;
                state.entry_price = Decimal::ZERO;
                trailing_highs.remove(token);
            }
        }
    }
}

impl Strategy for VolumeBreakoutStrategy {
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
            active = self.active_positions(),
            tracked = self.states.len(),
            "volume breakout stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use martim_core::{bus::EventBus, clock::SimClock, event::OrderIntent, Side};
    use rust_decimal_macros::dec;
    use std::{cell::RefCell, rc::Rc};

    fn ctx_and_orders() -> (StrategyCtx, Rc<RefCell<Vec<OrderIntent>>>) {
        let bus = Rc::new(EventBus::new());
        let orders = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&orders);
        bus.subscribe(EventKind::OrderSubmitted, move |event| {
            if let EventPayload::OrderSubmitted(intent) = event.payload() {
                log.borrow_mut().push(intent.clone());
            }
            Ok(())
        });
        let ctx = StrategyCtx::new(
            bus,
            Rc::new(SimClock::new(0)),
            SmolStr::new_static(VolumeBreakoutStrategy::NAME),
        );
        (ctx, orders)
    }

    fn tick(token: &str, price: Decimal, volume: Decimal) -> PriceUpdate {
        PriceUpdate {
            token: SmolStr::new(token),
            price_usd: price,
            volume_24h: volume,
            ..Default::default()
        }
    }

    fn config() -> VolumeBreakoutConfig {
        VolumeBreakoutConfig {
            lookback: 5,
            spike_threshold: dec!(1.5),
            confirmation_bars: 2,
            ..Default::default()
        }
    }

    /// Seeds a stable baseline, fires a spike and confirms it with two green
    /// bars; returns the strategy with the position open.
    fn enter(ctx: &StrategyCtx, strategy: &mut VolumeBreakoutStrategy) {
        for i in 0..5 {
            strategy.on_price(
                &tick("A", dec!(1) + Decimal::new(i, 3), dec!(1000)),
                ctx,
            );
        }
        // spike with positive momentum
        strategy.on_price(&tick("A", dec!(1.01), dec!(8000)), ctx);
        strategy.on_price(&tick("A", dec!(1.02), dec!(8000)), ctx);
    }

    #[test]
    fn test_spike_plus_confirmation_enters() {
        let (ctx, orders) = ctx_and_orders();
        let mut strategy = VolumeBreakoutStrategy::new(config());

        enter(&ctx, &mut strategy);

        assert_eq!(strategy.active_positions(), 1);
        let orders = orders.borrow();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, Side::Buy);
        // magnitude-scaled above base, capped at max
        assert!(orders[0].amount_usd > dec!(50));
        assert!(orders[0].amount_usd <= dec!(200));
    }

    #[test]
    fn test_no_entry_without_confirmation() {
        let (ctx, orders) = ctx_and_orders();
        let mut strategy = VolumeBreakoutStrategy::new(config());

        for i in 0..5 {
            strategy.on_price(&tick("A", dec!(1) + Decimal::new(i, 3), dec!(1000)), &ctx);
        }
        // spike, then price rolls over: confirmation resets
        strategy.on_price(&tick("A", dec!(1.01), dec!(8000)), &ctx);
        strategy.on_price(&tick("A", dec!(0.99), dec!(8000)), &ctx);

        assert!(orders.borrow().is_empty());
        assert_eq!(strategy.active_positions(), 0);
    }

    #[test]
    fn test_no_entry_before_history_ready() {
        let (ctx, orders) = ctx_and_orders();
        let mut strategy = VolumeBreakoutStrategy::new(config());

        strategy.on_price(&tick("A", dec!(1), dec!(100000)), &ctx);
        strategy.on_price(&tick("A", dec!(1.1), dec!(100000)), &ctx);

        assert!(orders.borrow().is_empty());
    }

    #[test]
    fn test_trailing_stop_exit() {
        let (ctx, orders) = ctx_and_orders();
        let mut strategy = VolumeBreakoutStrategy::new(config());
        enter(&ctx, &mut strategy);

        // ride to a new high, then fall 10% off it
        strategy.on_price(&tick("A", dec!(1.20), dec!(5000)), &ctx);
        strategy.on_price(&tick("A", dec!(1.07), dec!(5000)), &ctx);

        assert_eq!(strategy.active_positions(), 0);
        let orders = orders.borrow();
        assert_eq!(orders.last().unwrap().side, Side::Sell);
        assert_eq!(orders.last().unwrap().amount, Decimal::ZERO);
    }

    #[test]
    fn test_volume_reversion_exit() {
        let (ctx, orders) = ctx_and_orders();
        let mut strategy = VolumeBreakoutStrategy::new(config());
        enter(&ctx, &mut strategy);

        // volume collapses to a fraction of the average while price holds
        strategy.on_price(&tick("A", dec!(1.03), dec!(100)), &ctx);

        assert_eq!(strategy.active_positions(), 0);
        assert_eq!(orders.borrow().last().unwrap().side, Side::Sell);
    }

    #[test]
    fn test_divergence_mode_entry() {
        let (ctx, orders) = ctx_and_orders();
        let mut strategy = VolumeBreakoutStrategy::new(VolumeBreakoutConfig {
            divergence_mode: true,
            spike_threshold: dec!(50), // z-spike practically unreachable
            ..config()
        });

        for _ in 0..5 {
            strategy.on_price(&tick("A", dec!(1), dec!(1000)), &ctx);
        }
        // volume up 2x over 5 bars, price flat: divergence
        strategy.on_price(&tick("A", dec!(1.001), dec!(2000)), &ctx);
        strategy.on_price(&tick("A", dec!(1.002), dec!(2100)), &ctx);

        assert_eq!(strategy.active_positions(), 1);
        assert_eq!(orders.borrow().len(), 1);
    }

    #[test]
    fn test_max_positions_cap() {
        let (ctx, _orders) = ctx_and_orders();
        let mut strategy = VolumeBreakoutStrategy::new(VolumeBreakoutConfig {
            max_positions: 1,
            ..config()
        });
        enter(&ctx, &mut strategy);

        // a second token with the same breakout shape is refused
        for i in 0..5 {
            strategy.on_price(&tick("B", dec!(1) + Decimal::new(i, 3), dec!(1000)), &ctx);
        }
        strategy.on_price(&tick("B", dec!(1.01), dec!(8000)), &ctx);
        strategy.on_price(&tick("B", dec!(1.02), dec!(8000)), &ctx);

        assert_eq!(strategy.active_positions(), 1);
    }
}
