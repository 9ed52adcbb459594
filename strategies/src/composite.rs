// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Composite multi-factor strategy.
//!
//! Combines heterogeneous signal sources, each normalised to [-1, +1],
//! through confidence-and-weight averaging, and tracks per-signal
//! attribution so it is visible which factors actually contribute.

use crate::shared::BoundedSeries;
use fnv::FnvHashMap;
use martim_core::{
    event::PriceUpdate, Event, EventKind, EventPayload, Strategy, StrategyCtx,
};
use rust_decimal::Decimal;
use smol_str::SmolStr;

/// Output of a single signal source.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalOutput {
    pub name: SmolStr,
    /// Normalised signal in [-1, +1]; positive = buy.
    pub value: Decimal,
    /// Confidence in [0, 1].
    pub confidence: Decimal,
}

/// A source of normalised trading signals.
///
/// The composite strategy calls `update` on every tick and `signal` when it
/// needs the current reading.
pub trait SignalSource {
    fn name(&self) -> SmolStr;

    fn weight(&self) -> Decimal;

    fn update(&mut self, token: &SmolStr, price: Decimal, volume: Decimal);

    fn ready(&self, token: &SmolStr) -> bool;

    fn signal(&self, token: &SmolStr) -> Option<SignalOutput>;
}

impl std::fmt::Debug for dyn SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignalSource({})", self.name())
    }
}

fn clamp_unit(value: Decimal) -> Decimal {
    value.clamp(Decimal::from(-1), Decimal::ONE)
}

fn confidence_for(observed: usize, lookback: usize) -> Decimal {
    (Decimal::from(observed) / Decimal::from(lookback * 2)).min(Decimal::ONE)
}

/// Rate-of-change momentum signal, scaled for sensitivity and clamped.
#[derive(Debug)]
pub struct MomentumSignal {
    lookback: usize,
    weight: Decimal,
    prices: FnvHashMap<SmolStr, BoundedSeries>,
}

impl MomentumSignal {
    pub fn new(lookback: usize, weight: Decimal) -> Self {
        Self {
            lookback,
            weight,
            prices: FnvHashMap::default(),
        }
    }
}

impl SignalSource for MomentumSignal {
    fn name(&self) -> SmolStr {
        SmolStr::new_static("momentum")
    }

    fn weight(&self) -> Decimal {
        self.weight
    }

    fn update(&mut self, token: &SmolStr, price: Decimal, _volume: Decimal) {
        self.prices
            .entry(token.clone())
            .or_insert_with(|| BoundedSeries::new(self.lookback * 3))
            .push(price);
    }

    fn ready(&self, token: &SmolStr) -> bool {
        self.prices
            .get(token)
            .is_some_and(|series| series.len() > self.lookback)
    }

    fn signal(&self, token: &SmolStr) -> Option<SignalOutput> {
        let series = self.prices.get(token)?;
        let old = series.back(self.lookback)?;
        let last = series.last()?;
        if old <= Decimal::ZERO {
            return None;
        }
        let roc = (last - old) / old;
        Some(SignalOutput {
            name: self.name(),
            value: clamp_unit(roc * Decimal::from(5)),
            confidence: confidence_for(series.len(), self.lookback),
        })
    }
}

/// Bollinger Z-score signal, inverted for mean reversion: oversold (negative
/// Z) produces a positive (buy) signal.
#[derive(Debug)]
pub struct MeanReversionSignal {
    lookback: usize,
    band_multiplier: Decimal,
    weight: Decimal,
    prices: FnvHashMap<SmolStr, BoundedSeries>,
}

impl MeanReversionSignal {
    pub fn new(lookback: usize, band_multiplier: Decimal, weight: Decimal) -> Self {
        Self {
            lookback,
            band_multiplier,
            weight,
            prices: FnvHashMap::default(),
        }
    }
}

impl SignalSource for MeanReversionSignal {
    fn name(&self) -> SmolStr {
        SmolStr::new_static("mean_reversion")
    }

    fn weight(&self) -> Decimal {
        self.weight
    }

    fn update(&mut self, token: &SmolStr, price: Decimal, _volume: Decimal) {
        self.prices
            .entry(token.clone())
            .or_insert_with(|| BoundedSeries::new(self.lookback * 3))
            .push(price);
    }

    fn ready(&self, token: &SmolStr) -> bool {
        self.prices
            .get(token)
            .is_some_and(|series| series.len() >= self.lookback)
    }

    fn signal(&self, token: &SmolStr) -> Option<SignalOutput> {
        let series = self.prices.get(token)?;
        if series.len() < self.lookback {
            return None;
        }
        let mean = series.window_mean(self.lookback);
        let std = series.window_std(self.lookback);
        if std <= Decimal::ZERO {
            return None;
        }
        let z = (series.last()? - mean) / std;
        Some(SignalOutput {
            name: self.name(),
            value: clamp_unit(-z / self.band_multiplier),
            confidence: confidence_for(series.len(), self.lookback),
        })
    }
}

/// Volume spike signal; produces only non-negative (buy) values.
#[derive(Debug)]
pub struct VolumeSignal {
    lookback: usize,
    spike_threshold: Decimal,
    weight: Decimal,
    volumes: FnvHashMap<SmolStr, BoundedSeries>,
}

impl VolumeSignal {
    pub fn new(lookback: usize, spike_threshold: Decimal, weight: Decimal) -> Self {
        Self {
            lookback,
            spike_threshold,
            weight,
            volumes: FnvHashMap::default(),
        }
    }
}

impl SignalSource for VolumeSignal {
    fn name(&self) -> SmolStr {
        SmolStr::new_static("volume")
    }

    fn weight(&self) -> Decimal {
        self.weight
    }

    fn update(&mut self, token: &SmolStr, _price: Decimal, volume: Decimal) {
        self.volumes
            .entry(token.clone())
            .or_insert_with(|| BoundedSeries::new(self.lookback * 3))
            .push(volume);
    }

    fn ready(&self, token: &SmolStr) -> bool {
        self.volumes
            .get(token)
            .is_some_and(|series| series.len() >= self.lookback)
    }

    fn signal(&self, token: &SmolStr) -> Option<SignalOutput> {
        let series = self.volumes.get(token)?;
        if series.len() < self.lookback {
            return None;
        }
        let mean = series.window_mean(self.lookback);
        let std = series.window_std(self.lookback);
        if std <= Decimal::ZERO || mean <= Decimal::ZERO {
            return None;
        }
        let z = (series.last()? - mean) / std;
        let value = (z / self.spike_threshold)
            .max(Decimal::ZERO)
            .min(Decimal::ONE);
        Some(SignalOutput {
            name: self.name(),
            value,
            confidence: confidence_for(series.len(), self.lookback),
        })
    }
}

/// Per-signal performance attribution.
///
/// A call is "correct" when the signal's direction at entry matched the
/// realized outcome of the round trip (exit above entry for positive
/// signals, at-or-below for non-positive ones).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignalAttribution {
    pub name: SmolStr,
    pub total_contribution: Decimal,
    pub correct_calls: u32,
    pub total_calls: u32,
    signal_sum: Decimal,
    pub avg_signal_at_entry: Decimal,
}

impl SignalAttribution {
    pub fn accuracy(&self) -> Decimal {
        if self.total_calls == 0 {
            return Decimal::ZERO;
        }
        Decimal::from(self.correct_calls) / Decimal::from(self.total_calls)
    }
}

/// Composite strategy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeConfig {
    /// Minimum weighted composite score to enter.
    pub consensus_threshold: Decimal,
    pub position_usd: Decimal,
    pub max_positions: usize,
    /// Composite score at or below which an open position exits.
    pub exit_threshold: Decimal,
    /// Minimum number of ready sources before trading a token.
    pub min_signals_required: usize,
    pub slippage_bps: u32,
}

impl Default for CompositeConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: Decimal::new(5, 1),
            position_usd: Decimal::from(50),
            max_positions: 5,
            exit_threshold: Decimal::ZERO,
            min_signals_required: 2,
            slippage_bps: 50,
        }
    }
}

/// Weighted multi-signal strategy with per-signal attribution.
pub struct CompositeStrategy {
    config: CompositeConfig,
    signals: Vec<Box<dyn SignalSource>>,
    /// token -> (entry price, signal values at entry)
    positions: FnvHashMap<SmolStr, (Decimal, FnvHashMap<SmolStr, Decimal>)>,
    attribution: FnvHashMap<SmolStr, SignalAttribution>,
}

impl std::fmt::Debug for CompositeStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeStrategy")
            .field("signals", &self.signals.len())
            .field("positions", &self.positions.len())
            .finish()
    }
}

impl CompositeStrategy {
    pub const NAME: &'static str = "composite";

    pub fn new(config: CompositeConfig, signals: Vec<Box<dyn SignalSource>>) -> Self {
        let attribution = signals
            .iter()
            .map(|signal| {
                (
                    signal.name(),
                    SignalAttribution {
                        name: signal.name(),
                        ..Default::default()
                    },
                )
            })
            .collect();
        Self {
            config,
            signals,
            positions: FnvHashMap::default(),
            attribution,
        }
    }

    /// The default source mix: momentum, mean reversion and volume.
    pub fn with_default_signals(config: CompositeConfig) -> Self {
        Self::new(
            config,
            vec![
                Box::new(MomentumSignal::new(10, Decimal::new(4, 1))),
                Box::new(MeanReversionSignal::new(20, Decimal::from(2), Decimal::new(3, 1))),
                Box::new(VolumeSignal::new(20, Decimal::new(25, 1), Decimal::new(3, 1))),
            ],
        )
    }

    pub fn open_positions(&self) -> usize {
        self.positions.len()
    }

    pub fn attribution(&self) -> &FnvHashMap<SmolStr, SignalAttribution> {
        &self.attribution
    }

    /// Weighted composite over the ready sources:
    /// `Σ value·confidence·weight / Σ confidence·weight`.
    fn compute_composite(&self, token: &SmolStr) -> (Decimal, FnvHashMap<SmolStr, Decimal>, usize) {
        let mut weighted_sum = Decimal::ZERO;
        let mut total_weight = Decimal::ZERO;
        let mut values = FnvHashMap::default();
        let mut ready = 0;

        for signal in &self.signals {
            if !signal.ready(token) {
                continue;
            }
            ready += 1;
            let Some(output) = signal.signal(token) else {
                continue;
            };
            weighted_sum += output.value * output.confidence * signal.weight();
            total_weight += signal.weight() * output.confidence;
            values.insert(output.name, output.value);
        }

        if total_weight <= Decimal::ZERO || ready < self.config.min_signals_required {
            return (Decimal::ZERO, values, ready);
        }
        (weighted_sum / total_weight, values, ready)
    }

    /// Attribution update at round-trip close: correctness is the realized
    /// P&L sign, not a score heuristic.
    fn record_attribution(
        &mut self,
        entry_signals: &FnvHashMap<SmolStr, Decimal>,
        trade_won: bool,
    ) {
        for (name, value) in entry_signals {
            let Some(attribution) = self.attribution.get_mut(name) else {
                continue;
            };
            attribution.total_calls += 1;
            attribution.total_contribution += *value;
            attribution.signal_sum += *value;
            attribution.avg_signal_at_entry =
                attribution.signal_sum / Decimal::from(attribution.total_calls);
            let called_long = *value > Decimal::ZERO;
            if called_long == trade_won {
                attribution.correct_calls += 1;
            }
        }
    }

    fn on_price(&mut self, update: &PriceUpdate, ctx: &StrategyCtx) {
        let token = &update.token;
        let price = update.price_usd;
        if price <= Decimal::ZERO {
            return;
        }

        for signal in &mut self.signals {
            signal.update(token, price, update.volume_24h);
        }

        let (composite, signal_values, _ready) = self.compute_composite(token);

        if let Some((entry_price, _)) = self.positions.get(token) {
            if composite <= self.config.exit_threshold {
                let entry_price = *entry_price;
                let (_, entry_signals) = self
                    .positions
                    .remove(token)
                    .unwrap_or((Decimal::ZERO, FnvHashMap::default()));
                let trade_won = price > entry_price;
                self.record_attribution(&entry_signals, trade_won);
                tracing::info!(%token, %composite, %price, trade_won, "composite exit");
                ctx.sell(token.clone(), Decimal::ZERO, self.config.slippage_bps);
            }
            return;
        }

        if self.positions.len() >= self.config.max_positions {
            return;
        }
        if composite >= self.config.consensus_threshold {
            tracing::info!(%token, %composite, %price, "composite entry");
            ctx.buy(token.clone(), self.config.position_usd, self.config.slippage_bps);
            self.positions
                .insert(token.clone(), (price, signal_values));
        }
    }
}

impl Strategy for CompositeStrategy {
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
        for attribution in self.attribution.values() {
            tracing::info!(
                signal = %attribution.name,
                calls = attribution.total_calls,
                accuracy = %attribution.accuracy().round_dp(2),
                avg_at_entry = %attribution.avg_signal_at_entry.round_dp(3),
                "signal attribution"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use martim_core::{bus::EventBus, clock::SimClock, event::OrderIntent, Side};
    use rust_decimal_macros::dec;
    use std::{cell::RefCell, rc::Rc};

    /// Deterministic source for wiring tests.
    struct FixedSignal {
        name: &'static str,
        weight: Decimal,
        value: Rc<RefCell<Decimal>>,
        ready: bool,
    }

    impl SignalSource for FixedSignal {
        fn name(&self) -> SmolStr {
            SmolStr::new_static(self.name)
        }

        fn weight(&self) -> Decimal {
            self.weight
        }

        fn update(&mut self, _token: &SmolStr, _price: Decimal, _volume: Decimal) {}

        fn ready(&self, _token: &SmolStr) -> bool {
            self.ready
        }

        fn signal(&self, _token: &SmolStr) -> Option<SignalOutput> {
            Some(SignalOutput {
                name: SmolStr::new_static(self.name),
                value: *self.value.borrow(),
                confidence: Decimal::ONE,
            })
        }
    }

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
            SmolStr::new_static(CompositeStrategy::NAME),
        );
        (ctx, orders)
    }

    fn tick(token: &str, price: Decimal) -> PriceUpdate {
        PriceUpdate {
            token: SmolStr::new(token),
            price_usd: price,
            volume_24h: dec!(1000),
            ..Default::default()
        }
    }

    fn strategy_with(
        signals: Vec<(&'static str, Decimal, Rc<RefCell<Decimal>>, bool)>,
    ) -> CompositeStrategy {
        CompositeStrategy::new(
            CompositeConfig {
                min_signals_required: 2,
                ..Default::default()
            },
            signals
                .into_iter()
                .map(|(name, weight, value, ready)| {
                    Box::new(FixedSignal {
                        name,
                        weight,
                        value,
                        ready,
                    }) as Box<dyn SignalSource>
                })
                .collect(),
        )
    }

    #[test]
    fn test_consensus_entry_and_exit_with_attribution() {
        let (ctx, orders) = ctx_and_orders();
        let a = Rc::new(RefCell::new(dec!(0.8)));
        let b = Rc::new(RefCell::new(dec!(0.6)));
        let mut strategy = strategy_with(vec![
            ("alpha", dec!(0.5), Rc::clone(&a), true),
            ("beta", dec!(0.5), Rc::clone(&b), true),
        ]);

        strategy.on_price(&tick("A", dec!(100)), &ctx);
        assert_eq!(strategy.open_positions(), 1);
        assert_eq!(orders.borrow()[0].side, Side::Buy);

        // signals collapse, price above entry => winning exit
        *a.borrow_mut() = dec!(-0.5);
        *b.borrow_mut() = dec!(-0.5);
        strategy.on_price(&tick("A", dec!(120)), &ctx);

        assert_eq!(strategy.open_positions(), 0);
        assert_eq!(orders.borrow()[1].side, Side::Sell);

        let attribution = strategy.attribution();
        let alpha = &attribution[&SmolStr::new_static("alpha")];
        assert_eq!(alpha.total_calls, 1);
        // positive call, price rose: correct
        assert_eq!(alpha.correct_calls, 1);
        assert_eq!(alpha.avg_signal_at_entry, dec!(0.8));
    }

    #[test]
    fn test_losing_exit_marks_positive_calls_incorrect() {
        let (ctx, _orders) = ctx_and_orders();
        let a = Rc::new(RefCell::new(dec!(0.9)));
        let b = Rc::new(RefCell::new(dec!(0.9)));
        let mut strategy = strategy_with(vec![
            ("alpha", dec!(0.5), Rc::clone(&a), true),
            ("beta", dec!(0.5), Rc::clone(&b), true),
        ]);

        strategy.on_price(&tick("A", dec!(100)), &ctx);
        *a.borrow_mut() = dec!(-1);
        *b.borrow_mut() = dec!(-1);
        strategy.on_price(&tick("A", dec!(80)), &ctx);

        let alpha = &strategy.attribution()[&SmolStr::new_static("alpha")];
        assert_eq!(alpha.total_calls, 1);
        assert_eq!(alpha.correct_calls, 0);
    }

    #[test]
    fn test_min_ready_signals_gate() {
        let (ctx, orders) = ctx_and_orders();
        let a = Rc::new(RefCell::new(dec!(1)));
        let b = Rc::new(RefCell::new(dec!(1)));
        let mut strategy = strategy_with(vec![
            ("alpha", dec!(0.5), a, true),
            ("beta", dec!(0.5), b, false), // never ready
        ]);

        strategy.on_price(&tick("A", dec!(100)), &ctx);

        assert_eq!(strategy.open_positions(), 0);
        assert!(orders.borrow().is_empty());
    }

    #[test]
    fn test_weighting_respects_confidence_and_weight() {
        let (ctx, _orders) = ctx_and_orders();
        // strong bullish low-weight vs mild bearish high-weight
        let bull = Rc::new(RefCell::new(dec!(1)));
        let bear = Rc::new(RefCell::new(dec!(-0.2)));
        let mut strategy = strategy_with(vec![
            ("bull", dec!(0.2), bull, true),
            ("bear", dec!(0.8), bear, true),
        ]);

        // composite = (1*0.2 - 0.2*0.8) / 1.0 = 0.04 < 0.5 threshold
        strategy.on_price(&tick("A", dec!(100)), &ctx);
        assert_eq!(strategy.open_positions(), 0);
    }

    #[test]
    fn test_max_positions_cap() {
        let (ctx, _orders) = ctx_and_orders();
        let a = Rc::new(RefCell::new(dec!(1)));
        let b = Rc::new(RefCell::new(dec!(1)));
        let mut strategy = CompositeStrategy::new(
            CompositeConfig {
                max_positions: 1,
                min_signals_required: 2,
                ..Default::default()
            },
            vec![
                Box::new(FixedSignal {
                    name: "alpha",
                    weight: dec!(0.5),
                    value: a,
                    ready: true,
                }),
                Box::new(FixedSignal {
                    name: "beta",
                    weight: dec!(0.5),
                    value: b,
                    ready: true,
                }),
            ],
        );

        strategy.on_price(&tick("A", dec!(100)), &ctx);
        strategy.on_price(&tick("B", dec!(100)), &ctx);

        assert_eq!(strategy.open_positions(), 1);
    }

    #[test]
    fn test_built_in_momentum_signal() {
        let mut signal = MomentumSignal::new(3, dec!(1));
        let token = SmolStr::new("A");

        for price in [100, 100, 100, 120] {
            signal.update(&token, Decimal::from(price), Decimal::ZERO);
        }

        assert!(signal.ready(&token));
        let output = signal.signal(&token).unwrap();
        // roc = 0.2, scaled x5 = 1.0
        assert_eq!(output.value, Decimal::ONE);
        assert!(output.confidence > Decimal::ZERO);
    }

    #[test]
    fn test_built_in_mean_reversion_signal_inverts_z() {
        let mut signal = MeanReversionSignal::new(4, dec!(2), dec!(1));
        let token = SmolStr::new("A");

        for price in [100, 101, 99, 60] {
            signal.update(&token, Decimal::from(price), Decimal::ZERO);
        }

        let output = signal.signal(&token).unwrap();
        // deeply oversold => positive buy signal
        assert!(output.value > Decimal::ZERO);
    }

    #[test]
    fn test_built_in_volume_signal_is_non_negative() {
        let mut signal = VolumeSignal::new(4, dec!(2), dec!(1));
        let token = SmolStr::new("A");

        for volume in [1000, 1000, 1000, 100] {
            signal.update(&token, Decimal::ZERO, Decimal::from(volume));
        }

        // volume collapse clamps at zero rather than going negative
        let output = signal.signal(&token).unwrap();
        assert_eq!(output.value, Decimal::ZERO);
    }

    #[test]
    fn test_default_signal_mix_constructs() {
        let strategy = CompositeStrategy::with_default_signals(CompositeConfig::default());
        assert_eq!(strategy.attribution().len(), 3);
    }
}
