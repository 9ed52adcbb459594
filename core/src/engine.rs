// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Engine orchestrator.
//!
//! Owns the bus, clock and component lifetimes. Components are registered
//! before `run`; the engine connects adapters and feeds concurrently,
//! starts strategies in registration order, then parks in a 100 ms
//! heartbeat loop until shutdown is requested (ctrl-c or
//! [`ShutdownFlag::request`]).
//!
//! The engine itself is mode-agnostic: `live`, `paper` and `backtest` differ
//! only in which adapters and feeds get registered.

use crate::{
    adapter::{ExecutionAdapter, MarketFeed},
    bus::EventBus,
    clock::{EngineClock, LiveClock},
    error::MartimError,
    event::{EngineStatus, Event, EventPayload},
    shutdown::ShutdownFlag,
    strategy::{bind_strategy, OrderGate, Strategy, StrategyCtx},
};
use smol_str::SmolStr;
use std::{cell::RefCell, rc::Rc, str::FromStr, time::Duration};

/// Execution mode. Strategy code never branches on this.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum EngineMode {
    Live,
    Paper,
    Backtest,
}

impl EngineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Paper => "paper",
            Self::Backtest => "backtest",
        }
    }
}

impl std::fmt::Display for EngineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineMode {
    type Err = MartimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(Self::Live),
            "paper" => Ok(Self::Paper),
            "backtest" => Ok(Self::Backtest),
            other => Err(MartimError::InvalidMode(other.to_owned())),
        }
    }
}

/// Core trading engine: wiring, concurrent connect, heartbeat, shutdown.
pub struct Engine {
    mode: EngineMode,
    bus: Rc<EventBus>,
    clock: Rc<dyn EngineClock>,
    gate: Option<Rc<dyn OrderGate>>,
    adapters: Vec<Rc<dyn ExecutionAdapter>>,
    feeds: Vec<Rc<dyn MarketFeed>>,
    strategies: Vec<(SmolStr, Rc<RefCell<dyn Strategy>>)>,
    shutdown: Rc<ShutdownFlag>,
    started_at_ns: i64,
    running: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("mode", &self.mode)
            .field("adapters", &self.adapters.len())
            .field("feeds", &self.feeds.len())
            .field("strategies", &self.strategies.len())
            .field("running", &self.running)
            .finish()
    }
}

impl Engine {
    pub fn new(mode: EngineMode) -> Self {
        Self::with_clock(mode, Rc::new(LiveClock))
    }

    pub fn with_clock(mode: EngineMode, clock: Rc<dyn EngineClock>) -> Self {
        tracing::info!(%mode, "martim engine initialised");
        Self {
            mode,
            bus: Rc::new(EventBus::new()),
            clock,
            gate: None,
            adapters: Vec::new(),
            feeds: Vec::new(),
            strategies: Vec::new(),
            shutdown: Rc::new(ShutdownFlag::default()),
            started_at_ns: 0,
            running: false,
        }
    }

    /// Installs the pre-trade risk gate consulted by every strategy context.
    pub fn with_order_gate(mut self, gate: Rc<dyn OrderGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn bus(&self) -> &Rc<EventBus> {
        &self.bus
    }

    pub fn clock(&self) -> &Rc<dyn EngineClock> {
        &self.clock
    }

    pub fn mode(&self) -> EngineMode {
        self.mode
    }

    /// Handle components can use to request shutdown.
    pub fn shutdown_handle(&self) -> Rc<ShutdownFlag> {
        Rc::clone(&self.shutdown)
    }

    pub fn add_adapter(&mut self, adapter: Rc<dyn ExecutionAdapter>) {
        tracing::info!(adapter = %adapter.name(), "adapter registered");
        self.adapters.push(adapter);
    }

    pub fn add_feed(&mut self, feed: Rc<dyn MarketFeed>) {
        tracing::info!(feed = %feed.name(), "data feed registered");
        self.feeds.push(feed);
    }

    pub fn add_strategy(&mut self, strategy: Rc<RefCell<dyn Strategy>>) {
        let name = strategy.borrow().name();
        tracing::info!(strategy = %name, "strategy registered");
        self.strategies.push((name, strategy));
    }

    pub fn status(&self) -> EngineStatus {
        let stats = self.bus.stats();
        let uptime_ms = if self.started_at_ns > 0 {
            (self.clock.now_ns() - self.started_at_ns) / 1_000_000
        } else {
            0
        };
        EngineStatus {
            mode: SmolStr::new_static(self.mode.as_str()),
            running: self.running,
            uptime_ms,
            adapters: self.adapters.len() as u32,
            feeds: self.feeds.len() as u32,
            strategies: self.strategies.len() as u32,
            events_processed: stats.events_processed,
            handler_errors: stats.handler_errors,
        }
    }

    /// Runs the engine until shutdown is requested.
    pub async fn run(&mut self) -> Result<(), MartimError> {
        self.running = true;
        self.started_at_ns = self.clock.now_ns();
        self.publish(EventPayload::EngineStart {
            mode: SmolStr::new_static(self.mode.as_str()),
        });

        self.connect_all().await;

        // Bind and start strategies in registration order.
        let mut contexts = Vec::with_capacity(self.strategies.len());
        for (name, strategy) in &self.strategies {
            let mut ctx =
                StrategyCtx::new(Rc::clone(&self.bus), Rc::clone(&self.clock), name.clone());
            if let Some(gate) = &self.gate {
                ctx = ctx.with_gate(Rc::clone(gate));
            }
            let ctx = Rc::new(ctx);
            bind_strategy(&self.bus, strategy, &ctx);
            strategy.borrow_mut().on_start(&ctx);
            contexts.push(ctx);
        }

        tracing::info!(
            adapters = self.adapters.len(),
            feeds = self.feeds.len(),
            strategies = self.strategies.len(),
            "engine running"
        );

        self.heartbeat_loop().await;

        // Shutdown protocol: strategies, then transports, then the stop event.
        for ((_, strategy), ctx) in self.strategies.iter().zip(&contexts) {
            strategy.borrow_mut().on_stop(ctx);
        }
        self.disconnect_all().await;

        self.publish(EventPayload::EngineStop);
        self.running = false;
        tracing::info!(stats = ?self.bus.stats(), "engine stopped");
        Ok(())
    }

    /// Connects every adapter and feed concurrently; failures are collected
    /// and logged, never propagated, so one bad venue cannot hold the engine
    /// hostage.
    async fn connect_all(&self) {
        let adapter_connects = futures::future::join_all(
            self.adapters
                .iter()
                .map(|adapter| adapter.connect(Rc::clone(&self.bus))),
        );
        let feed_connects = futures::future::join_all(
            self.feeds.iter().map(|feed| feed.connect(Rc::clone(&self.bus))),
        );
        let (adapter_results, feed_results) =
            futures::future::join(adapter_connects, feed_connects).await;

        for (adapter, result) in self.adapters.iter().zip(adapter_results) {
            if let Err(error) = result {
                tracing::warn!(adapter = %adapter.name(), %error, "adapter connect failed");
            }
        }
        for (feed, result) in self.feeds.iter().zip(feed_results) {
            if let Err(error) = result {
                tracing::warn!(feed = %feed.name(), %error, "feed connect failed");
            }
        }
    }

    async fn disconnect_all(&self) {
        for adapter in &self.adapters {
            if let Err(error) = adapter.disconnect().await {
                tracing::warn!(adapter = %adapter.name(), %error, "adapter disconnect failed");
            }
        }
        for feed in &self.feeds {
            if let Err(error) = feed.disconnect().await {
                tracing::warn!(feed = %feed.name(), %error, "feed disconnect failed");
            }
        }
    }

    /// Parks until shutdown, publishing a heartbeat every 100 ms.
    async fn heartbeat_loop(&self) {
        let mut interval = tokio::time::interval(Duration::from_millis(100));
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    tracing::info!("termination signal received");
                    self.shutdown.request();
                    break;
                }
                _ = self.shutdown.notified() => break,
                _ = interval.tick() => {
                    self.publish(EventPayload::Heartbeat(self.status()));
                }
            }
        }
    }

    fn publish(&self, payload: EventPayload) {
        self.bus.publish(Event::new(
            payload,
            self.clock.now_ns(),
            SmolStr::new_static("engine"),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        adapter::{AdapterError, FeedError},
        event::EventKind,
    };
    use async_trait::async_trait;
    use std::cell::Cell;

    #[derive(Debug, Default)]
    struct StubAdapter {
        connected: Cell<bool>,
        fail_connect: bool,
    }

    #[async_trait(?Send)]
    impl ExecutionAdapter for StubAdapter {
        fn name(&self) -> SmolStr {
            SmolStr::new_static("stub")
        }

        async fn connect(&self, _bus: Rc<EventBus>) -> Result<(), AdapterError> {
            if self.fail_connect {
                return Err(AdapterError::SubmitFailed(SmolStr::new_static("refused")));
            }
            self.connected.set(true);
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), AdapterError> {
            self.connected.set(false);
            Ok(())
        }

        async fn submit_order(
            &self,
            _intent: &crate::event::OrderIntent,
        ) -> Result<SmolStr, AdapterError> {
            Err(AdapterError::NotConnected)
        }

        fn is_connected(&self) -> bool {
            self.connected.get()
        }
    }

    #[derive(Debug, Default)]
    struct StubFeed {
        connected: Cell<bool>,
    }

    #[async_trait(?Send)]
    impl MarketFeed for StubFeed {
        fn name(&self) -> SmolStr {
            SmolStr::new_static("stub-feed")
        }

        async fn connect(&self, _bus: Rc<EventBus>) -> Result<(), FeedError> {
            self.connected.set(true);
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), FeedError> {
            self.connected.set(false);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected.get()
        }
    }

    struct Lifecycle {
        started: Rc<Cell<bool>>,
        stopped: Rc<Cell<bool>>,
    }

    impl Strategy for Lifecycle {
        fn name(&self) -> SmolStr {
            SmolStr::new_static("lifecycle")
        }

        fn subscriptions(&self) -> &'static [EventKind] {
            &[EventKind::PriceUpdate]
        }

        fn on_start(&mut self, _ctx: &StrategyCtx) {
            self.started.set(true);
        }

        fn on_stop(&mut self, _ctx: &StrategyCtx) {
            self.stopped.set(true);
        }

        fn on_event(&mut self, _event: &Event, _ctx: &StrategyCtx) {}
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("live".parse::<EngineMode>().unwrap(), EngineMode::Live);
        assert_eq!("paper".parse::<EngineMode>().unwrap(), EngineMode::Paper);
        assert_eq!(
            "backtest".parse::<EngineMode>().unwrap(),
            EngineMode::Backtest
        );
        assert!(matches!(
            "turbo".parse::<EngineMode>(),
            Err(MartimError::InvalidMode(_))
        ));
    }

    #[tokio::test]
    async fn test_engine_lifecycle_events_and_hooks() {
        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let mut engine = Engine::new(EngineMode::Paper);
                let started = Rc::new(Cell::new(false));
                let stopped = Rc::new(Cell::new(false));
                let start_events = Rc::new(Cell::new(0u32));
                let stop_events = Rc::new(Cell::new(0u32));

                let adapter = Rc::new(StubAdapter::default());
                let failing = Rc::new(StubAdapter {
                    fail_connect: true,
                    ..Default::default()
                });
                let feed = Rc::new(StubFeed::default());
                engine.add_adapter(Rc::clone(&adapter) as Rc<dyn ExecutionAdapter>);
                engine.add_adapter(Rc::clone(&failing) as Rc<dyn ExecutionAdapter>);
                engine.add_feed(Rc::clone(&feed) as Rc<dyn MarketFeed>);
                engine.add_strategy(Rc::new(RefCell::new(Lifecycle {
                    started: Rc::clone(&started),
                    stopped: Rc::clone(&stopped),
                })));

                let counter = Rc::clone(&start_events);
                engine.bus().subscribe(EventKind::EngineStart, move |_| {
                    counter.set(counter.get() + 1);
                    Ok(())
                });
                let counter = Rc::clone(&stop_events);
                engine.bus().subscribe(EventKind::EngineStop, move |_| {
                    counter.set(counter.get() + 1);
                    Ok(())
                });

                let shutdown = engine.shutdown_handle();
                tokio::task::spawn_local(async move {
                    tokio::time::sleep(Duration::from_millis(250)).await;
                    shutdown.request();
                });

                engine.run().await.unwrap();

                assert_eq!(start_events.get(), 1);
                assert_eq!(stop_events.get(), 1);
                assert!(started.get());
                assert!(stopped.get());
                // one connect failure must not prevent the other components
                assert!(!failing.is_connected());
                assert!(!adapter.is_connected()); // disconnected at shutdown
                assert!(!feed.is_connected());
            })
            .await;
    }
}
