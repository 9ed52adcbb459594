// Mini-Disclaimer: Educational/experimental use; not investment advice or affiliation; see README & DISCLAIMER.
//! Central event routing.
//!
//! Handlers subscribe to one [`EventKind`] and are invoked synchronously in
//! subscription order. A handler publishing from inside a dispatch is
//! serviced from an internal FIFO that is drained between handlers, so the
//! observable ordering stays depth-first: everything a handler publishes is
//! fully dispatched before the next handler of the same event runs, and the
//! outermost `publish` does not return until the chain is drained. This is
//! what makes a backtest tick-for-tick identical to live dispatch.

use crate::event::{ErrorEvent, Event, EventKind, EventPayload};
use fnv::FnvHashMap;
use smol_str::SmolStr;
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};
use thiserror::Error;

/// Failure returned by an event handler. Counted and surfaced as an
/// [`EventKind::Error`] event; never fatal to the dispatch chain.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("{message}")]
pub struct HandlerError {
    pub message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type HandlerResult = Result<(), HandlerError>;

type Handler = Rc<RefCell<dyn FnMut(&Event) -> HandlerResult>>;

/// Opaque registration token returned by [`EventBus::subscribe`].
///
/// Closures have no identity in Rust, so unsubscription is by token.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct HandlerId(u64);

/// Bus counters exposed for status reporting and tests.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default)]
pub struct BusStats {
    pub events_processed: u64,
    pub handler_errors: u64,
    pub subscriptions: usize,
}

/// Synchronous single-threaded publish-subscribe dispatcher.
pub struct EventBus {
    handlers: RefCell<FnvHashMap<EventKind, Vec<(HandlerId, Handler)>>>,
    pending: RefCell<VecDeque<Event>>,
    dispatching: Cell<bool>,
    next_id: Cell<u64>,
    events_processed: Cell<u64>,
    handler_errors: Cell<u64>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: RefCell::new(FnvHashMap::default()),
            pending: RefCell::new(VecDeque::new()),
            dispatching: Cell::new(false),
            next_id: Cell::new(0),
            events_processed: Cell::new(0),
            handler_errors: Cell::new(0),
        }
    }

    /// Registers a handler for an event kind. Duplicates are allowed; the
    /// returned [`HandlerId`] identifies this registration.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: FnMut(&Event) -> HandlerResult + 'static,
    {
        let id = HandlerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, Rc::new(RefCell::new(handler))));
        id
    }

    /// Removes the registration identified by `id`. Returns whether a
    /// handler was removed.
    pub fn unsubscribe(&self, kind: EventKind, id: HandlerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let Some(registered) = handlers.get_mut(&kind) else {
            return false;
        };
        let Some(index) = registered.iter().position(|(hid, _)| *hid == id) else {
            return false;
        };
        registered.remove(index);
        true
    }

    /// Dispatches an event to every handler currently subscribed to its
    /// kind, in subscription order, before returning.
    ///
    /// When called from inside a handler the event is queued and dispatched
    /// as soon as the publishing handler returns (see module docs).
    pub fn publish(&self, event: Event) {
        if self.dispatching.get() {
            self.pending.borrow_mut().push_back(event);
            return;
        }

        self.dispatching.set(true);
        self.dispatch(event);
        self.dispatching.set(false);
    }

    fn dispatch(&self, event: Event) {
        self.events_processed.set(self.events_processed.get() + 1);

        // Snapshot so that handlers may (un)subscribe without invalidating
        // this dispatch.
        let handlers: Vec<Handler> = self
            .handlers
            .borrow()
            .get(&event.kind())
            .map(|registered| registered.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default();

        for handler in handlers {
            let outcome = match handler.try_borrow_mut() {
                Ok(mut callback) => callback(&event),
                Err(_) => Err(HandlerError::new("handler re-entered during dispatch")),
            };

            if let Err(error) = outcome {
                self.handler_errors.set(self.handler_errors.get() + 1);
                tracing::error!(kind = %event.kind(), source = %event.source(), %error, "event handler failed");
                // Surface the failure on the bus itself, except for failures
                // of error-kind handlers (would loop).
                if event.kind() != EventKind::Error {
                    self.pending.borrow_mut().push_back(Event::new(
                        EventPayload::Error(ErrorEvent {
                            message: error.message,
                            origin: event.source().clone(),
                            origin_kind: Some(event.kind()),
                        }),
                        event.timestamp_ns(),
                        SmolStr::new_static("bus"),
                    ));
                }
            }

            // Depth-first drain: everything this handler published runs
            // before the next handler of `event`.
            loop {
                let next = self.pending.borrow_mut().pop_front();
                match next {
                    Some(next) => self.dispatch(next),
                    None => break,
                }
            }
        }
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            events_processed: self.events_processed.get(),
            handler_errors: self.handler_errors.get(),
            subscriptions: self.handlers.borrow().values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{PriceUpdate, SignalPayload};
    use rust_decimal_macros::dec;

    fn heartbeat() -> Event {
        Event::new(
            EventPayload::Heartbeat(Default::default()),
            0,
            SmolStr::new("test"),
        )
    }

    fn price(token: &str, price: rust_decimal::Decimal) -> Event {
        Event::new(
            EventPayload::PriceUpdate(PriceUpdate {
                token: SmolStr::new(token),
                price_usd: price,
                ..Default::default()
            }),
            0,
            SmolStr::new("test"),
        )
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        for label in ["a", "b", "c"] {
            let order = Rc::clone(&order);
            bus.subscribe(EventKind::Heartbeat, move |_| {
                order.borrow_mut().push(label);
                Ok(())
            });
        }
        bus.publish(heartbeat());

        assert_eq!(*order.borrow(), vec!["a", "b", "c"]);
        let stats = bus.stats();
        assert_eq!(stats.events_processed, 1);
        assert_eq!(stats.handler_errors, 0);
        assert_eq!(stats.subscriptions, 3);
    }

    #[test]
    fn test_kind_filtering() {
        let bus = EventBus::new();
        let received = Rc::new(Cell::new(0u32));

        let counter = Rc::clone(&received);
        bus.subscribe(EventKind::PriceUpdate, move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        bus.publish(heartbeat());
        bus.publish(price("SOL", dec!(150)));
        bus.publish(Event::new(
            EventPayload::Signal(SignalPayload::Graduation(Default::default())),
            0,
            SmolStr::new("test"),
        ));

        assert_eq!(received.get(), 1);
    }

    #[test]
    fn test_unsubscribe_removes_single_registration() {
        let bus = EventBus::new();
        let received = Rc::new(Cell::new(0u32));

        let counter = Rc::clone(&received);
        let id = bus.subscribe(EventKind::Heartbeat, move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        let counter = Rc::clone(&received);
        bus.subscribe(EventKind::Heartbeat, move |_| {
            counter.set(counter.get() + 10);
            Ok(())
        });

        assert!(bus.unsubscribe(EventKind::Heartbeat, id));
        assert!(!bus.unsubscribe(EventKind::Heartbeat, id));
        bus.publish(heartbeat());

        assert_eq!(received.get(), 10);
    }

    #[test]
    fn test_failing_handler_does_not_stop_the_chain() {
        let bus = EventBus::new();
        let received = Rc::new(Cell::new(0u32));
        let errors_seen = Rc::new(Cell::new(0u32));

        bus.subscribe(EventKind::Heartbeat, |_| Err(HandlerError::new("broken")));
        let counter = Rc::clone(&received);
        bus.subscribe(EventKind::Heartbeat, move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });
        let errors = Rc::clone(&errors_seen);
        bus.subscribe(EventKind::Error, move |event| {
            if let EventPayload::Error(e) = event.payload() {
                assert_eq!(e.message, "broken");
                assert_eq!(e.origin_kind, Some(EventKind::Heartbeat));
            }
            errors.set(errors.get() + 1);
            Ok(())
        });

        for _ in 0..3 {
            bus.publish(heartbeat());
        }

        assert_eq!(received.get(), 3);
        assert_eq!(errors_seen.get(), 3);
        assert_eq!(bus.stats().handler_errors, 3);
    }

    #[test]
    fn test_error_handler_failure_is_not_republished() {
        let bus = EventBus::new();

        bus.subscribe(EventKind::Heartbeat, |_| Err(HandlerError::new("first")));
        bus.subscribe(EventKind::Error, |_| Err(HandlerError::new("second")));

        bus.publish(heartbeat());

        // heartbeat failure + error-handler failure, but no error cascade
        assert_eq!(bus.stats().handler_errors, 2);
        assert_eq!(bus.stats().events_processed, 2);
    }

    #[test]
    fn test_nested_publish_completes_before_next_handler() {
        let bus = Rc::new(EventBus::new());
        let order = Rc::new(RefCell::new(Vec::new()));

        // Handler A publishes a nested price-update; its consumer must run
        // before handler B of the outer event.
        let log = Rc::clone(&order);
        let nested_bus = Rc::clone(&bus);
        bus.subscribe(EventKind::Heartbeat, move |_| {
            log.borrow_mut().push("outer-a");
            nested_bus.publish(price("SOL", dec!(1)));
            log.borrow_mut().push("outer-a-done");
            Ok(())
        });
        let log = Rc::clone(&order);
        bus.subscribe(EventKind::PriceUpdate, move |_| {
            log.borrow_mut().push("nested");
            Ok(())
        });
        let log = Rc::clone(&order);
        bus.subscribe(EventKind::Heartbeat, move |_| {
            log.borrow_mut().push("outer-b");
            Ok(())
        });

        bus.publish(heartbeat());

        assert_eq!(
            *order.borrow(),
            vec!["outer-a", "outer-a-done", "nested", "outer-b"]
        );
    }

    #[test]
    fn test_publish_chain_drains_fully_before_returning() {
        let bus = Rc::new(EventBus::new());
        let depth = Rc::new(Cell::new(0u32));

        // price-update -> order-submitted -> order-filled, three layers deep
        let b = Rc::clone(&bus);
        bus.subscribe(EventKind::PriceUpdate, move |event| {
            b.publish(Event::new(
                EventPayload::OrderSubmitted(Default::default()),
                event.timestamp_ns(),
                SmolStr::new("strategy"),
            ));
            Ok(())
        });
        let b = Rc::clone(&bus);
        bus.subscribe(EventKind::OrderSubmitted, move |event| {
            b.publish(Event::new(
                EventPayload::OrderFilled(Default::default()),
                event.timestamp_ns(),
                SmolStr::new("paper"),
            ));
            Ok(())
        });
        let counter = Rc::clone(&depth);
        bus.subscribe(EventKind::OrderFilled, move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        bus.publish(price("MINT", dec!(0.001)));

        assert_eq!(depth.get(), 1);
        assert_eq!(bus.stats().events_processed, 3);
    }
}
