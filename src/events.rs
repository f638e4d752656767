//! Named-event bus
//!
//! Handlers are registered against an event name and run synchronously, in
//! registration order, whenever that event is triggered. Handlers registered
//! under [`WILDCARD`] receive every event.
//!
//! A bus whose payload is `Clone` can be corked: triggered events are then
//! queued instead of delivered, until [`Events::uncork`] releases them in
//! emission order or [`Events::discard`] drops them.
//!
//! ```rust
//! use sql_dbal::prelude::*;
//!
//! let mut bus: Events<Vec<String>> = Events::new();
//! bus.register("saved", |name, log| {
//!     log.push(name.to_string());
//!     Ok(())
//! });
//!
//! let mut log = Vec::new();
//! bus.cork();
//! bus.trigger("saved", &mut log)?;
//! assert!(log.is_empty());
//! assert_eq!(bus.queued(), 1);
//! bus.uncork()?;
//! # Ok::<(), DbalError>(())
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::error::DbalError;

/// Event name whose handlers receive every event.
pub const WILDCARD: &str = "*";

/// A registered event handler.
pub type Handler<T> = Box<dyn FnMut(&str, &mut T) -> Result<(), DbalError>>;

// shared so a dispatch can run without borrowing the bus that owns it
type Slot<T> = Rc<RefCell<Handler<T>>>;

pub struct Events<T> {
    handlers: Vec<(String, Slot<T>)>,
    // set while corked; copies payloads passed by reference into the queue
    corked: Option<fn(&T) -> T>,
    queue: VecDeque<(String, T)>,
}

impl<T> Default for Events<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Events<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
            corked: None,
            queue: VecDeque::new(),
        }
    }

    /// Append a handler for `event`.
    pub fn register<F>(&mut self, event: &str, handler: F) -> &mut Self
    where
        F: FnMut(&str, &mut T) -> Result<(), DbalError> + 'static,
    {
        self.handlers.push((event.to_string(), slot(handler)));
        self
    }

    /// Register a handler for `event` ahead of every existing handler.
    pub fn prepend<F>(&mut self, event: &str, handler: F) -> &mut Self
    where
        F: FnMut(&str, &mut T) -> Result<(), DbalError> + 'static,
    {
        self.handlers.insert(0, (event.to_string(), slot(handler)));
        self
    }

    /// Remove every handler registered for `event`.
    pub fn unregister(&mut self, event: &str) -> &mut Self {
        self.handlers.retain(|(name, _)| name != event);
        self
    }

    /// Number of handlers that would run for `event`, wildcard handlers included.
    #[must_use]
    pub fn listeners(&self, event: &str) -> usize {
        self.handlers
            .iter()
            .filter(|(name, _)| name == event || name == WILDCARD)
            .count()
    }

    #[must_use]
    pub fn is_corked(&self) -> bool {
        self.corked.is_some()
    }

    /// Number of events held by the cork.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Deliver `event` to its handlers, or queue a copy of the payload while corked.
    ///
    /// # Errors
    /// Returns the first handler error; later handlers for the event do not run.
    /// A handler that triggers its own event again fails with `DbalError::Other`.
    pub fn trigger(&mut self, event: &str, payload: &mut T) -> Result<(), DbalError> {
        if let Some(copy) = self.corked {
            self.queue.push_back((event.to_string(), copy(payload)));
            return Ok(());
        }
        dispatch(self.matching(event), event, payload)
    }

    /// Trigger `event` with an owned payload.
    ///
    /// # Errors
    /// Returns the first handler error.
    pub fn emit(&mut self, event: &str, mut payload: T) -> Result<(), DbalError> {
        if self.corked.is_some() {
            self.queue.push_back((event.to_string(), payload));
            return Ok(());
        }
        dispatch(self.matching(event), event, &mut payload)
    }

    /// Stop delivering events; hold them until uncorked.
    pub fn cork(&mut self) -> &mut Self
    where
        T: Clone,
    {
        self.corked = Some(<T as Clone>::clone);
        self
    }

    /// Deliver held events in the order they were triggered, then resume
    /// normal delivery.
    ///
    /// # Errors
    /// Returns the first handler error. The failing event is dropped; events
    /// behind it stay queued for the next `uncork`.
    pub fn uncork(&mut self) -> Result<&mut Self, DbalError> {
        self.corked = None;
        while let Some((event, mut payload)) = self.queue.pop_front() {
            dispatch(self.matching(&event), &event, &mut payload)?;
        }
        Ok(self)
    }

    /// [`uncork`](Self::uncork) for a bus behind a `RefCell`.
    ///
    /// The bus is only borrowed to take each held event, so handlers may
    /// borrow it again and emit follow-up events, which are delivered
    /// immediately.
    ///
    /// # Errors
    /// Returns the first handler error; events behind it stay queued.
    pub fn uncork_shared(bus: &RefCell<Self>) -> Result<(), DbalError> {
        bus.borrow_mut().corked = None;
        loop {
            let next = {
                let mut bus = bus.borrow_mut();
                match bus.queue.pop_front() {
                    Some((event, payload)) => {
                        let handlers = bus.matching(&event);
                        Some((event, payload, handlers))
                    }
                    None => None,
                }
            };
            let Some((event, mut payload, handlers)) = next else {
                return Ok(());
            };
            dispatch(handlers, &event, &mut payload)?;
        }
    }

    /// Drop every held event. The bus stays corked.
    pub fn discard(&mut self) -> &mut Self {
        self.queue.clear();
        self
    }

    fn matching(&self, event: &str) -> Vec<Slot<T>> {
        self.handlers
            .iter()
            .filter(|(name, _)| name == event || name == WILDCARD)
            .map(|(_, handler)| Rc::clone(handler))
            .collect()
    }
}

fn slot<T, F>(handler: F) -> Slot<T>
where
    F: FnMut(&str, &mut T) -> Result<(), DbalError> + 'static,
{
    Rc::new(RefCell::new(Box::new(handler)))
}

fn dispatch<T>(handlers: Vec<Slot<T>>, event: &str, payload: &mut T) -> Result<(), DbalError> {
    for handler in handlers {
        let mut handler = handler
            .try_borrow_mut()
            .map_err(|_| DbalError::Other(format!("handler for {event} re-entered itself")))?;
        (*handler)(event, payload)?;
    }
    Ok(())
}

impl<T> fmt::Debug for Events<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("Events")
            .field("handlers", &names)
            .field("corked", &self.is_corked())
            .field("queued", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(bus: &mut Events<Vec<String>>, event: &str, tag: &'static str) {
        bus.register(event, move |name, log| {
            log.push(format!("{tag}:{name}"));
            Ok(())
        });
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let mut bus = Events::new();
        recorder(&mut bus, "a", "first");
        recorder(&mut bus, "a", "second");
        recorder(&mut bus, "b", "other");
        let mut log = Vec::new();
        bus.trigger("a", &mut log).unwrap();
        assert_eq!(log, vec!["first:a", "second:a"]);
    }

    #[test]
    fn prepend_and_wildcard() {
        let mut bus = Events::new();
        recorder(&mut bus, "a", "late");
        recorder(&mut bus, WILDCARD, "all");
        bus.prepend("a", |_, log: &mut Vec<String>| {
            log.push("early".into());
            Ok(())
        });
        let mut log = Vec::new();
        bus.trigger("a", &mut log).unwrap();
        bus.trigger("z", &mut log).unwrap();
        assert_eq!(log, vec!["early", "late:a", "all:a", "all:z"]);
        assert_eq!(bus.listeners("a"), 3);
    }

    #[test]
    fn unregister_removes_all_for_name() {
        let mut bus = Events::new();
        recorder(&mut bus, "a", "x");
        recorder(&mut bus, "a", "y");
        bus.unregister("a");
        let mut log = Vec::new();
        bus.trigger("a", &mut log).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn cork_queues_and_uncork_releases_in_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut bus: Events<i64> = Events::new();
        let sink = seen.clone();
        bus.register(WILDCARD, move |name, n| {
            sink.borrow_mut().push(format!("{name}={n}"));
            Ok(())
        });
        bus.cork();
        bus.emit("one", 1).unwrap();
        bus.trigger("two", &mut 2).unwrap();
        assert!(seen.borrow().is_empty());
        bus.uncork().unwrap();
        assert_eq!(*seen.borrow(), vec!["one=1", "two=2"]);
        assert!(!bus.is_corked());
    }

    #[test]
    fn discard_drops_held_events() {
        let mut bus: Events<i64> = Events::new();
        bus.register("x", |_, _| Err(DbalError::Other("should not run".into())));
        bus.cork().emit("x", 1).unwrap();
        bus.discard();
        assert_eq!(bus.queued(), 0);
        bus.uncork().unwrap();
    }

    #[test]
    fn shared_uncork_lets_handlers_emit_on_the_same_bus() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let bus: Rc<RefCell<Events<i64>>> = Rc::new(RefCell::new(Events::new()));
        let (sink, again) = (Rc::clone(&seen), Rc::clone(&bus));
        bus.borrow_mut()
            .register("saved", move |_, id| again.borrow_mut().emit("indexed", *id))
            .register(WILDCARD, move |name, id| {
                sink.borrow_mut().push(format!("{name}={id}"));
                Ok(())
            });

        bus.borrow_mut().cork().emit("saved", 1).unwrap();
        bus.borrow_mut().emit("saved", 2).unwrap();
        Events::uncork_shared(&bus).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec!["indexed=1", "saved=1", "indexed=2", "saved=2"]
        );
        assert!(!bus.borrow().is_corked());
    }

    #[test]
    fn reentrant_handler_is_an_error() {
        let bus: Rc<RefCell<Events<i64>>> = Rc::new(RefCell::new(Events::new()));
        let again = Rc::clone(&bus);
        bus.borrow_mut()
            .register("loop", move |_, n| again.borrow_mut().emit("loop", *n));
        bus.borrow_mut().cork().emit("loop", 1).unwrap();
        let err = Events::uncork_shared(&bus).unwrap_err();
        assert!(err.to_string().contains("re-entered"));
    }

    #[test]
    fn failing_handler_leaves_rest_queued() {
        let mut bus: Events<i64> = Events::new();
        bus.register("bad", |_, _| Err(DbalError::Other("boom".into())));
        bus.cork();
        bus.emit("bad", 1).unwrap();
        bus.emit("fine", 2).unwrap();
        assert!(bus.uncork().is_err());
        assert_eq!(bus.queued(), 1);
        bus.uncork().unwrap();
        assert_eq!(bus.queued(), 0);
    }
}
