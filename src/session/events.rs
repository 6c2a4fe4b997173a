//! Lifecycle events and their dispatch.

use std::fmt;

/// Externally observable lifecycle events.
///
/// Emitted transiently - dispatched to the registered observer and not
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Broker session established and all subscriptions are up.
    Connect,
    /// Broker session lost; the engine is reconnecting.
    Disconnect,
    /// Initial state reconciliation completed.
    Sync,
}

/// Dispatches lifecycle events to a single registered observer.
///
/// Dispatch is synchronous and inline within the polling tick, so the
/// observer must not block significantly. No queuing: events emitted
/// while no observer is registered are dropped.
#[derive(Default)]
pub struct EventNotifier {
    observer: Option<Box<dyn FnMut(SessionEvent)>>,
}

impl fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventNotifier")
            .field("registered", &self.observer.is_some())
            .finish()
    }
}

impl EventNotifier {
    /// Create a notifier with no observer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the observer, replacing any previous one.
    pub fn register(&mut self, observer: impl FnMut(SessionEvent) + 'static) {
        self.observer = Some(Box::new(observer));
    }

    /// Remove the observer.
    pub fn clear(&mut self) {
        self.observer = None;
    }

    /// Dispatch an event to the observer, if one is registered.
    pub fn emit(&mut self, event: SessionEvent) {
        if let Some(observer) = &mut self.observer {
            observer(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_reaches_observer() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut notifier = EventNotifier::new();
        notifier.register(move |event| sink.borrow_mut().push(event));

        notifier.emit(SessionEvent::Connect);
        notifier.emit(SessionEvent::Sync);
        assert_eq!(
            *seen.borrow(),
            vec![SessionEvent::Connect, SessionEvent::Sync]
        );
    }

    #[test]
    fn test_emit_without_observer_is_noop() {
        let mut notifier = EventNotifier::new();
        notifier.emit(SessionEvent::Disconnect);
    }

    #[test]
    fn test_register_replaces_observer() {
        let first = Rc::new(RefCell::new(0u32));
        let second = Rc::new(RefCell::new(0u32));

        let mut notifier = EventNotifier::new();
        let sink = Rc::clone(&first);
        notifier.register(move |_| *sink.borrow_mut() += 1);
        notifier.emit(SessionEvent::Connect);

        let sink = Rc::clone(&second);
        notifier.register(move |_| *sink.borrow_mut() += 1);
        notifier.emit(SessionEvent::Connect);

        assert_eq!(*first.borrow(), 1);
        assert_eq!(*second.borrow(), 1);
    }
}
