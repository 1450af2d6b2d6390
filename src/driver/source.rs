//! Subscription adapter over the driver's event stream.
//!
//! Historically the driver exposed itself as a global object with string-keyed
//! on/off registration, and re-registering without deregistering first risked
//! duplicate firing. `GestureSource` replaces that with typed slots and an
//! idempotent subscribe: registering the same (consumer, slot) pair again
//! implicitly replaces the previous handler.

use crate::driver::types::{DriverEvent, DriverError, GestureKind, LifecycleEvent};
use tracing::debug;
use uuid::Uuid;

/// A logical subscription slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// A single gesture kind
    Gesture(GestureKind),
    /// Every gesture event
    AnyGesture,
    /// Connection-lifecycle events
    Lifecycle,
    /// Battery and signal telemetry
    Telemetry,
}

impl Slot {
    fn matches(&self, event: &DriverEvent) -> bool {
        match (self, event) {
            (Slot::Gesture(kind), DriverEvent::Gesture(e)) => e.kind == *kind,
            (Slot::AnyGesture, DriverEvent::Gesture(_)) => true,
            (Slot::Lifecycle, DriverEvent::Lifecycle(_)) => true,
            (Slot::Telemetry, DriverEvent::Telemetry(_)) => true,
            _ => false,
        }
    }
}

/// Opaque handle returned by [`GestureSource::subscribe`].
///
/// Unsubscribing with a stale token (one whose slot has since been replaced)
/// is a no-op rather than an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionToken {
    consumer: String,
    slot: Slot,
    id: Uuid,
}

type Handler = Box<dyn FnMut(&DriverEvent) + Send>;

struct Entry {
    consumer: String,
    slot: Slot,
    id: Uuid,
    handler: Handler,
}

/// Normalizes the driver's callback registration into a typed
/// subscribe/unsubscribe interface over a uniform event stream.
///
/// Events are delivered to handlers in arrival order; the source never
/// reorders, merges, or batches.
#[derive(Default)]
pub struct GestureSource {
    entries: Vec<Entry>,
}

impl GestureSource {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a handler for a slot, replacing any existing handler the same
    /// consumer holds for that slot.
    pub fn subscribe(
        &mut self,
        consumer: &str,
        slot: Slot,
        handler: impl FnMut(&DriverEvent) + Send + 'static,
    ) -> SubscriptionToken {
        let id = Uuid::new_v4();
        let token = SubscriptionToken {
            consumer: consumer.to_string(),
            slot,
            id,
        };

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.consumer == consumer && e.slot == slot)
        {
            debug!(consumer, ?slot, "replacing existing gesture subscription");
            entry.id = id;
            entry.handler = Box::new(handler);
        } else {
            self.entries.push(Entry {
                consumer: consumer.to_string(),
                slot,
                id,
                handler: Box::new(handler),
            });
        }

        token
    }

    /// Remove the subscription identified by `token`.
    ///
    /// Returns `false` if the token no longer identifies a live handler.
    pub fn unsubscribe(&mut self, token: &SubscriptionToken) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != token.id);
        before != self.entries.len()
    }

    /// Remove every subscription held by `consumer`. Returns how many were
    /// removed.
    pub fn unsubscribe_consumer(&mut self, consumer: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.consumer != consumer);
        before - self.entries.len()
    }

    /// Deliver one event to every matching handler, in registration order.
    pub fn dispatch(&mut self, event: &DriverEvent) {
        for entry in &mut self.entries {
            if entry.slot.matches(event) {
                (entry.handler)(event);
            }
        }
    }

    /// Surface a driver/transport failure to lifecycle subscribers.
    ///
    /// Failures are delivered as [`LifecycleEvent::Fault`] so the connection
    /// manager can fall back to disconnected; they are never swallowed here.
    pub fn fail(&mut self, error: &DriverError) {
        self.dispatch(&DriverEvent::Lifecycle(LifecycleEvent::Fault {
            message: error.to_string(),
        }));
    }

    /// Drop all handlers (session teardown).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of live subscriptions.
    pub fn handler_count(&self) -> usize {
        self.entries.len()
    }
}
