//! Synchronous emitter and the emitter capability shared with the async one.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::{debug, error, trace, warn};

use crate::config::EmitterConfig;
use crate::delivery::{Delivery, EmitterId};
use crate::dispatch::trigger;
use crate::error::{DispatchError, HandlerPanic};
use crate::event::Event;
use crate::listener::{Listener, ListenerId};

/// Emitter capability: a listener set plus a way to deliver events to it.
pub trait EventEmitter: Send + Sync {
    /// Bind a listener. Adding the same `Arc` twice returns the existing ID.
    fn add_listener(&self, listener: Arc<dyn Listener>) -> ListenerId;

    /// Remove a listener. Returns `true` if it was registered.
    fn remove_listener(&self, id: ListenerId) -> bool;

    /// Emit an event to every listener.
    fn emit(&self, event: Arc<dyn Event>);

    /// Identity stamped on deliveries from this emitter.
    fn identity(&self) -> EmitterId;

    /// Number of bound listeners.
    fn listener_count(&self) -> usize;
}

/// Receives per-listener dispatch failures when `catch_exceptions` is on.
///
/// Closures `Fn(&DispatchError, &Delivery)` implement this trait.
pub trait FailureHook: Send + Sync {
    /// Called once per failed (event, listener) pair, after the attempt.
    fn on_failure(&self, error: &DispatchError, delivery: &Delivery);
}

impl<F> FailureHook for F
where
    F: Fn(&DispatchError, &Delivery) + Send + Sync,
{
    fn on_failure(&self, error: &DispatchError, delivery: &Delivery) {
        self(error, delivery);
    }
}

/// Default hook: logs invocation failures at `warn` and unhandled events at
/// `debug`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFailures;

impl FailureHook for LogFailures {
    fn on_failure(&self, error: &DispatchError, delivery: &Delivery) {
        match error {
            DispatchError::Unhandled { .. } => debug!(
                emitter = %delivery.emitter(),
                sequence = delivery.sequence(),
                listener_name = %error.listener(),
                event_type = error.event_type(),
                "Event not handled by listener"
            ),
            DispatchError::Invocation { .. } => warn!(
                emitter = %delivery.emitter(),
                sequence = delivery.sequence(),
                listener_name = %error.listener(),
                event_type = error.event_type(),
                error = %error,
                "Listener failed to handle event"
            ),
        }
    }
}

/// Outcome counts of one synchronous `emit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitReport {
    /// Listeners in the delivery snapshot.
    pub attempted: usize,
    /// Listeners whose handler ran successfully.
    pub delivered: usize,
    /// Listeners with no matching handler.
    pub unhandled: usize,
    /// Listeners whose handler failed or panicked.
    pub failed: usize,
}

impl EmitReport {
    /// Returns `true` if every attempted listener handled the event.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unhandled == 0 && self.failed == 0
    }
}

/// Synchronous emitter.
///
/// `emit` delivers in the calling thread and returns once every listener has
/// been attempted. Failures are isolated per listener: one failing listener
/// never prevents delivery to the others.
///
/// Failure reporting: when `catch_exceptions` is set, every failure is passed
/// to the [`FailureHook`] ([`LogFailures`] unless replaced). Otherwise
/// failures are only logged, at `debug` for unhandled events and at `warn`
/// for handler failures. In both cases they are counted in the returned
/// [`EmitReport`].
pub struct Emitter {
    id: EmitterId,
    identity: EmitterId,
    listeners: RwLock<HashMap<ListenerId, Arc<dyn Listener>>>,
    catch_exceptions: bool,
    failure_hook: Arc<dyn FailureHook>,
    sequence: AtomicU64,
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.listeners.read().map(|l| l.len()).unwrap_or_default();
        f.debug_struct("Emitter")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("listener_count", &count)
            .field("catch_exceptions", &self.catch_exceptions)
            .finish_non_exhaustive()
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    /// Create an emitter whose identity is itself.
    #[must_use]
    pub fn new() -> Self {
        EmitterBuilder::new().build()
    }

    /// Create an emitter that stamps deliveries with `identity`.
    #[must_use]
    pub fn with_identity(identity: EmitterId) -> Self {
        EmitterBuilder::new().identity(identity).build()
    }

    /// Start building an emitter.
    #[must_use]
    pub fn builder() -> EmitterBuilder {
        EmitterBuilder::new()
    }

    /// This emitter's own ID.
    #[must_use]
    pub fn id(&self) -> EmitterId {
        self.id
    }

    /// Identity stamped on deliveries. Equals [`Emitter::id`] unless a custom
    /// identity was supplied.
    #[must_use]
    pub fn identity(&self) -> EmitterId {
        self.identity
    }

    /// Whether failures are routed to the failure hook.
    #[must_use]
    pub fn catches_exceptions(&self) -> bool {
        self.catch_exceptions
    }

    /// Bind a listener.
    ///
    /// Adding an `Arc` that is already bound returns its existing ID.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) -> ListenerId {
        let mut listeners = self.listeners.write().expect("lock poisoned");

        if let Some((id, _)) = listeners
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, &listener))
        {
            trace!(listener_id = %id, "Listener already bound");
            return *id;
        }

        let id = ListenerId::new();
        let name = listener.name().to_string();
        listeners.insert(id, listener);

        debug!(emitter = %self.id, listener_id = %id, listener_name = %name, "Listener added");
        id
    }

    /// Remove a listener. Returns `true` if it was bound.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        // Drop the listener after releasing the lock, its Drop may re-enter.
        let removed = {
            let mut listeners = self.listeners.write().expect("lock poisoned");
            listeners.remove(&id)
        };

        if removed.is_some() {
            debug!(emitter = %self.id, listener_id = %id, "Listener removed");
        }
        removed.is_some()
    }

    /// Remove every listener.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear_listeners(&self) {
        let removed = std::mem::take(&mut *self.listeners.write().expect("lock poisoned"));
        debug!(emitter = %self.id, count = removed.len(), "All listeners cleared");
    }

    /// Number of bound listeners.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.read().expect("lock poisoned").len()
    }

    /// Deliver `event` to every listener bound when the call starts.
    ///
    /// The listener set is snapshotted first, so handlers may add or remove
    /// listeners (on this emitter too) without affecting this call.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned. A panicking failure hook is
    /// caught and logged; the remaining listeners are still attempted.
    pub fn emit(&self, event: &dyn Event) -> EmitReport {
        let delivery = Delivery::new(
            self.identity,
            self.sequence.fetch_add(1, Ordering::Relaxed),
        );
        let snapshot = self.snapshot();

        trace!(
            emitter = %self.identity,
            sequence = delivery.sequence(),
            event_type = event.event_type(),
            listener_count = snapshot.len(),
            "Emitting event"
        );

        let mut report = EmitReport::default();
        for listener in &snapshot {
            report.attempted = report.attempted.saturating_add(1);
            match trigger(event, listener.as_ref(), &delivery) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(error) => {
                    if error.is_unhandled() {
                        report.unhandled = report.unhandled.saturating_add(1);
                    } else {
                        report.failed = report.failed.saturating_add(1);
                    }
                    self.report_failure(&error, &delivery);
                },
            }
        }
        report
    }

    fn snapshot(&self) -> Vec<Arc<dyn Listener>> {
        self.listeners
            .read()
            .expect("lock poisoned")
            .values()
            .map(Arc::clone)
            .collect()
    }

    fn report_failure(&self, error: &DispatchError, delivery: &Delivery) {
        if !self.catch_exceptions {
            LogFailures.on_failure(error, delivery);
            return;
        }

        // Contain hook panics so the rest of the snapshot is still attempted.
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| {
            self.failure_hook.on_failure(error, delivery);
        })) {
            error!(
                emitter = %delivery.emitter(),
                sequence = delivery.sequence(),
                listener_name = %error.listener(),
                error = %HandlerPanic::from_payload(payload.as_ref()),
                "Failure hook panicked"
            );
        }
    }
}

impl EventEmitter for Emitter {
    fn add_listener(&self, listener: Arc<dyn Listener>) -> ListenerId {
        Emitter::add_listener(self, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        Emitter::remove_listener(self, id)
    }

    fn emit(&self, event: Arc<dyn Event>) {
        Emitter::emit(self, event.as_ref());
    }

    fn identity(&self) -> EmitterId {
        self.identity
    }

    fn listener_count(&self) -> usize {
        Emitter::listener_count(self)
    }
}

/// Builder for [`Emitter`].
pub struct EmitterBuilder {
    identity: Option<EmitterId>,
    catch_exceptions: bool,
    failure_hook: Arc<dyn FailureHook>,
}

impl fmt::Debug for EmitterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterBuilder")
            .field("identity", &self.identity)
            .field("catch_exceptions", &self.catch_exceptions)
            .finish_non_exhaustive()
    }
}

impl Default for EmitterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EmitterBuilder {
    /// Builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            identity: None,
            catch_exceptions: false,
            failure_hook: Arc::new(LogFailures),
        }
    }

    /// Builder seeded from a configuration.
    #[must_use]
    pub fn from_config(config: &EmitterConfig) -> Self {
        Self::new().catch_exceptions(config.catch_exceptions)
    }

    /// Stamp deliveries with `identity` instead of the emitter's own ID.
    #[must_use]
    pub fn identity(mut self, identity: EmitterId) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Route failures to the failure hook.
    #[must_use]
    pub fn catch_exceptions(mut self, enabled: bool) -> Self {
        self.catch_exceptions = enabled;
        self
    }

    /// Replace the failure hook. Only called when `catch_exceptions` is on.
    #[must_use]
    pub fn failure_hook(mut self, hook: impl FailureHook + 'static) -> Self {
        self.failure_hook = Arc::new(hook);
        self
    }

    /// Build the emitter.
    #[must_use]
    pub fn build(self) -> Emitter {
        let id = EmitterId::new();
        Emitter {
            id,
            identity: self.identity.unwrap_or(id),
            listeners: RwLock::new(HashMap::new()),
            catch_exceptions: self.catch_exceptions,
            failure_hook: self.failure_hook,
            sequence: AtomicU64::new(0),
        }
    }
}
