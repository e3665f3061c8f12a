//! Asynchronous emitter: producers enqueue, one background worker delivers.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, trace, warn};

use crate::config::EmitterConfig;
use crate::delivery::EmitterId;
use crate::emitter::{Emitter, EmitterBuilder, EventEmitter, FailureHook};
use crate::error::{ConfigResult, HandlerPanic};
use crate::event::Event;
use crate::listener::{Listener, ListenerId};
use crate::scheduler::Scheduler;

/// What the drain worker is doing.
enum Phase {
    Idle,
    Draining(Arc<dyn Event>),
}

struct DrainState {
    scheduler: Box<dyn Scheduler>,
    phase: Phase,
    shutdown: bool,
}

impl DrainState {
    fn is_draining(&self) -> bool {
        matches!(self.phase, Phase::Draining(_))
    }
}

/// State shared between the emitter handle and its worker thread.
struct Shared {
    state: Mutex<DrainState>,
    /// Signalled on Idle -> Draining and on shutdown.
    wake: Condvar,
    /// Signalled on Draining -> Idle.
    idle: Condvar,
    emitter: Emitter,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, DrainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Emitter that queues events and delivers them on a background worker.
///
/// `emit` only enqueues into the [`Scheduler`] and returns; it never waits
/// for delivery. A single persistent worker thread, spawned on the first
/// emit, takes events out of the scheduler one at a time and delivers each
/// through an inner [`Emitter`]. At most one event is being delivered at any
/// instant, so listeners never see concurrent deliveries from one
/// `AsyncEmitter`, and delivery order is exactly the scheduler's order.
///
/// Dropping the emitter lets the worker deliver everything still queued,
/// then joins it.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use herald_events::{AsyncEmitter, Event, FnListener, Handlers};
///
/// #[derive(Debug)]
/// struct Ping;
/// impl Event for Ping {}
///
/// let emitter = AsyncEmitter::new();
/// emitter.add_listener(Arc::new(FnListener::new(
///     "printer",
///     Handlers::new().on(|_: &Ping, _| {
///         println!("ping");
///         Ok(())
///     }),
/// )));
///
/// emitter.emit(Ping);
/// assert!(emitter.wait_idle(Duration::from_secs(5)));
/// ```
pub struct AsyncEmitter {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_name: String,
}

impl fmt::Debug for AsyncEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("AsyncEmitter")
            .field("emitter", &self.shared.emitter)
            .field("scheduler", &state.scheduler)
            .field("draining", &state.is_draining())
            .field("worker_name", &self.worker_name)
            .finish_non_exhaustive()
    }
}

impl Default for AsyncEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncEmitter {
    /// Create an asynchronous emitter with a FIFO scheduler and default
    /// settings.
    #[must_use]
    pub fn new() -> Self {
        let config = EmitterConfig::default();
        Self::assemble(
            config.scheduler.build(),
            EmitterBuilder::from_config(&config).build(),
            config.worker_name,
        )
    }

    /// Create an asynchronous emitter around a specific scheduler.
    #[must_use]
    pub fn with_scheduler(scheduler: impl Scheduler + 'static) -> Self {
        let config = EmitterConfig::default();
        Self::assemble(
            Box::new(scheduler),
            EmitterBuilder::from_config(&config).build(),
            config.worker_name,
        )
    }

    /// Start building an asynchronous emitter.
    #[must_use]
    pub fn builder() -> AsyncEmitterBuilder {
        AsyncEmitterBuilder::new()
    }

    fn assemble(scheduler: Box<dyn Scheduler>, emitter: Emitter, worker_name: String) -> Self {
        debug!(
            emitter = %emitter.id(),
            worker_name = %worker_name,
            "Asynchronous emitter created"
        );
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(DrainState {
                    scheduler,
                    phase: Phase::Idle,
                    shutdown: false,
                }),
                wake: Condvar::new(),
                idle: Condvar::new(),
                emitter,
            }),
            worker: Mutex::new(None),
            worker_name,
        }
    }

    /// This emitter's own ID.
    #[must_use]
    pub fn id(&self) -> EmitterId {
        self.shared.emitter.id()
    }

    /// Identity stamped on deliveries.
    #[must_use]
    pub fn identity(&self) -> EmitterId {
        self.shared.emitter.identity()
    }

    /// Name of the drain worker thread.
    #[must_use]
    pub fn worker_name(&self) -> &str {
        &self.worker_name
    }

    /// Bind a listener. See [`Emitter::add_listener`].
    ///
    /// # Panics
    ///
    /// Panics if the listener lock is poisoned.
    pub fn add_listener(&self, listener: Arc<dyn Listener>) -> ListenerId {
        self.shared.emitter.add_listener(listener)
    }

    /// Remove a listener. Returns `true` if it was bound.
    ///
    /// # Panics
    ///
    /// Panics if the listener lock is poisoned.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.shared.emitter.remove_listener(id)
    }

    /// Remove every listener.
    ///
    /// # Panics
    ///
    /// Panics if the listener lock is poisoned.
    pub fn clear_listeners(&self) {
        self.shared.emitter.clear_listeners();
    }

    /// Number of bound listeners.
    ///
    /// # Panics
    ///
    /// Panics if the listener lock is poisoned.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.emitter.listener_count()
    }

    /// Queue an event for delivery.
    pub fn emit<E: Event>(&self, event: E) {
        self.emit_shared(Arc::new(event));
    }

    /// Queue an already shared event for delivery.
    ///
    /// Listeners bound when the worker reaches the event receive it, not
    /// necessarily those bound now.
    pub fn emit_shared(&self, event: Arc<dyn Event>) {
        let started = {
            let mut state = self.shared.lock();
            trace!(
                emitter = %self.id(),
                event_type = event.event_type(),
                "Event queued"
            );
            state.scheduler.enqueue(event);
            if state.is_draining() {
                false
            } else if let Some(next) = state.scheduler.dequeue() {
                state.phase = Phase::Draining(next);
                true
            } else {
                false
            }
        };

        if started {
            self.shared.wake.notify_one();
        }
        self.ensure_worker();
    }

    /// Events accepted but not yet fully delivered, including the one in
    /// flight.
    #[must_use]
    pub fn pending(&self) -> usize {
        let state = self.shared.lock();
        state
            .scheduler
            .len()
            .saturating_add(usize::from(state.is_draining()))
    }

    /// Returns `true` while the worker has an event to deliver.
    #[must_use]
    pub fn is_draining(&self) -> bool {
        self.shared.lock().is_draining()
    }

    /// Block until every queued event has been delivered or `timeout`
    /// elapses. Returns `true` if the emitter went idle in time.
    ///
    /// Calling this from a handler running on the worker thread cannot
    /// succeed and waits for the full timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .idle
            .wait_timeout_while(state, timeout, |state| state.is_draining())
            .unwrap_or_else(PoisonError::into_inner);
        !state.is_draining()
    }

    fn ensure_worker(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return;
        }

        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name(self.worker_name.clone())
            .spawn(move || drain_loop(&shared))
        {
            Ok(handle) => {
                debug!(
                    emitter = %self.id(),
                    worker_name = %self.worker_name,
                    "Drain worker started"
                );
                *worker = Some(handle);
            },
            // The event stays queued and the next emit retries the spawn.
            Err(e) => error!(
                emitter = %self.id(),
                worker_name = %self.worker_name,
                error = %e,
                "Failed to spawn drain worker"
            ),
        }
    }
}

fn drain_loop(shared: &Shared) {
    loop {
        let current = {
            let state = shared.lock();
            let state = shared
                .wake
                .wait_while(state, |state| !state.is_draining() && !state.shutdown)
                .unwrap_or_else(PoisonError::into_inner);
            match &state.phase {
                Phase::Draining(event) => Arc::clone(event),
                Phase::Idle => break,
            }
        };

        // Handler and hook panics are caught inside `emit`; this covers a poisoned listener lock.
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| shared.emitter.emit(current.as_ref())))
        {
            error!(
                emitter = %shared.emitter.id(),
                event_type = current.event_type(),
                error = %HandlerPanic::from_payload(payload.as_ref()),
                "Delivery panicked outside a handler"
            );
        }

        let mut state = shared.lock();
        if let Some(next) = state.scheduler.dequeue() {
            state.phase = Phase::Draining(next);
        } else {
            state.phase = Phase::Idle;
            shared.idle.notify_all();
        }
    }

    debug!(emitter = %shared.emitter.id(), "Drain worker stopped");
}

impl EventEmitter for AsyncEmitter {
    fn add_listener(&self, listener: Arc<dyn Listener>) -> ListenerId {
        AsyncEmitter::add_listener(self, listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        AsyncEmitter::remove_listener(self, id)
    }

    fn emit(&self, event: Arc<dyn Event>) {
        self.emit_shared(event);
    }

    fn identity(&self) -> EmitterId {
        AsyncEmitter::identity(self)
    }

    fn listener_count(&self) -> usize {
        AsyncEmitter::listener_count(self)
    }
}

impl Drop for AsyncEmitter {
    fn drop(&mut self) {
        let pending = {
            let mut state = self.shared.lock();
            state.shutdown = true;
            state.scheduler.len().saturating_add(usize::from(state.is_draining()))
        };
        self.shared.wake.notify_all();

        let Some(handle) = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            if pending > 0 {
                warn!(
                    emitter = %self.id(),
                    pending,
                    "Dropping emitter without a worker, queued events discarded"
                );
            }
            return;
        };

        if handle.thread().id() == thread::current().id() {
            debug!(emitter = %self.id(), "Dropped on drain worker, detaching");
            return;
        }

        debug!(emitter = %self.id(), pending, "Waiting for drain worker to finish");
        if handle.join().is_err() {
            error!(emitter = %self.id(), "Drain worker panicked");
        }
    }
}

/// Builder for [`AsyncEmitter`].
pub struct AsyncEmitterBuilder {
    config: EmitterConfig,
    emitter: EmitterBuilder,
    scheduler: Option<Box<dyn Scheduler>>,
}

impl fmt::Debug for AsyncEmitterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncEmitterBuilder")
            .field("config", &self.config)
            .field("emitter", &self.emitter)
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

impl Default for AsyncEmitterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncEmitterBuilder {
    /// Builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::from_config(EmitterConfig::default())
    }

    /// Builder seeded from a configuration.
    #[must_use]
    pub fn from_config(config: EmitterConfig) -> Self {
        Self {
            emitter: EmitterBuilder::from_config(&config),
            config,
            scheduler: None,
        }
    }

    /// Stamp deliveries with `identity` instead of the emitter's own ID.
    #[must_use]
    pub fn identity(mut self, identity: EmitterId) -> Self {
        self.emitter = self.emitter.identity(identity);
        self
    }

    /// Route failures to the failure hook.
    #[must_use]
    pub fn catch_exceptions(mut self, enabled: bool) -> Self {
        self.config.catch_exceptions = enabled;
        self.emitter = self.emitter.catch_exceptions(enabled);
        self
    }

    /// Replace the failure hook. It runs on the worker thread.
    #[must_use]
    pub fn failure_hook(mut self, hook: impl FailureHook + 'static) -> Self {
        self.emitter = self.emitter.failure_hook(hook);
        self
    }

    /// Use a scheduler instance instead of the configured kind.
    #[must_use]
    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Some(Box::new(scheduler));
        self
    }

    /// Name the drain worker thread.
    #[must_use]
    pub fn worker_name(mut self, name: impl Into<String>) -> Self {
        self.config.worker_name = name.into();
        self
    }

    /// Build the emitter.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::ValidationError`] if the worker name is
    /// not a valid thread name.
    pub fn build(self) -> ConfigResult<AsyncEmitter> {
        self.config.validate()?;
        let scheduler = self
            .scheduler
            .unwrap_or_else(|| self.config.scheduler.build());
        Ok(AsyncEmitter::assemble(
            scheduler,
            self.emitter.build(),
            self.config.worker_name,
        ))
    }
}
