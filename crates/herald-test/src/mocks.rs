//! Mock listeners for testing.

use std::any::type_name;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use herald_events::{Delivery, Event, Handlers, Listener};

/// One delivery observed by a [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    /// Type the handler that ran was declared for, or `"*"` for the base
    /// handler.
    pub handler_type: &'static str,
    /// `Debug` rendering of the view the handler received.
    pub event: String,
    /// Delivery context.
    pub delivery: Delivery,
    /// Name of the thread the handler ran on.
    pub thread: Option<String>,
}

type ReceivedLog = Arc<Mutex<Vec<Received>>>;

fn record(log: &ReceivedLog, handler_type: &'static str, event: &dyn fmt::Debug, delivery: &Delivery) {
    if let Ok(mut guard) = log.lock() {
        guard.push(Received {
            handler_type,
            event: format!("{event:?}"),
            delivery: *delivery,
            thread: thread::current().name().map(str::to_string),
        });
    }
}

/// Listener that records every delivery it handles.
///
/// Uses `std::sync::Mutex` internally so it can be inspected from the test
/// thread while an asynchronous emitter delivers on its worker.
pub struct RecordingListener {
    name: String,
    handlers: Handlers,
    received: ReceivedLog,
}

impl RecordingListener {
    /// Start building a recording listener.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> RecordingListenerBuilder {
        RecordingListenerBuilder {
            name: name.into(),
            handlers: Handlers::new(),
            received: ReceivedLog::default(),
        }
    }

    /// Everything received so far, in delivery order.
    #[must_use]
    pub fn received(&self) -> Vec<Received> {
        self.received
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Number of deliveries received.
    #[must_use]
    pub fn count(&self) -> usize {
        self.received.lock().map(|guard| guard.len()).unwrap_or_default()
    }

    /// Handler types that ran, in delivery order.
    #[must_use]
    pub fn handler_types(&self) -> Vec<&'static str> {
        self.received()
            .into_iter()
            .map(|received| received.handler_type)
            .collect()
    }

    /// Forget everything received so far.
    pub fn clear(&self) {
        if let Ok(mut guard) = self.received.lock() {
            guard.clear();
        }
    }
}

impl fmt::Debug for RecordingListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingListener")
            .field("name", &self.name)
            .field("handlers", &self.handlers)
            .field("received", &self.count())
            .finish()
    }
}

impl Listener for RecordingListener {
    fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Builder for [`RecordingListener`].
pub struct RecordingListenerBuilder {
    name: String,
    handlers: Handlers,
    received: ReceivedLog,
}

impl RecordingListenerBuilder {
    /// Record and accept events of exactly type `E`.
    #[must_use]
    pub fn record<E: Event>(mut self) -> Self {
        let log = Arc::clone(&self.received);
        self.handlers = self.handlers.on(move |event: &E, delivery| {
            record(&log, type_name::<E>(), event, delivery);
            Ok(())
        });
        self
    }

    /// Record and accept any event no typed handler matches.
    #[must_use]
    pub fn record_any(mut self) -> Self {
        let log = Arc::clone(&self.received);
        self.handlers = self.handlers.on_any(move |event, delivery| {
            record(&log, "*", event, delivery);
            Ok(())
        });
        self
    }

    /// Record events of type `E`, then fail with `message`.
    #[must_use]
    pub fn failing<E: Event>(mut self, message: impl Into<String>) -> Self {
        let log = Arc::clone(&self.received);
        let message = message.into();
        self.handlers = self.handlers.on(move |event: &E, delivery| {
            record(&log, type_name::<E>(), event, delivery);
            Err(message.clone().into())
        });
        self
    }

    /// Record events of type `E`, then panic with `message`.
    #[must_use]
    pub fn panicking<E: Event>(mut self, message: impl Into<String>) -> Self {
        let log = Arc::clone(&self.received);
        let message = message.into();
        self.handlers = self.handlers.on(move |event: &E, delivery| {
            record(&log, type_name::<E>(), event, delivery);
            panic!("{message}");
        });
        self
    }

    /// Build the listener.
    #[must_use]
    pub fn build(self) -> RecordingListener {
        RecordingListener {
            name: self.name,
            handlers: self.handlers,
            received: self.received,
        }
    }
}

/// Listener that accepts every event and tracks how many deliveries overlap.
#[derive(Debug)]
pub struct ConcurrencyGauge {
    handlers: Handlers,
    counters: Arc<GaugeCounters>,
}

#[derive(Debug, Default)]
struct GaugeCounters {
    active: AtomicUsize,
    max_active: AtomicUsize,
    total: AtomicUsize,
}

impl ConcurrencyGauge {
    /// Gauge whose handler returns immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// Gauge whose handler sleeps for `delay` while counted as active.
    #[must_use]
    pub fn with_delay(delay: Duration) -> Self {
        let counters = Arc::new(GaugeCounters::default());
        let gauge = Arc::clone(&counters);
        let handlers = Handlers::new().on_any(move |_, _| {
            let now = gauge.active.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            gauge.max_active.fetch_max(now, Ordering::SeqCst);
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            gauge.active.fetch_sub(1, Ordering::SeqCst);
            gauge.total.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        Self { handlers, counters }
    }

    /// Highest number of simultaneous deliveries observed.
    #[must_use]
    pub fn max_active(&self) -> usize {
        self.counters.max_active.load(Ordering::SeqCst)
    }

    /// Deliveries completed.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counters.total.load(Ordering::SeqCst)
    }
}

impl Default for ConcurrencyGauge {
    fn default() -> Self {
        Self::new()
    }
}

impl Listener for ConcurrencyGauge {
    fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "concurrency-gauge"
    }
}
