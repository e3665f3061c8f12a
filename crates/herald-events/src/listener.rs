//! Listener trait and the typed handler table.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;

use tracing::debug;
use uuid::Uuid;

use crate::delivery::Delivery;
use crate::error::HandlerResult;
use crate::event::Event;

/// Typed handler after erasure. Returns `None` if the event is not of the
/// handler's declared type.
type ErasedHandler = Box<dyn Fn(&dyn Event, &Delivery) -> Option<HandlerResult> + Send + Sync>;

/// Handler accepting any event.
type BaseHandler = Box<dyn Fn(&dyn Event, &Delivery) -> HandlerResult + Send + Sync>;

/// Handler declared for exactly one event type.
pub(crate) struct TypedHandler {
    event_type: &'static str,
    call: ErasedHandler,
}

impl TypedHandler {
    /// Event type this handler was declared for.
    pub(crate) fn event_type(&self) -> &'static str {
        self.event_type
    }

    /// Invoke with a view of the event. `None` if the view has another type.
    pub(crate) fn call(&self, event: &dyn Event, delivery: &Delivery) -> Option<HandlerResult> {
        (self.call)(event, delivery)
    }
}

/// The set of handlers a listener declares, one per exact event type, plus an
/// optional base handler that accepts any event.
///
/// # Example
///
/// ```rust
/// use herald_events::{Event, Handlers};
///
/// #[derive(Debug)]
/// struct Ping;
/// impl Event for Ping {}
///
/// let handlers = Handlers::new()
///     .on(|_ping: &Ping, delivery| {
///         println!("ping from {}", delivery.emitter());
///         Ok(())
///     })
///     .on_any(|event, _| {
///         println!("something else: {}", event.event_type());
///         Ok(())
///     });
///
/// assert!(handlers.handles::<Ping>());
/// assert!(handlers.handles_any());
/// ```
#[derive(Default)]
pub struct Handlers {
    typed: HashMap<TypeId, TypedHandler>,
    base: Option<BaseHandler>,
}

impl Handlers {
    /// Create an empty handler table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a handler for exactly `E`.
    ///
    /// Declaring a second handler for the same type replaces the first.
    #[must_use]
    pub fn on<E, F>(mut self, handler: F) -> Self
    where
        E: Event,
        F: Fn(&E, &Delivery) -> HandlerResult + Send + Sync + 'static,
    {
        let call: ErasedHandler = Box::new(move |event: &dyn Event, delivery: &Delivery| {
            event
                .downcast_ref::<E>()
                .map(|event| handler(event, delivery))
        });
        let previous = self.typed.insert(
            TypeId::of::<E>(),
            TypedHandler {
                event_type: type_name::<E>(),
                call,
            },
        );
        if previous.is_some() {
            debug!(event_type = type_name::<E>(), "Replaced existing handler");
        }
        self
    }

    /// Declare the base handler, used when no typed handler matches the event
    /// or any of its ancestors. It receives the most specific event.
    #[must_use]
    pub fn on_any<F>(mut self, handler: F) -> Self
    where
        F: Fn(&dyn Event, &Delivery) -> HandlerResult + Send + Sync + 'static,
    {
        if self.base.replace(Box::new(handler)).is_some() {
            debug!("Replaced existing base handler");
        }
        self
    }

    /// Returns `true` if a handler is declared for exactly `E`.
    #[must_use]
    pub fn handles<E: Event>(&self) -> bool {
        self.typed.contains_key(&TypeId::of::<E>())
    }

    /// Returns `true` if a base handler is declared.
    #[must_use]
    pub fn handles_any(&self) -> bool {
        self.base.is_some()
    }

    /// Number of declared handlers, base handler included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.typed
            .len()
            .saturating_add(usize::from(self.base.is_some()))
    }

    /// Returns `true` if no handler is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.typed.is_empty() && self.base.is_none()
    }

    pub(crate) fn typed(&self, type_id: TypeId) -> Option<&TypedHandler> {
        self.typed.get(&type_id)
    }

    pub(crate) fn base(&self) -> Option<&BaseHandler> {
        self.base.as_ref()
    }
}

impl fmt::Debug for Handlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.typed.values().map(|h| h.event_type).collect();
        types.sort_unstable();
        f.debug_struct("Handlers")
            .field("typed", &types)
            .field("base", &self.base.is_some())
            .finish()
    }
}

/// Something that receives events.
///
/// Handler resolution is driven entirely by [`Listener::handlers`]; see
/// [`crate::trigger`] for the matching rules.
pub trait Listener: Send + Sync {
    /// Handlers declared by this listener.
    fn handlers(&self) -> &Handlers;

    /// Optional name for debugging.
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Registration handle for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    /// Create a new listener ID.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener:{}", self.0)
    }
}

/// A named listener backed by a handler table built from closures.
pub struct FnListener {
    name: String,
    handlers: Handlers,
}

impl FnListener {
    /// Create a new closure listener.
    pub fn new(name: impl Into<String>, handlers: Handlers) -> Self {
        Self {
            name: name.into(),
            handlers,
        }
    }
}

impl fmt::Debug for FnListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener")
            .field("name", &self.name)
            .field("handlers", &self.handlers)
            .finish()
    }
}

impl Listener for FnListener {
    fn handlers(&self) -> &Handlers {
        &self.handlers
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::EmitterId;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Ping;
    impl Event for Ping {}

    #[derive(Debug)]
    struct Pong;
    impl Event for Pong {}

    #[test]
    fn test_empty_handlers() {
        let handlers = Handlers::new();
        assert!(handlers.is_empty());
        assert_eq!(handlers.len(), 0);
        assert!(!handlers.handles::<Ping>());
        assert!(!handlers.handles_any());
    }

    #[test]
    fn test_declared_types() {
        let handlers = Handlers::new()
            .on(|_: &Ping, _| Ok(()))
            .on_any(|_, _| Ok(()));

        assert!(handlers.handles::<Ping>());
        assert!(!handlers.handles::<Pong>());
        assert!(handlers.handles_any());
        assert_eq!(handlers.len(), 2);
    }

    #[test]
    fn test_redeclaring_replaces_handler() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let first_clone = Arc::clone(&first);
        let second_clone = Arc::clone(&second);

        let handlers = Handlers::new()
            .on(move |_: &Ping, _| {
                first_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .on(move |_: &Ping, _| {
                second_clone.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        assert_eq!(handlers.len(), 1);

        let handler = handlers.typed(TypeId::of::<Ping>()).unwrap();
        let delivery = Delivery::new(EmitterId::new(), 0);
        assert!(matches!(handler.call(&Ping, &delivery), Some(Ok(()))));

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_typed_handler_rejects_other_type() {
        let handlers = Handlers::new().on(|_: &Ping, _| Ok(()));
        let handler = handlers.typed(TypeId::of::<Ping>()).unwrap();
        let delivery = Delivery::new(EmitterId::new(), 0);

        assert!(handler.call(&Pong, &delivery).is_none());
    }

    #[test]
    fn test_debug_lists_types() {
        let handlers = Handlers::new().on(|_: &Ping, _| Ok(()));
        let debug = format!("{handlers:?}");
        assert!(debug.contains("Ping"));
        assert!(debug.contains("base: false"));
    }

    #[test]
    fn test_fn_listener_name() {
        let listener = FnListener::new("audit", Handlers::new());
        assert_eq!(listener.name(), "audit");
        assert!(listener.handlers().is_empty());
    }
}
