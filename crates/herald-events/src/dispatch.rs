//! Type-based handler resolution.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::trace;

use crate::delivery::Delivery;
use crate::error::{DispatchError, DispatchResult, HandlerError, HandlerPanic, HandlerResult};
use crate::event::Event;
use crate::listener::Listener;

/// Handler base type name reported for the "any event" handler.
pub const BASE_HANDLER_TYPE: &str = "*";

/// Deliver `event` to `listener`.
///
/// Resolution walks the event's ancestor chain from the most specific type
/// to the least specific one and invokes the first handler the listener
/// declares for exactly that type, passing the matching view of the event.
/// If none matches, the listener's base handler receives the most specific
/// event. For a fixed listener and event type the same handler is always
/// chosen.
///
/// # Errors
///
/// - [`DispatchError::Unhandled`] if no handler matches, base included.
/// - [`DispatchError::Invocation`] if the matched handler returns an error
///   or panics.
pub fn trigger(event: &dyn Event, listener: &dyn Listener, delivery: &Delivery) -> DispatchResult<()> {
    let handlers = listener.handlers();

    for view in event.ancestry() {
        let Some(handler) = handlers.typed(view.concrete_type_id()) else {
            continue;
        };
        match guarded(|| handler.call(view, delivery)) {
            Ok(None) => continue,
            Ok(Some(outcome)) => {
                trace!(
                    listener_name = %listener.name(),
                    event_type = event.event_type(),
                    handler_type = handler.event_type(),
                    "Dispatched to typed handler"
                );
                return finish(event, listener, handler.event_type(), outcome);
            },
            Err(panic) => return finish(event, listener, handler.event_type(), Err(panic)),
        }
    }

    if let Some(base) = handlers.base() {
        trace!(
            listener_name = %listener.name(),
            event_type = event.event_type(),
            "Dispatched to base handler"
        );
        let outcome = guarded(|| base(event, delivery)).and_then(|outcome| outcome);
        return finish(event, listener, BASE_HANDLER_TYPE, outcome);
    }

    Err(DispatchError::Unhandled {
        event_type: event.event_type(),
        listener: listener.name().to_string(),
    })
}

/// Run a handler, turning a panic into a [`HandlerPanic`] error.
fn guarded<T>(f: impl FnOnce() -> T) -> Result<T, HandlerError> {
    catch_unwind(AssertUnwindSafe(f))
        .map_err(|payload| Box::new(HandlerPanic::from_payload(payload.as_ref())) as HandlerError)
}

fn finish(
    event: &dyn Event,
    listener: &dyn Listener,
    handler_type: &'static str,
    outcome: HandlerResult,
) -> DispatchResult<()> {
    outcome.map_err(|source| DispatchError::Invocation {
        event_type: event.event_type(),
        handler_type,
        listener: listener.name().to_string(),
        source,
    })
}
