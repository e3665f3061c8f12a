//! Event trait and ancestor-chain traversal.

use std::any::{Any, TypeId};
use std::fmt;

use tracing::warn;

/// Upper bound on ancestor chain length.
///
/// A chain longer than this almost certainly comes from a `parent()`
/// implementation that returns `self`; traversal stops there.
pub const MAX_ANCESTRY_DEPTH: usize = 64;

/// A value that can be emitted to listeners.
///
/// Every event belongs to a type hierarchy that ends at the implicit base
/// ("any event"). Ancestors are expressed by composition: a specialised event
/// embeds its parent event and returns it from [`Event::parent`].
///
/// # Example
///
/// ```rust
/// use herald_events::Event;
///
/// #[derive(Debug)]
/// struct Message {
///     text: String,
/// }
///
/// impl Event for Message {}
///
/// #[derive(Debug)]
/// struct Urgent {
///     message: Message,
///     level: u8,
/// }
///
/// impl Event for Urgent {
///     fn parent(&self) -> Option<&dyn Event> {
///         Some(&self.message)
///     }
/// }
///
/// let urgent = Urgent {
///     message: Message { text: "disk full".into() },
///     level: 3,
/// };
/// let event: &dyn Event = &urgent;
/// assert_eq!(event.ancestry().count(), 2);
/// assert!(event.ancestry().nth(1).unwrap().is::<Message>());
/// ```
pub trait Event: Any + Send + Sync + fmt::Debug + 'static {
    /// The direct ancestor of this event, or `None` if the next ancestor is
    /// the base event type.
    fn parent(&self) -> Option<&dyn Event> {
        None
    }

    /// Priority key used by priority-aware schedulers.
    ///
    /// Plain events return `None`. A priority event returns a reference to its
    /// key; the scheduler downcasts it to its own key type.
    fn priority(&self) -> Option<&dyn Any> {
        None
    }

    /// Type name used in logs and errors.
    fn event_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Event {
    /// `TypeId` of the concrete type behind this trait object.
    #[must_use]
    pub fn concrete_type_id(&self) -> TypeId {
        let any: &dyn Any = self;
        any.type_id()
    }

    /// Returns `true` if the concrete type is `T`.
    #[must_use]
    pub fn is<T: Event>(&self) -> bool {
        let any: &dyn Any = self;
        any.is::<T>()
    }

    /// Downcast to a concrete event type.
    #[must_use]
    pub fn downcast_ref<T: Event>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }

    /// Iterate over this event and its ancestors, most specific first.
    ///
    /// The base event type is implicit and is not yielded.
    #[must_use]
    pub fn ancestry(&self) -> Ancestry<'_> {
        Ancestry {
            next: Some(self),
            depth: 0,
        }
    }
}

/// Iterator over an event's ancestor chain. See [`Event::parent`].
#[derive(Debug, Clone)]
pub struct Ancestry<'a> {
    next: Option<&'a dyn Event>,
    depth: usize,
}

impl<'a> Iterator for Ancestry<'a> {
    type Item = &'a dyn Event;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if self.depth >= MAX_ANCESTRY_DEPTH {
            warn!(
                event_type = current.event_type(),
                max_depth = MAX_ANCESTRY_DEPTH,
                "Event ancestry too deep, truncating"
            );
            return None;
        }
        self.depth = self.depth.saturating_add(1);
        self.next = current.parent();
        Some(current)
    }
}
