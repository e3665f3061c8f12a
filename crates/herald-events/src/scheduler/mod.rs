//! Pending-event containers and their ordering policies.
//!
//! A scheduler never blocks: [`Scheduler::enqueue`] always accepts the event
//! and [`Scheduler::dequeue`] returns `None` when nothing is pending.
//! Schedulers are plain data structures; the owner provides mutual exclusion
//! (the asynchronous emitter keeps its scheduler behind the same lock as its
//! drain state).

mod fifo;
mod priority;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::event::Event;

pub use fifo::FifoScheduler;
pub use priority::PriorityScheduler;

/// Ordered container of pending events.
pub trait Scheduler: Send + fmt::Debug {
    /// Add an event. Never blocks and never rejects.
    fn enqueue(&mut self, event: Arc<dyn Event>);

    /// Remove and return the next event per this scheduler's policy.
    fn dequeue(&mut self) -> Option<Arc<dyn Event>>;

    /// Number of pending events.
    fn len(&self) -> usize;

    /// Returns `true` if no event is pending.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Built-in scheduler selection, as used in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerKind {
    /// Plain first-in first-out queue.
    #[default]
    Fifo,
    /// Plain events first (FIFO), then priority events by ascending `i64`
    /// key.
    Priority,
}

impl SchedulerKind {
    /// Create an empty scheduler of this kind.
    #[must_use]
    pub fn build(self) -> Box<dyn Scheduler> {
        match self {
            Self::Fifo => Box::new(FifoScheduler::new()),
            Self::Priority => Box::new(PriorityScheduler::<i64>::new()),
        }
    }
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fifo => write!(f, "fifo"),
            Self::Priority => write!(f, "priority"),
        }
    }
}
