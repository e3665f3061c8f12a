//! First-in first-out scheduler.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::event::Event;

use super::Scheduler;

/// First-in first-out scheduler.
///
/// Unbounded: callers that emit faster than listeners consume are
/// responsible for the resulting memory growth.
#[derive(Debug, Default)]
pub struct FifoScheduler {
    queue: VecDeque<Arc<dyn Event>>,
}

impl FifoScheduler {
    /// Create an empty FIFO scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty FIFO scheduler with room for `capacity` events before
    /// reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::with_capacity(capacity),
        }
    }
}

impl Scheduler for FifoScheduler {
    fn enqueue(&mut self, event: Arc<dyn Event>) {
        self.queue.push_back(event);
    }

    fn dequeue(&mut self) -> Option<Arc<dyn Event>> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}
