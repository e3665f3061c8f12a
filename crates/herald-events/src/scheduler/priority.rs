//! Priority-over-FIFO scheduler keyed by a caller-chosen `Ord` type.

use std::any::type_name;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::event::Event;

use super::{FifoScheduler, Scheduler};

/// Priority-over-FIFO scheduler.
///
/// Events whose [`Event::priority`] yields a `K` go to a priority queue
/// ordered by ascending key (ties in arrival order). All other events go to a
/// FIFO queue. The FIFO queue is always drained completely before any
/// priority event is returned, so plain events strictly precede priority
/// events regardless of arrival order or key.
///
/// # Key type
///
/// All priority events given to one scheduler must use `K` as their key
/// type; keys of different types are not comparable. An event whose key has
/// another type breaks that contract: it is logged at `warn` level and
/// queued as a plain event.
pub struct PriorityScheduler<K = i64> {
    fifo: FifoScheduler,
    queue: BinaryHeap<Reverse<Prioritized<K>>>,
    arrivals: u64,
}

struct Prioritized<K> {
    key: K,
    arrival: u64,
    event: Arc<dyn Event>,
}

impl<K: Ord> PartialEq for Prioritized<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for Prioritized<K> {}

impl<K: Ord> PartialOrd for Prioritized<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> Ord for Prioritized<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.arrival.cmp(&other.arrival))
    }
}

enum Slot<K> {
    Plain,
    Keyed(K),
    Mismatched,
}

impl<K> PriorityScheduler<K>
where
    K: Ord + Clone + Send + 'static,
{
    /// Create an empty priority scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fifo: FifoScheduler::new(),
            queue: BinaryHeap::new(),
            arrivals: 0,
        }
    }

    /// Number of pending plain events.
    #[must_use]
    pub fn plain_len(&self) -> usize {
        self.fifo.len()
    }

    /// Number of pending priority events.
    #[must_use]
    pub fn priority_len(&self) -> usize {
        self.queue.len()
    }

    fn classify(event: &dyn Event) -> Slot<K> {
        match event.priority() {
            None => Slot::Plain,
            Some(key) => key
                .downcast_ref::<K>()
                .map_or(Slot::Mismatched, |key| Slot::Keyed(key.clone())),
        }
    }
}

impl<K> Default for PriorityScheduler<K>
where
    K: Ord + Clone + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> fmt::Debug for PriorityScheduler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriorityScheduler")
            .field("key_type", &type_name::<K>())
            .field("plain", &self.fifo.len())
            .field("priority", &self.queue.len())
            .finish()
    }
}

impl<K> Scheduler for PriorityScheduler<K>
where
    K: Ord + Clone + Send + 'static,
{
    fn enqueue(&mut self, event: Arc<dyn Event>) {
        match Self::classify(event.as_ref()) {
            Slot::Plain => self.fifo.enqueue(event),
            Slot::Keyed(key) => {
                let arrival = self.arrivals;
                self.arrivals = self.arrivals.wrapping_add(1);
                self.queue.push(Reverse(Prioritized {
                    key,
                    arrival,
                    event,
                }));
            },
            Slot::Mismatched => {
                warn!(
                    event_type = event.event_type(),
                    expected_key = type_name::<K>(),
                    "Priority key type does not match scheduler, queueing as plain event"
                );
                self.fifo.enqueue(event);
            },
        }
    }

    fn dequeue(&mut self) -> Option<Arc<dyn Event>> {
        self.fifo
            .dequeue()
            .or_else(|| self.queue.pop().map(|Reverse(entry)| entry.event))
    }

    fn len(&self) -> usize {
        self.fifo.len().saturating_add(self.queue.len())
    }
}
