//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_events::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use herald_events::prelude::*;
//!
//! #[derive(Debug)]
//! struct Job(i64);
//! impl Event for Job {
//!     fn priority(&self) -> Option<&dyn std::any::Any> {
//!         Some(&self.0)
//!     }
//! }
//!
//! let emitter = AsyncEmitter::with_scheduler(PriorityScheduler::<i64>::new());
//! emitter.add_listener(Arc::new(FnListener::new(
//!     "jobs",
//!     Handlers::new().on(|job: &Job, _| {
//!         println!("job {}", job.0);
//!         Ok(())
//!     }),
//! )));
//!
//! emitter.emit(Job(3));
//! emitter.emit(Job(1));
//! assert!(emitter.wait_idle(Duration::from_secs(5)));
//! ```

// Events and dispatch
pub use crate::{Delivery, EmitterId, Event, trigger};

// Listeners
pub use crate::{FnListener, Handlers, Listener, ListenerId};

// Emitters
pub use crate::{AsyncEmitter, EmitReport, Emitter, EventEmitter, FailureHook};

// Scheduling
pub use crate::{FifoScheduler, PriorityScheduler, Scheduler, SchedulerKind};

// Configuration and errors
pub use crate::{ConfigError, DispatchError, EmitterConfig, HandlerResult};
