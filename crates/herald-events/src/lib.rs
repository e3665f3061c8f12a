//! Herald Events - typed event dispatch with synchronous and queued emitters.
//!
//! This crate provides:
//! - The [`Event`] trait, with ancestry by composition
//! - Type-based handler resolution ([`trigger`]) over a listener's
//!   [`Handlers`] table
//! - A synchronous [`Emitter`] that isolates per-listener failures
//! - An [`AsyncEmitter`] that queues events in a [`Scheduler`] and delivers
//!   them on a single background worker
//!
//! # Architecture
//!
//! An event may expose a *parent view*: an embedded value of a more general
//! event type. Dispatch walks that chain from the most specific view to the
//! least specific one and calls the first handler the listener declares for
//! exactly that type. A listener's base handler catches anything else.
//!
//! Handlers never receive a mutated event. Per-delivery context (emitter
//! identity and sequence number) travels in a [`Delivery`] alongside it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use herald_events::{Emitter, Event, FnListener, Handlers};
//!
//! #[derive(Debug)]
//! struct Ping {
//!     seq: u32,
//! }
//! impl Event for Ping {}
//!
//! #[derive(Debug)]
//! struct Alert {
//!     ping: Ping,
//! }
//! impl Event for Alert {
//!     fn parent(&self) -> Option<&dyn Event> {
//!         Some(&self.ping)
//!     }
//! }
//!
//! let emitter = Emitter::new();
//! emitter.add_listener(Arc::new(FnListener::new(
//!     "pings",
//!     Handlers::new().on(|ping: &Ping, _| {
//!         println!("ping #{}", ping.seq);
//!         Ok(())
//!     }),
//! )));
//!
//! // No Alert handler, so the Ping view of the alert is delivered.
//! let report = emitter.emit(&Alert { ping: Ping { seq: 1 } });
//! assert_eq!(report.delivered, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;
pub mod scheduler;

mod async_emitter;
mod config;
mod delivery;
mod dispatch;
mod emitter;
mod error;
mod event;
mod listener;

pub use async_emitter::{AsyncEmitter, AsyncEmitterBuilder};
pub use config::EmitterConfig;
pub use delivery::{Delivery, EmitterId};
pub use dispatch::{BASE_HANDLER_TYPE, trigger};
pub use emitter::{EmitReport, Emitter, EmitterBuilder, EventEmitter, FailureHook, LogFailures};
pub use error::{
    ConfigError, ConfigResult, DispatchError, DispatchResult, HandlerError, HandlerPanic,
    HandlerResult,
};
pub use event::{Ancestry, Event, MAX_ANCESTRY_DEPTH};
pub use listener::{FnListener, Handlers, Listener, ListenerId};
pub use scheduler::{FifoScheduler, PriorityScheduler, Scheduler, SchedulerKind};
