//! Herald Test - Shared test utilities for Herald.
//!
//! This crate provides fixture events, recording listeners and test helpers
//! that can be used across Herald crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! herald-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust
//! use std::sync::Arc;
//! use herald_events::Emitter;
//! use herald_test::{Ping, RecordingListener, test_alert};
//!
//! let recorder = Arc::new(RecordingListener::builder("audit").record::<Ping>().build());
//! let emitter = Emitter::new();
//! emitter.add_listener(recorder.clone());
//!
//! emitter.emit(&test_alert(1, 3));
//! assert_eq!(recorder.handler_types(), vec![std::any::type_name::<Ping>()]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
