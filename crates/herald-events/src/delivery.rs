//! Emitter identity and per-delivery context.

use std::fmt;

use uuid::Uuid;

/// Identity stamped on every delivery made by an emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmitterId(Uuid);

impl EmitterId {
    /// Create a new random emitter ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an emitter ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EmitterId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EmitterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emitter:{}", self.0)
    }
}

/// Context handed to a handler alongside the event it receives.
///
/// Events are never mutated during dispatch; everything that is specific to
/// one delivery travels here instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    emitter: EmitterId,
    sequence: u64,
}

impl Delivery {
    /// Create a delivery context.
    #[must_use]
    pub const fn new(emitter: EmitterId, sequence: u64) -> Self {
        Self { emitter, sequence }
    }

    /// Identity of the emitter that produced this delivery.
    #[must_use]
    pub const fn emitter(&self) -> EmitterId {
        self.emitter
    }

    /// Per-emitter sequence number of the `emit` call. Shared by every
    /// listener reached by that call.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}
