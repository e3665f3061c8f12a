//! Dispatch and configuration error types.

use std::any::Any;

use thiserror::Error;

/// Error returned by a listener's handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result returned by a listener's handler.
pub type HandlerResult = Result<(), HandlerError>;

/// Errors produced while dispatching one event to one listener.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The listener declares no handler for the event type or any ancestor.
    ///
    /// This is an ordinary outcome for listeners that only care about some
    /// event types.
    #[error("listener `{listener}` has no handler for {event_type}")]
    Unhandled {
        /// Most specific type of the event.
        event_type: &'static str,
        /// Name of the listener.
        listener: String,
    },

    /// The matched handler returned an error or panicked.
    #[error("handler for {handler_type} on listener `{listener}` failed: {source}")]
    Invocation {
        /// Most specific type of the event.
        event_type: &'static str,
        /// Event type the matched handler was declared for.
        handler_type: &'static str,
        /// Name of the listener.
        listener: String,
        /// The handler's own error.
        source: HandlerError,
    },
}

impl DispatchError {
    /// Returns `true` for [`DispatchError::Unhandled`].
    #[must_use]
    pub fn is_unhandled(&self) -> bool {
        matches!(self, Self::Unhandled { .. })
    }

    /// Returns `true` for [`DispatchError::Invocation`].
    #[must_use]
    pub fn is_invocation(&self) -> bool {
        matches!(self, Self::Invocation { .. })
    }

    /// Most specific type of the event that failed to dispatch.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Unhandled { event_type, .. } | Self::Invocation { event_type, .. } => event_type,
        }
    }

    /// Name of the listener the dispatch targeted.
    #[must_use]
    pub fn listener(&self) -> &str {
        match self {
            Self::Unhandled { listener, .. } | Self::Invocation { listener, .. } => listener,
        }
    }
}

/// Result type for dispatch operations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// A handler panicked instead of returning.
#[derive(Debug, Error)]
#[error("handler panicked: {message}")]
pub struct HandlerPanic {
    /// Panic message, if the payload was a string.
    pub message: String,
}

impl HandlerPanic {
    /// Build from a payload returned by `std::panic::catch_unwind`.
    #[must_use]
    pub fn from_payload(payload: &(dyn Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { message }
    }
}

/// Errors that can occur while loading emitter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config {path}: {source}")]
    ReadError {
        /// Path of the file.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The configuration is not valid TOML or has unknown fields.
    #[error("failed to parse config {path}: {source}")]
    ParseError {
        /// Path of the file, or `<inline>` for string input.
        path: String,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// A field holds a value that is not allowed.
    #[error("invalid config field `{field}`: {message}")]
    ValidationError {
        /// Offending field.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
