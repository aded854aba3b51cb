//! Error types for clicktrail.
//!
//! This module defines the error type returned by the fallible parts of the
//! crate: configuration, delivery, event sources and the CLI. The tracking
//! calls themselves never return these; they log and carry on.

use thiserror::Error;

/// The main error type for clicktrail operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Delivery Errors ===
    /// The collection endpoint answered with a non-2xx status.
    #[error("delivery to {url} rejected with status {status}")]
    DeliveryStatus {
        /// Endpoint the event was posted to.
        url: String,
        /// HTTP status returned by the endpoint.
        status: u16,
    },

    /// The request never produced a response.
    #[error("delivery to {url} failed: {message}")]
    DeliveryTransport {
        /// Endpoint the event was posted to.
        url: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Event Source Errors ===
    /// An event source failed to attach to its host.
    #[error("failed to attach event source '{name}': {message}")]
    SourceAttach {
        /// Name of the event source.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// An event source failed to detach from its host.
    #[error("failed to detach event source '{name}': {message}")]
    SourceDetach {
        /// Name of the event source.
        name: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Replay Errors ===
    /// A line of a replay file is not a host event.
    #[error("invalid event on line {line}: {source}")]
    ReplayLine {
        /// 1-based line number.
        line: usize,
        /// The parse failure.
        source: serde_json::Error,
    },
}

/// A specialized Result type for clicktrail operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a source attach error.
    #[must_use]
    pub fn source_attach(name: &'static str, message: impl Into<String>) -> Self {
        Self::SourceAttach {
            name,
            message: message.into(),
        }
    }

    /// Create a source detach error.
    #[must_use]
    pub fn source_detach(name: &'static str, message: impl Into<String>) -> Self {
        Self::SourceDetach {
            name,
            message: message.into(),
        }
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Check if this error came from the delivery path.
    #[must_use]
    pub fn is_delivery_error(&self) -> bool {
        matches!(
            self,
            Self::DeliveryStatus { .. } | Self::DeliveryTransport { .. }
        )
    }
}
