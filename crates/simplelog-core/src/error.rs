//! Error types for the log service
//!
//! Errors fall into two categories: lifecycle misuse (an API called in the
//! wrong phase) and fatal resource failures (a log file that cannot be
//! opened, written or closed). Callers decide whether to abort.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::ServiceState;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Log service error types organized by category
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Lifecycle Misuse
    // ─────────────────────────────────────────────────────────────
    #[error("log service was already started")]
    AlreadyRunning,

    #[error("log service is not running")]
    NotRunning,

    #[error("log service is stopping")]
    Stopping,

    #[error("log file not initialized")]
    LogFileNotInitialized,

    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition {
        from: ServiceState,
        to: ServiceState,
    },

    #[error("unknown log target: {name}")]
    UnknownTarget { name: String },

    // ─────────────────────────────────────────────────────────────
    // Resource Errors
    // ─────────────────────────────────────────────────────────────
    #[error("log file error for {path}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{count} accepted records were dropped, no log file was open")]
    RecordsDropped { count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Channel/Communication Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Channel send error: {message}")]
    ChannelSend { message: String },

    #[error("Channel closed unexpectedly")]
    ChannelClosed,

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Resource {
            path: path.into(),
            source,
        }
    }

    pub fn unknown_target(name: impl Into<String>) -> Self {
        Self::UnknownTarget { name: name.into() }
    }

    pub fn channel_send(message: impl Into<String>) -> Self {
        Self::ChannelSend {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error was caused by calling the API in the wrong phase
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Error::AlreadyRunning
                | Error::NotRunning
                | Error::Stopping
                | Error::LogFileNotInitialized
                | Error::InvalidTransition { .. }
                | Error::UnknownTarget { .. }
        )
    }

    /// Check if this error means a log target is unusable
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Resource { .. } | Error::RecordsDropped { .. } | Error::Io(_)
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
