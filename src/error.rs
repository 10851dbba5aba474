//! Error types for the queued client
//!
//! Two classes of failure exist on a connection:
//! - recoverable: the daemon answered with a failure marker, or an argument
//!   was rejected before anything was written. The connection stays usable.
//! - fatal: the byte stream itself failed or can no longer be trusted. The
//!   connection must be rebuilt.

use thiserror::Error;

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;

/// Unified error type for client operations
#[derive(Debug, Error)]
pub enum QueueError {
    // -------------------------------------------------------------------------
    // Transport Errors (fatal)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Connection closed by peer")]
    ConnectionClosed,

    #[error("Truncated reply: {0}")]
    Truncated(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Connection is broken, reconnect before issuing commands")]
    Broken,

    // -------------------------------------------------------------------------
    // Daemon Errors (recoverable)
    // -------------------------------------------------------------------------
    #[error("Server error: {0}")]
    Server(String),

    // -------------------------------------------------------------------------
    // Local Errors (recoverable)
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueError {
    /// Returns whether the connection that produced this error is unusable.
    pub fn is_fatal(&self) -> bool {
        match self {
            QueueError::Io(_)
            | QueueError::ConnectionClosed
            | QueueError::Truncated(_)
            | QueueError::Protocol(_)
            | QueueError::Broken => true,
            QueueError::Server(_) | QueueError::InvalidArgument(_) | QueueError::Config(_) => {
                false
            }
        }
    }

    /// The daemon's error text, if this is a daemon rejection.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            QueueError::Server(message) => Some(message),
            _ => None,
        }
    }
}
