//! Common error types for the event-operations service

use thiserror::Error;

/// Common result type for event-operations code
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across workspace crates
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Entity is not in the state the operation expects
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A bounded queue has reached its limit
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}
