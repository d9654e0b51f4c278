//! Error types for the Galaxy3D descriptor layer
//!
//! This module defines the error types returned by backend calls
//! (pool creation, set allocation, layout creation) and configuration checks.
//!
//! Pool exhaustion inside the growing pool and precondition violations are not
//! reported through these types: they terminate with a diagnostic instead
//! (see `engine_fatal!`).

use std::fmt;

/// Result type for Galaxy3D descriptor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Galaxy3D descriptor errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, etc.)
    BackendError(String),

    /// The native descriptor pool has no room left for the requested set
    OutOfPoolMemory,

    /// Invalid resource (layout, set, buffer, texture)
    InvalidResource(String),

    /// Initialization failed (manager, pool, configuration)
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfPoolMemory => write!(f, "Out of descriptor pool memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
