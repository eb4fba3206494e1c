//! Unified error system for Rescue
//!
//! A single error type shared by every crate in the workspace. Probe-level
//! chain failures never surface through this type; they are absorbed into
//! probe state. `RescueError` is what trigger callbacks and configuration
//! loading return.

use serde::{Deserialize, Serialize};

/// Unified error type for all Rescue operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum RescueError {
    /// Invalid input
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Chain query rejected by the transport
    #[error("Network error: {message}")]
    Network {
        /// Error message describing the network issue
        message: String,
    },

    /// On-chain payload did not match the expected shape
    #[error("Decode error: {message}")]
    Decode {
        /// Error message describing the decode failure
        message: String,
    },

    /// Local validation rejected an action before it reached the chain
    #[error("Precondition not met: {message}")]
    PreconditionNotMet {
        /// Error message describing the unmet precondition
        message: String,
    },

    /// Configuration could not be loaded or validated
    #[error("Config error: {message}")]
    Config {
        /// Error message describing the configuration problem
        message: String,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl RescueError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionNotMet {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. })
    }
}

/// Standard Result type for Rescue operations
pub type Result<T> = std::result::Result<T, RescueError>;

impl From<std::io::Error> for RescueError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RescueError {
    fn from(err: serde_json::Error) -> Self {
        Self::decode(err.to_string())
    }
}

impl From<toml::de::Error> for RescueError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = RescueError::precondition("no rescuer selected");
        assert!(matches!(err, RescueError::PreconditionNotMet { .. }));
        assert_eq!(err.to_string(), "Precondition not met: no rescuer selected");
    }

    #[test]
    fn test_io_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(RescueError::from(io_err), RescueError::NotFound { .. }));
    }

    #[test]
    fn test_only_network_is_retryable() {
        assert!(RescueError::network("timeout").is_retryable());
        assert!(!RescueError::decode("bad shape").is_retryable());
        assert!(!RescueError::precondition("x").is_retryable());
    }
}
