//! Unified error system for boost operations
//!
//! A single error type shared by every crate in the workspace. Each variant maps
//! onto one wire code so callers see the same taxonomy regardless of which layer
//! raised the failure.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error type for all boost operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum BoostError {
    /// Resolver denied the request, or the caller has no session/profile
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Error message describing the denial
        message: String,
    },

    /// Boost, profile, hook or credential reference does not exist
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Duplicate role, hook, credential reference or handle
    #[error("Conflict: {message}")]
    Conflict {
        /// Error message describing the conflicting entity
        message: String,
    },

    /// Malformed input: bad URI, permission set, cyclic parent, unknown capability
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message describing the invalid input
        message: String,
    },

    /// Storage operation failed
    #[error("Storage error: {message}")]
    Storage {
        /// Error message describing the storage failure
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

/// Wire-level error code surfaced to RPC callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Caller is not allowed to perform the operation
    Unauthorized,
    /// Referenced entity does not exist
    NotFound,
    /// Entity already exists
    Conflict,
    /// Input was malformed
    BadRequest,
    /// Anything else
    InternalServerError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::BadRequest => "BAD_REQUEST",
            ErrorCode::InternalServerError => "INTERNAL_SERVER_ERROR",
        };
        f.write_str(code)
    }
}

impl BoostError {
    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wire code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unauthorized { .. } => ErrorCode::Unauthorized,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::Conflict { .. } => ErrorCode::Conflict,
            Self::BadRequest { .. } => ErrorCode::BadRequest,
            Self::Storage { .. } | Self::Internal { .. } => ErrorCode::InternalServerError,
        }
    }

    /// Whether this error is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Standard Result type for boost operations
pub type BoostResult<T> = std::result::Result<T, BoostError>;

impl From<serde_json::Error> for BoostError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("Invalid JSON: {err}"))
    }
}

impl From<std::io::Error> for BoostError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::unauthorized(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = BoostError::bad_request("cyclic parent");
        assert!(matches!(err, BoostError::BadRequest { .. }));
        assert_eq!(err.to_string(), "Bad request: cyclic parent");
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(BoostError::unauthorized("x").code(), ErrorCode::Unauthorized);
        assert_eq!(BoostError::not_found("x").code(), ErrorCode::NotFound);
        assert_eq!(BoostError::conflict("x").code(), ErrorCode::Conflict);
        assert_eq!(
            BoostError::storage("x").code(),
            ErrorCode::InternalServerError
        );
        assert_eq!(ErrorCode::BadRequest.to_string(), "BAD_REQUEST");
    }

    #[test]
    fn test_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = BoostError::from(io_err);
        assert!(err.is_not_found());
    }
}
