//! Error types for junos-provider.
//!
//! This module defines the error type shared by the engine, the sessions and
//! the resources. Variants are grouped by the stage that produces them so a
//! caller can tell a rejected configuration from a device failure.

use thiserror::Error;

use crate::connection::ConnectionError;
use crate::diagnostics::AttributePath;

/// Result type alias for junos-provider operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for junos-provider.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// A configuration value breaks a structural rule.
    #[error("{path}: {message}")]
    Validation {
        /// Attribute the error is attached to
        path: AttributePath,
        /// Error message
        message: String,
    },

    /// Input could not be decoded into the resource's configuration type.
    #[error("Invalid input for '{resource}': {message}")]
    InvalidInput {
        /// Resource type name
        resource: String,
        /// Error message
        message: String,
    },

    /// Import identifier does not have the expected shape.
    #[error("Invalid import id '{id}' for '{resource}': expected {expected}")]
    InvalidImportId {
        /// Resource type name
        resource: String,
        /// The identifier given by the user
        id: String,
        /// Human-readable description of the expected format
        expected: String,
    },

    /// Resource type is not registered.
    #[error("Resource type '{0}' not found")]
    UnknownResource(String),

    // ========================================================================
    // Pre-check Errors
    // ========================================================================
    /// The resource already exists on the device.
    #[error("{resource} '{id}' already exists")]
    AlreadyExists {
        /// Resource type name
        resource: String,
        /// Resource identifier
        id: String,
    },

    /// A parent object the resource depends on is missing.
    #[error("{0}")]
    MissingParent(String),

    /// The device model cannot host this resource type.
    #[error("{resource} not compatible with Junos device '{model}'")]
    Incompatible {
        /// Resource type name
        resource: String,
        /// Hardware model reported by the device
        model: String,
    },

    // ========================================================================
    // Device Errors
    // ========================================================================
    /// Transport-level failure.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// The device rejected an operation.
    #[error("Device {operation} failed: {message}")]
    Device {
        /// Operation that failed (lock, load, commit, ...)
        operation: &'static str,
        /// Error message reported by the device
        message: String,
    },

    /// The session was used after being closed.
    #[error("Session closed")]
    SessionClosed,

    // ========================================================================
    // Post-check Errors
    // ========================================================================
    /// Commit succeeded but the resource is not on the device afterward.
    #[error("{resource} '{id}' does not exist after commit => check your config")]
    NotFoundAfterCommit {
        /// Resource type name
        resource: String,
        /// Resource identifier
        id: String,
    },

    /// Import read did not find the resource.
    #[error("Don't find {resource} with id '{id}' (id must be {expected})")]
    ImportNotFound {
        /// Resource type name
        resource: String,
        /// The identifier given by the user
        id: String,
        /// Human-readable description of the expected format
        expected: String,
    },

    // ========================================================================
    // Parse Errors
    // ========================================================================
    /// A value read back from the device is malformed.
    #[error("Failed to convert value from '{value}' to integer for {field}: {message}")]
    ParseInt {
        /// Field being read
        field: String,
        /// Offending text
        value: String,
        /// Underlying error
        message: String,
    },

    // ========================================================================
    // Other Errors
    // ========================================================================
    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a validation error attached to an attribute path.
    pub fn validation(path: AttributePath, message: impl Into<String>) -> Self {
        Error::Validation {
            path,
            message: message.into(),
        }
    }

    /// Create a device error for the given operation.
    pub fn device(operation: &'static str, message: impl Into<String>) -> Self {
        Error::Device {
            operation,
            message: message.into(),
        }
    }

    /// Attribute path the error refers to, if any.
    pub fn path(&self) -> Option<&AttributePath> {
        match self {
            Error::Validation { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Whether the error was raised before any device interaction.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation { .. }
                | Error::InvalidInput { .. }
                | Error::InvalidImportId { .. }
                | Error::UnknownResource(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation(
            AttributePath::root("forwarding_table").attr("ecmp_fast_reroute"),
            "conflicts with no_ecmp_fast_reroute",
        );
        assert_eq!(
            err.to_string(),
            "forwarding_table.ecmp_fast_reroute: conflicts with no_ecmp_fast_reroute"
        );
        assert!(err.is_validation());
        assert_eq!(
            err.path().map(ToString::to_string).as_deref(),
            Some("forwarding_table.ecmp_fast_reroute")
        );
    }

    #[test]
    fn test_post_check_error_display() {
        let err = Error::NotFoundAfterCommit {
            resource: "junos_security_zone".to_string(),
            id: "trust".to_string(),
        };
        assert!(err.to_string().contains("does not exist after commit"));
        assert!(!err.is_validation());
        assert!(err.path().is_none());
    }

    #[test]
    fn test_device_error_display() {
        let err = Error::device("commit", "configuration check-out failed");
        assert_eq!(
            err.to_string(),
            "Device commit failed: configuration check-out failed"
        );
    }
}
