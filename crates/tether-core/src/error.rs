//! Core error types for Tether

use std::path::PathBuf;
use thiserror::Error;

/// Diagnostic message the store raises when read access was disabled when
/// the service was built. [`QueryError::FeatureDisabled`] is reported only
/// for runtime faults carrying exactly this text, which keeps the condition
/// distinguishable from a permission failure.
pub const READ_ACCESS_DISABLED: &str =
    "read access to the store was disabled at build time";

/// Top-level error type for the tether ecosystem
#[derive(Error, Debug)]
pub enum TetherError {
    /// Connection error
    #[error("Connection error: {0}")]
    Connect(#[from] ConnectError),

    /// Registration transport fault
    #[error("Registration error: {0}")]
    Registration(#[from] TransportFault),

    /// Store query error
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Bind request errors
#[derive(Error, Debug)]
pub enum ConnectError {
    /// The transport refused the bind request outright (malformed target,
    /// security policy)
    #[error("Bind request rejected: {0}")]
    RequestRejected(String),

    /// A bind is already in progress or established on this connector
    #[error("Link is already bound or binding")]
    AlreadyBound,
}

/// The registration call failed at the transport layer.
///
/// Non-fatal: the connector stays usable and a later connect notification
/// restarts the handshake from scratch.
#[derive(Error, Debug)]
#[error("Registration transport fault: {0}")]
pub struct TransportFault(pub String);

/// Fault raised by the tabular store capability
#[derive(Error, Debug)]
pub enum StoreFault {
    /// The query was malformed, typically an unknown table name
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The caller lacks the trust credential required to read the store
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Runtime fault with a store-provided diagnostic
    #[error("{0}")]
    Runtime(String),
}

/// Store query errors, one distinct variant per non-retryable outcome.
///
/// Callers must branch on the variant; none of these is retried
/// automatically.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The named table does not exist in the remote schema
    #[error("No such table: {0}")]
    InvalidTable(String),

    /// Trust credential mismatch. Usually means this client is not signed
    /// with the same signature as the service.
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// The store was built with read access disabled entirely
    #[error("{}", READ_ACCESS_DISABLED)]
    FeatureDisabled,

    /// The store returned no cursor and no distinguishable error
    #[error("Store returned no cursor")]
    NullResult,

    /// Unexpected store fault outside the known taxonomy, propagated
    /// unchanged
    #[error(transparent)]
    Fault(StoreFault),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_disabled_distinguishable_from_access_denied() {
        let disabled = QueryError::FeatureDisabled.to_string();
        let denied = QueryError::AccessDenied("signature mismatch".into()).to_string();
        assert_ne!(disabled, denied);
        assert!(disabled.contains("disabled at build time"));
        assert!(denied.starts_with("Access denied"));
    }

    #[test]
    fn test_unexpected_fault_passes_through_unchanged() {
        let fault = StoreFault::Runtime("disk on fire".into());
        let message = fault.to_string();
        assert_eq!(QueryError::Fault(fault).to_string(), message);
    }
}
