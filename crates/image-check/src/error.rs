//! Error types for the image-check crate.
//!
//! Fatal errors ([`ConfigError`], [`TransportError`]) abort a run. Recoverable
//! errors ([`ParseError`], [`RecordError`]) stay at key or record granularity.

use std::time::Duration;

use thiserror::Error;

/// Malformed run configuration. Raised before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Region does not look like `xx-xxxx-N`.
    #[error("region '{0}' does not match expected format")]
    InvalidRegion(String),

    /// A required field was left blank.
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// Concurrency or deadline outside the accepted range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// The layered configuration could not be built or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(String),
}

/// Failed call to the inventory store or the image catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request could not be completed.
    #[error("{operation} failed: {reason}")]
    Request {
        operation: &'static str,
        reason: String,
    },

    /// The remote side answered with a non-success status.
    #[error("{operation} returned status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// The provider repeated a continuation token, so paging would never end.
    #[error("listing namespace {namespace} stalled on repeated continuation token '{token}'")]
    StalledPagination { namespace: String, token: String },

    /// The run deadline elapsed before the check completed.
    #[error("check deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

impl TransportError {
    /// Build a request failure for the named operation.
    pub fn request(operation: &'static str, reason: impl ToString) -> Self {
        TransportError::Request {
            operation,
            reason: reason.to_string(),
        }
    }
}

/// Manifest body that could not be decoded. Logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode manifest at {key}: {reason}")]
pub struct ParseError {
    pub key: String,
    pub reason: String,
}

/// Structurally invalid instance group. Contributes one diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The manifest decoded but names no image.
    #[error("instance group {0} does not define an image")]
    MissingImage(String),

    /// An empty image reference reached name extraction.
    #[error("image reference is empty")]
    EmptyReference,
}

/// Errors that end a check run without a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for check operations.
pub type CheckResult<T> = Result<T, CheckError>;

/// Result type for backend calls.
pub type TransportResult<T> = Result<T, TransportError>;
