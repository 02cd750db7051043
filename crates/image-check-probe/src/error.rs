//! Error types for the probe

use image_check::{CheckError, TransportError};
use thiserror::Error;

/// Probe errors
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The check itself could not run.
    #[error(transparent)]
    Check(#[from] CheckError),

    /// A backend client could not be created.
    #[error("backend setup failed: {0}")]
    Backend(#[from] TransportError),

    /// The report sink could not be reached.
    #[error("failed to deliver report: {0}")]
    Delivery(#[from] reqwest::Error),

    /// The report sink rejected the report.
    #[error("report rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Result type for probe operations
pub type ProbeResult<T> = Result<T, ProbeError>;
