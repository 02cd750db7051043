//! # image-check-probe
//!
//! Runs one image availability check and reports the verdict.
//!
//! The probe layers configuration (defaults, file, environment, command
//! line), runs the [`image_check::Reconciler`] against the HTTP gateway
//! backends inside an error boundary, and posts exactly one report to the
//! configured [`reporter::HealthReporter`].

pub mod cli;
pub mod error;
pub mod probe;
pub mod reporter;

pub use cli::Cli;
pub use error::{ProbeError, ProbeResult};
pub use probe::{deliver, run_guarded, shutdown_signal, ProbeOutcome};
pub use reporter::{reporter_for, HealthReporter, HttpReporter, LogReporter, ReportPayload};
