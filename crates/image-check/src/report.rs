//! Outcome of one check run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::model::Diagnostic;

/// Separator used when diagnostics are joined into one failure message.
pub const DIAGNOSTIC_SEPARATOR: &str = "; ";

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Identifier used to correlate log lines of this run.
    pub run_id: Uuid,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the match pass finished.
    pub finished_at: DateTime<Utc>,

    /// Manifest keys that passed the key filters.
    pub keys_scanned: usize,

    /// Records that went through the match pass.
    pub records_checked: usize,

    /// Keys skipped because of an empty or malformed body.
    pub manifests_skipped: usize,

    /// Images returned by the catalog.
    pub catalog_size: usize,

    /// Failures, in processing order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Final verdict of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Every referenced image exists.
    Healthy,
    /// At least one diagnostic was produced.
    Unhealthy(Vec<String>),
}

impl Verdict {
    /// Whether the run succeeded.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Verdict::Healthy)
    }
}

impl CheckReport {
    /// Whether no diagnostics were produced.
    pub fn is_healthy(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Verdict derived from the diagnostics.
    pub fn verdict(&self) -> Verdict {
        if self.is_healthy() {
            Verdict::Healthy
        } else {
            Verdict::Unhealthy(
                self.diagnostics
                    .iter()
                    .map(|d| d.as_str().to_string())
                    .collect(),
            )
        }
    }

    /// All diagnostics joined in order, or `None` when healthy.
    pub fn failure_message(&self) -> Option<String> {
        if self.is_healthy() {
            return None;
        }
        Some(
            self.diagnostics
                .iter()
                .map(Diagnostic::as_str)
                .collect::<Vec<_>>()
                .join(DIAGNOSTIC_SEPARATOR),
        )
    }
}
