//! Top-level error boundary for one check run.
//!
//! Whatever happens inside the run (a report, a fatal error or a panic) ends
//! up as a [`ProbeOutcome`] that can be reported.

use std::any::Any;
use std::future::Future;

use image_check::{CheckReport, CheckResult};
use tracing::{error, info, warn};

use crate::error::ProbeResult;
use crate::reporter::HealthReporter;

/// What gets reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Every referenced image was found.
    Healthy(Box<CheckReport>),
    /// The check failed; each entry is one reported error.
    Unhealthy(Vec<String>),
}

impl ProbeOutcome {
    /// Whether the run passed.
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeOutcome::Healthy(_))
    }
}

/// Run `check` on its own task and convert every result into an outcome.
///
/// Diagnostics are joined into a single error. Fatal errors are reported
/// alone. A panic becomes `panic: <message>`.
pub async fn run_guarded<F>(check: F) -> ProbeOutcome
where
    F: Future<Output = CheckResult<CheckReport>> + Send + 'static,
{
    match tokio::spawn(check).await {
        Ok(Ok(report)) => match report.failure_message() {
            None => ProbeOutcome::Healthy(Box::new(report)),
            Some(message) => ProbeOutcome::Unhealthy(vec![message]),
        },
        Ok(Err(e)) => {
            error!(error = %e, "Check aborted");
            ProbeOutcome::Unhealthy(vec![e.to_string()])
        }
        Err(join_error) if join_error.is_panic() => {
            let message = panic_message(join_error.into_panic());
            error!(panic = %message, "Recovered panic");
            ProbeOutcome::Unhealthy(vec![format!("panic: {}", message)])
        }
        Err(join_error) => ProbeOutcome::Unhealthy(vec![format!("check task cancelled: {}", join_error)]),
    }
}

/// Send `outcome` to `reporter`.
pub async fn deliver(reporter: &dyn HealthReporter, outcome: ProbeOutcome) -> ProbeResult<()> {
    match outcome {
        ProbeOutcome::Healthy(report) => {
            info!(
                run_id = %report.run_id,
                records = report.records_checked,
                catalog = report.catalog_size,
                "Instance group images are available"
            );
            reporter.report_success().await
        }
        ProbeOutcome::Unhealthy(errors) => reporter.report_failure(errors).await,
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, abandoning check");
        }
        _ = terminate => {
            info!("Received terminate signal, abandoning check");
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        return (*text).to_string();
    }
    if let Some(text) = payload.downcast_ref::<String>() {
        return text.clone();
    }
    "unknown panic".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_check::{CheckError, ConfigError, Diagnostic};

    fn report(diagnostics: Vec<Diagnostic>) -> CheckReport {
        CheckReport {
            run_id: Default::default(),
            started_at: Default::default(),
            finished_at: Default::default(),
            keys_scanned: 1,
            records_checked: 1,
            manifests_skipped: 0,
            catalog_size: 3,
            diagnostics,
        }
    }

    #[tokio::test]
    async fn test_healthy_report() {
        let outcome = run_guarded(async { Ok(report(vec![])) }).await;
        assert!(outcome.is_healthy());
    }

    #[tokio::test]
    async fn test_diagnostics_are_joined() {
        let outcome = run_guarded(async {
            Ok(report(vec![
                Diagnostic::unmatched("a"),
                Diagnostic::unmatched("b"),
            ]))
        })
        .await;

        assert_eq!(
            outcome,
            ProbeOutcome::Unhealthy(vec![
                "could not find image matching a; could not find image matching b".to_string()
            ])
        );
    }

    #[tokio::test]
    async fn test_fatal_error_is_sole_reason() {
        let outcome = run_guarded(async {
            Err(CheckError::Config(ConfigError::MissingField("bucket")))
        })
        .await;

        assert_eq!(
            outcome,
            ProbeOutcome::Unhealthy(vec!["configuration error: bucket must not be empty".to_string()])
        );
    }

    #[tokio::test]
    async fn test_panic_becomes_diagnostic() {
        let outcome = run_guarded(async {
            if true {
                panic!("catalog exploded");
            }
            Ok(report(vec![]))
        })
        .await;

        assert_eq!(
            outcome,
            ProbeOutcome::Unhealthy(vec!["panic: catalog exploded".to_string()])
        );
    }

    #[test]
    fn test_panic_message_fallback() {
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
    }
}
