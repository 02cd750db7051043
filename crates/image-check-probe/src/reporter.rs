//! Health report sinks.
//!
//! A run ends with exactly one report: success, or a list of errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{ProbeError, ProbeResult};

/// Payload accepted by the reporting endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPayload {
    #[serde(rename = "OK")]
    pub ok: bool,

    #[serde(rename = "Errors")]
    pub errors: Vec<String>,
}

impl ReportPayload {
    /// Healthy report.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: Vec::new(),
        }
    }

    /// Unhealthy report.
    pub fn failure(errors: Vec<String>) -> Self {
        Self { ok: false, errors }
    }
}

/// Receiver of the final verdict.
#[async_trait]
pub trait HealthReporter: Send + Sync {
    /// Report that every referenced image is available.
    async fn report_success(&self) -> ProbeResult<()>;

    /// Report the errors that made the check fail.
    async fn report_failure(&self, errors: Vec<String>) -> ProbeResult<()>;
}

/// Writes the verdict to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

#[async_trait]
impl HealthReporter for LogReporter {
    async fn report_success(&self) -> ProbeResult<()> {
        info!("Check passed: all referenced images are available");
        Ok(())
    }

    async fn report_failure(&self, errors: Vec<String>) -> ProbeResult<()> {
        error!(errors = ?errors, "Check failed");
        Ok(())
    }
}

/// Posts the verdict as JSON to a reporting endpoint.
#[derive(Debug, Clone)]
pub struct HttpReporter {
    client: Client,
    url: String,
}

impl HttpReporter {
    /// Create a reporter posting to `url`.
    pub fn new(url: impl Into<String>) -> ProbeResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    async fn post(&self, payload: &ReportPayload) -> ProbeResult<()> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ProbeError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl HealthReporter for HttpReporter {
    async fn report_success(&self) -> ProbeResult<()> {
        info!(url = %self.url, "Reporting success");
        self.post(&ReportPayload::success()).await
    }

    async fn report_failure(&self, errors: Vec<String>) -> ProbeResult<()> {
        error!(url = %self.url, errors = ?errors, "Reporting errors");
        self.post(&ReportPayload::failure(errors)).await
    }
}

/// Reporter for the configured endpoint, or the log when none is set.
pub fn reporter_for(url: Option<&str>) -> ProbeResult<Box<dyn HealthReporter>> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        Some(url) => Ok(Box::new(HttpReporter::new(url)?)),
        None => Ok(Box::new(LogReporter)),
    }
}
