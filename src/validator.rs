//! Batch connection health checks
//!
//! Runs a health check on each selected connection in order and
//! collects one [`ValidationResult`] per connection. A failing
//! connection never stops the batch.

use crate::client::MailboxClientFactory;
use crate::connection::Connection;
use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Why a connection failed its health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReason {
    /// Short classification, e.g. `connection` or `provisioning`.
    pub kind: String,
    /// Last low-level error text.
    pub detail: String,
}

impl FailureReason {
    fn from_error(error: &Error) -> Self {
        let detail = match error {
            Error::Connection { last_error, .. } => last_error.clone(),
            Error::Disabled { .. } => "connection is not enabled".to_string(),
            other => other.to_string(),
        };
        Self {
            kind: error.kind().to_string(),
            detail,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failed(FailureReason),
}

impl Outcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("SUCCESS"),
            Self::Failed(reason) => write!(f, "FAILED: {reason}"),
        }
    }
}

/// Health check result for one connection. Carries display fields
/// only; never the password.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub name: String,
    pub outcome: Outcome,
    pub address: String,
    pub username: String,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallOutcome {
    AllSucceeded,
    Failed,
}

/// Ordered per-connection results.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub started_at: DateTime<Utc>,
    pub results: Vec<ValidationResult>,
}

impl BatchReport {
    /// `AllSucceeded` iff every result succeeded (vacuously true for
    /// an empty report).
    #[must_use]
    pub fn overall(&self) -> OverallOutcome {
        if self.results.iter().all(|r| r.outcome.is_success()) {
            OverallOutcome::AllSucceeded
        } else {
            OverallOutcome::Failed
        }
    }

    /// Process exit status: 0 when all succeeded, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.overall() {
            OverallOutcome::AllSucceeded => 0,
            OverallOutcome::Failed => 1,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.outcome.is_success())
    }
}

/// Runs health checks over a set of connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionValidator {
    timeout: Option<Duration>,
}

impl ConnectionValidator {
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout: None }
    }

    /// Give up on a single connection after `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check each connection in order.
    pub async fn run<F: MailboxClientFactory>(
        &self,
        connections: &[&Connection<F>],
    ) -> BatchReport {
        let started_at = Utc::now();
        let mut results = Vec::with_capacity(connections.len());

        for connection in connections {
            results.push(self.check(connection).await);
        }

        let report = BatchReport {
            started_at,
            results,
        };
        info!(
            "Checked {} connection(s), {} failed",
            report.len(),
            report.failures().count()
        );
        report
    }

    async fn check<F: MailboxClientFactory>(&self, connection: &Connection<F>) -> ValidationResult {
        let start = Instant::now();

        let outcome = match self.test(connection).await {
            Ok(()) => Outcome::Success,
            Err(e) => {
                warn!("Connection {} failed its health check: {}", connection.name(), e);
                Outcome::Failed(FailureReason::from_error(&e))
            }
        };

        ValidationResult {
            name: connection.name().to_string(),
            outcome,
            address: connection.address().to_string(),
            username: connection.username().to_string(),
            elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    async fn test<F: MailboxClientFactory>(&self, connection: &Connection<F>) -> Result<(), Error> {
        match self.timeout {
            None => connection.try_test_connection().await,
            Some(after) => tokio::time::timeout(after, connection.try_test_connection())
                .await
                .unwrap_or_else(|_| {
                    Err(Error::Timeout {
                        name: connection.name().to_string(),
                        after,
                    })
                }),
        }
    }
}
