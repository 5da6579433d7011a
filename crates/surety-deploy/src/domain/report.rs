//! # Deployment Report
//!
//! Outcome of a deployment run that got past component creation. Each
//! non-fatal step carries its own typed result; the caller decides which of
//! them to escalate with [`DeploymentReport::enforce`].

use crate::domain::descriptor::DeploymentDescriptor;
use crate::domain::entities::{AuthorizationGrant, Component};
use crate::errors::{AuthorizationError, ConfigError, DeploymentError, PublishError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// How a failed non-fatal step is treated when the report is enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepPolicy {
    /// Logged and reported, run still succeeds.
    Warn,
    /// Turns the run into an error.
    #[default]
    Fatal,
}

impl FromStr for StepPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "warn" => Ok(Self::Warn),
            "fatal" => Ok(Self::Fatal),
            _ => Err(ConfigError {
                key: "policy".to_string(),
                value: s.to_string(),
                reason: "expected `warn` or `fatal`".to_string(),
            }),
        }
    }
}

/// Result of writing the descriptor to one sink.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkReport {
    /// Sink name.
    pub sink: String,
    /// Write outcome.
    pub result: Result<(), PublishError>,
}

impl SinkReport {
    /// Returns true if the descriptor landed at this sink.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a completed deployment run produced.
#[derive(Clone, Debug)]
pub struct DeploymentReport {
    /// Correlation ID of the run (also on its tracing span).
    pub run_id: Uuid,
    /// Data-holding component (A).
    pub data_holder: Component,
    /// Logic-holding component (B), created with A's address.
    pub logic_holder: Component,
    /// Descriptor assembled from A and B.
    pub descriptor: DeploymentDescriptor,
    /// One entry per configured sink, in configuration order.
    pub publications: Vec<SinkReport>,
    /// Outcome of the authorization handshake.
    pub authorization: Result<AuthorizationGrant, AuthorizationError>,
}

impl DeploymentReport {
    /// Returns true if B was authorized against A.
    #[must_use]
    pub fn is_authorized(&self) -> bool {
        self.authorization.is_ok()
    }

    /// Names of the sinks that did not receive the descriptor.
    #[must_use]
    pub fn failed_sinks(&self) -> Vec<String> {
        self.publications
            .iter()
            .filter(|r| !r.is_ok())
            .map(|r| r.sink.clone())
            .collect()
    }

    /// Returns true if every step succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.is_authorized() && self.publications.iter().all(SinkReport::is_ok)
    }

    /// Applies the caller's fatal-vs-warning policy.
    ///
    /// Authorization is checked before publication.
    pub fn enforce(
        self,
        authorization: StepPolicy,
        publication: StepPolicy,
    ) -> Result<Self, DeploymentError> {
        if authorization == StepPolicy::Fatal {
            if let Err(err) = &self.authorization {
                return Err(DeploymentError::AuthorizationFailed(err.clone()));
            }
        }

        let failed = self.failed_sinks();
        if publication == StepPolicy::Fatal && !failed.is_empty() {
            return Err(DeploymentError::PublishFailed { sinks: failed });
        }

        Ok(self)
    }
}

// =============================================================================
// TESTS
// =============================================================================
