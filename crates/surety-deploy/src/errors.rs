//! # Error Types
//!
//! All error types for deployment, publication, authorization and
//! registration.
//!
//! Only [`DeploymentError::ComponentCreation`] aborts a run as it happens.
//! Every other error is collected per step (per sink, per participant) and
//! reported when the run ends.

use crate::domain::value_objects::{Address, Hash};
use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// LEDGER ERRORS
// =============================================================================

/// Errors returned by a ledger adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The transaction executed and reverted.
    #[error("transaction reverted: {reason}")]
    Reverted {
        /// Revert reason reported by the ledger.
        reason: String,
    },

    /// No receipt appeared within the polling budget.
    #[error("transaction {tx_hash:?} not finalized after {polls} receipt polls")]
    NotFinalized {
        /// Submitted transaction.
        tx_hash: Hash,
        /// Polls attempted.
        polls: u32,
    },

    /// The ledger does not know how to create this component.
    #[error("unknown artifact: {0}")]
    UnknownArtifact(String),

    /// No component lives at the target address.
    #[error("no component at address {0:?}")]
    UnknownComponent(Address),

    /// Creation bytecode is missing or not valid hex.
    #[error("invalid bytecode for {0}")]
    InvalidBytecode(String),

    /// The node answered with a JSON-RPC error object.
    #[error("JSON-RPC error: {0}")]
    Rpc(String),

    /// The node could not be reached.
    #[error("ledger unreachable: {0}")]
    Transport(String),

    /// The node answered with something this adapter cannot interpret.
    #[error("malformed ledger response: {0}")]
    Malformed(String),
}

impl LedgerError {
    /// Returns true if the ledger executed and refused the transaction, as
    /// opposed to the transaction never being processed.
    #[must_use]
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::Reverted { .. })
    }
}

// =============================================================================
// PUBLISH ERRORS
// =============================================================================

/// Per-sink publication failure. Never fatal to a deployment run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The descriptor could not be serialized; no sink was written.
    #[error("failed to serialize descriptor: {0}")]
    Serialization(String),

    /// The sink refused or failed the write.
    #[error("failed to write descriptor to {sink}: {message}")]
    Write {
        /// Sink name.
        sink: String,
        /// Underlying cause.
        message: String,
    },
}

// =============================================================================
// DESCRIPTOR ERRORS
// =============================================================================

/// Component names that cannot share one descriptor network entry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Two components carry the same name.
    #[error("component name {0:?} used more than once")]
    DuplicateComponent(String),

    /// A component name collides with a network-level key.
    #[error("component name {0:?} is reserved")]
    ReservedName(String),
}

// =============================================================================
// AUTHORIZATION ERRORS
// =============================================================================

/// Failure of the authorization handshake.
///
/// Leaves the grantee unauthorized; later calls through the grantee may fail
/// on that.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    /// The grantor refused the call (caller not its creator, grantee conflict).
    #[error("authorization of {grantee:?} on {grantor:?} rejected: {reason}")]
    Rejected {
        /// Component asked to grant access.
        grantor: Address,
        /// Component that was to receive access.
        grantee: Address,
        /// Refusal reason.
        reason: String,
    },

    /// The call never completed.
    #[error("authorization call failed: {0}")]
    Ledger(LedgerError),
}

impl AuthorizationError {
    /// Returns true if the grantor explicitly refused.
    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

// =============================================================================
// REGISTRATION ERRORS
// =============================================================================

/// Why one participant ended up unconfirmed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// The registry refused the request (insufficient fee, duplicate identity).
    #[error("registration rejected: {0}")]
    Rejected(LedgerError),

    /// The request completed but no confirmation named the participant.
    #[error("registration completed without a confirmation event")]
    Unconfirmed,

    /// More than one confirmation named the participant.
    #[error("confirmation observed {0} times, expected exactly once")]
    DuplicateConfirmation(usize),

    /// The submitting task panicked or was cancelled.
    #[error("registration task aborted: {0}")]
    Aborted(String),
}

// =============================================================================
// DEPLOYMENT ERRORS
// =============================================================================

/// Errors ending a deployment run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeploymentError {
    /// The plan cannot produce a complete descriptor. Raised before any
    /// component is created.
    #[error("invalid deployment plan: {0}")]
    InvalidPlan(#[from] DescriptorError),

    /// A component creation did not finalize. Components created earlier in
    /// the run stay on the ledger and are listed in `orphaned`.
    #[error("failed to create component {component}: {source}")]
    ComponentCreation {
        /// Component that failed.
        component: String,
        /// Addresses of components already created in this run.
        orphaned: Vec<Address>,
        /// Ledger failure.
        #[source]
        source: LedgerError,
    },

    /// Raised by a fatal authorization policy.
    #[error("deployment completed but authorization failed: {0}")]
    AuthorizationFailed(AuthorizationError),

    /// Raised by a fatal publication policy.
    #[error("descriptor could not be published to: {}", .sinks.join(", "))]
    PublishFailed {
        /// Names of the sinks that failed.
        sinks: Vec<String>,
    },
}

// =============================================================================
// CONFIGURATION & ARTIFACT ERRORS
// =============================================================================

/// Invalid configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid value {value:?} for {key}: {reason}")]
pub struct ConfigError {
    /// Setting name (environment variable).
    pub key: String,
    /// Rejected value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Errors loading build artifacts.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The artifact file could not be read.
    #[error("cannot read artifact {path:?}: {source}")]
    Io {
        /// Artifact path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The artifact file is not a valid build artifact.
    #[error("cannot parse artifact {path:?}: {source}")]
    Parse {
        /// Artifact path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_error_revert_classification() {
        assert!(LedgerError::Reverted { reason: "fee".into() }.is_revert());
        assert!(!LedgerError::Transport("down".into()).is_revert());
    }

    #[test]
    fn test_publish_failed_lists_sinks() {
        let err = DeploymentError::PublishFailed {
            sinks: vec!["client".into(), "server".into()],
        };
        assert_eq!(err.to_string(), "descriptor could not be published to: client, server");
    }

    #[test]
    fn test_component_creation_display_names_component() {
        let err = DeploymentError::ComponentCreation {
            component: "FlightSuretyApp".into(),
            orphaned: vec![Address::new([1u8; 20])],
            source: LedgerError::UnknownArtifact("FlightSuretyApp".into()),
        };
        let text = err.to_string();
        assert!(text.contains("FlightSuretyApp"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_invalid_plan_wraps_descriptor_error() {
        let err = DeploymentError::from(DescriptorError::DuplicateComponent("Same".into()));
        assert_eq!(
            err.to_string(),
            "invalid deployment plan: component name \"Same\" used more than once"
        );
    }

    #[test]
    fn test_authorization_rejected_classification() {
        let rejected = AuthorizationError::Rejected {
            grantor: Address::ZERO,
            grantee: Address::ZERO,
            reason: "caller is not contract owner".into(),
        };
        assert!(rejected.is_rejected());
        assert!(!AuthorizationError::Ledger(LedgerError::Rpc("x".into())).is_rejected());
    }
}
