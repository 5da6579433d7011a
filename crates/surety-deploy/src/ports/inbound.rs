//! # Driving Ports (API - Inbound)
//!
//! Entry points the CLI (and tests) drive:
//! - `DeploymentApi`: create both components, publish, authorize,
//! - `RegistrationApi`: concurrent registration with quorum check.

use crate::domain::entities::InitialState;
use crate::domain::registration::QuorumOutcome;
use crate::domain::report::DeploymentReport;
use crate::domain::value_objects::{Identity, Wei};
use crate::errors::DeploymentError;
use async_trait::async_trait;

/// Deploys the data holder and logic holder as one ordered run.
#[async_trait]
pub trait DeploymentApi: Send + Sync {
    /// Runs a deployment signed by `deployer`.
    ///
    /// Only a failed component creation is returned as an error. Publication
    /// and authorization outcomes are carried in the report.
    async fn deploy(
        &self,
        initial_state: &InitialState,
        funding: Wei,
        deployer: Identity,
    ) -> Result<DeploymentReport, DeploymentError>;
}

/// Registers many participants against a quorum-bounded registry.
#[async_trait]
pub trait RegistrationApi: Send + Sync {
    /// Submits one registration per participant, all concurrently, and
    /// tallies the confirmations once every submission has finished.
    async fn register_all(&self, participants: &[Identity], fee: Wei) -> QuorumOutcome;
}
