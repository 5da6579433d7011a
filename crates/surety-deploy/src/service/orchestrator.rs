//! # Deployment Orchestrator
//!
//! Ordered deployment run:
//!
//! 1. Create the data holder (seeded, funded)
//! 2. Create the logic holder with the data holder's address
//! 3. Publish the descriptor to every sink
//! 4. Authorize the logic holder against the data holder
//!
//! The plan's component names are checked before step 1. Steps 1-2 abort
//! the run on failure. Steps 3-4 never do; their outcomes are
//! carried in the [`DeploymentReport`].

use crate::domain::abi::CallArg;
use crate::domain::descriptor::{check_component_names, DeploymentDescriptor};
use crate::domain::entities::{Component, InitialState};
use crate::domain::interface::Artifact;
use crate::domain::report::DeploymentReport;
use crate::domain::value_objects::{Address, Identity, Wei};
use crate::errors::{DeploymentError, DescriptorError};
use crate::ports::inbound::DeploymentApi;
use crate::ports::outbound::{ComponentSpec, Ledger};
use crate::service::handshake::AuthorizationHandshake;
use crate::service::publisher::DescriptorPublisher;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// What gets deployed, and under which network key it is published.
#[derive(Debug, Clone)]
pub struct DeploymentPlan {
    /// Descriptor network key.
    pub network: String,
    /// Endpoint recorded in the descriptor.
    pub url: Option<String>,
    /// Data holder artifact.
    pub data_holder: Artifact,
    /// Logic holder artifact.
    pub logic_holder: Artifact,
}

impl DeploymentPlan {
    /// Checks that both artifacts can be recorded side by side in the
    /// descriptor.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        check_component_names([
            self.data_holder.contract_name.as_str(),
            self.logic_holder.contract_name.as_str(),
        ])
    }
}

/// Sequences component creation, publication and authorization.
pub struct DeploymentOrchestrator<L: Ledger> {
    ledger: Arc<L>,
    plan: DeploymentPlan,
    publisher: DescriptorPublisher,
    handshake: AuthorizationHandshake<L>,
    authorizer: Option<Identity>,
}

impl<L: Ledger> DeploymentOrchestrator<L> {
    /// Create an orchestrator. `authorize_method` is the grantor's
    /// privileged call.
    pub fn new(
        ledger: Arc<L>,
        plan: DeploymentPlan,
        publisher: DescriptorPublisher,
        authorize_method: &str,
    ) -> Self {
        Self {
            handshake: AuthorizationHandshake::new(ledger.clone(), authorize_method),
            ledger,
            plan,
            publisher,
            authorizer: None,
        }
    }

    /// Signs the authorization call with `authorizer` instead of the
    /// deployer. The grantor only accepts its creator, so any other identity
    /// leaves the logic holder unwired.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Identity) -> Self {
        self.authorizer = Some(authorizer);
        self
    }


    async fn create(
        &self,
        artifact: &Artifact,
        args: Vec<CallArg>,
        deployer: Identity,
        value: Wei,
        created: &[Address],
    ) -> Result<Component, DeploymentError> {
        let spec = ComponentSpec::new(artifact.clone(), args);
        match self.ledger.create(&spec, deployer, value).await {
            Ok(component) => {
                info!(
                    component = %component.name,
                    address = %component.address,
                    tx = %component.creation_tx,
                    "Component created"
                );
                Ok(component)
            }
            Err(source) => {
                error!(
                    component = %artifact.contract_name,
                    orphaned = ?created,
                    error = %source,
                    "Component creation failed, aborting deployment"
                );
                Err(DeploymentError::ComponentCreation {
                    component: artifact.contract_name.clone(),
                    orphaned: created.to_vec(),
                    source,
                })
            }
        }
    }

    #[instrument(skip_all, fields(run_id = %run_id, network = %self.plan.network))]
    async fn run(
        &self,
        run_id: Uuid,
        initial_state: &InitialState,
        funding: Wei,
        deployer: Identity,
    ) -> Result<DeploymentReport, DeploymentError> {
        if let Err(e) = self.plan.validate() {
            error!(error = %e, "Deployment plan rejected, nothing created");
            return Err(e.into());
        }
        info!(
            deployer = %deployer,
            funding = %funding,
            sinks = self.publisher.sink_count(),
            "Starting deployment"
        );

        let data_holder = self
            .create(
                &self.plan.data_holder,
                initial_state.args().to_vec(),
                deployer,
                funding,
                &[],
            )
            .await?;

        let logic_holder = self
            .create(
                &self.plan.logic_holder,
                vec![CallArg::Address(data_holder.address)],
                deployer,
                Wei::zero(),
                &[data_holder.address],
            )
            .await?;

        let descriptor = DeploymentDescriptor::for_network(
            &self.plan.network,
            self.plan.url.as_deref(),
            &[&data_holder, &logic_holder],
        )?;
        let publications = self.publisher.publish(&descriptor).await;

        let authorization = self
            .handshake
            .authorize(
                data_holder.address,
                logic_holder.address,
                self.authorizer.unwrap_or(deployer),
            )
            .await;
        match &authorization {
            Ok(grant) => info!(
                grantor = %grant.grantor,
                grantee = %grant.grantee,
                tx = %grant.tx_hash,
                "Logic component authorized"
            ),
            Err(e) => error!(
                grantor = %data_holder.address,
                grantee = %logic_holder.address,
                error = %e,
                "Authorization failed, logic component is not wired"
            ),
        }

        let report = DeploymentReport {
            run_id,
            data_holder,
            logic_holder,
            descriptor,
            publications,
            authorization,
        };
        info!(
            authorized = report.is_authorized(),
            failed_sinks = report.failed_sinks().len(),
            "Deployment finished"
        );
        Ok(report)
    }
}

#[async_trait]
impl<L: Ledger + 'static> DeploymentApi for DeploymentOrchestrator<L> {
    async fn deploy(
        &self,
        initial_state: &InitialState,
        funding: Wei,
        deployer: Identity,
    ) -> Result<DeploymentReport, DeploymentError> {
        self.run(Uuid::new_v4(), initial_state, funding, deployer)
            .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
