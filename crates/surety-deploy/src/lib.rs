//! # Surety Deploy - Deployment & Registration Tooling
//!
//! Deploys the two cooperating registry components (a data holder and a
//! logic holder), publishes their addresses and interfaces to every
//! configured consumer, wires the logic holder into the data holder, and
//! validates the deployed registry by driving many concurrent registrations
//! against its quorum threshold.
//!
//! ## Deployment Run
//!
//! | Step | Operation | Failure |
//! |------|-----------|---------|
//! | 0 | Check component names | Fatal: `InvalidPlan`, nothing created |
//! | 1 | Create data holder (seed state, funding) | Fatal: `ComponentCreation` |
//! | 2 | Create logic holder (data holder address) | Fatal: `ComponentCreation`, names orphan |
//! | 3 | Publish descriptor to each sink | Collected per sink |
//! | 4 | Authorization handshake | Collected, logged at `error` |
//!
//! Whether a collected failure fails the run is decided by the caller with
//! [`DeploymentReport::enforce`](domain::DeploymentReport::enforce).
//!
//! ## Registration Harness
//!
//! Quorum holds iff every submitted participant was confirmed exactly once
//! and the number submitted is at least the threshold.
//!
//! ## Outbound Dependencies
//!
//! | Trait | Adapters |
//! |-------|----------|
//! | `Ledger` | `InMemoryLedger`, `JsonRpcLedger` |
//! | `DescriptorSink` | `FileSink`, `MemorySink` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use surety_deploy::prelude::*;
//!
//! let report = orchestrator
//!     .deploy(&config.initial_state.resolve(), config.funding, deployer)
//!     .await?
//!     .enforce(config.authorization_policy, config.publish_policy)?;
//!
//! let outcome = harness.register_all(&participants, harness_config.fee).await;
//! assert!(outcome.is_quorum());
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain
    pub use crate::domain::{
        ether, tally, Address, Artifact, AuthorizationGrant, CallArg, Component,
        DeploymentDescriptor, DeploymentReport, Hash, Identity, InitialState, Interface,
        ParticipantRecord, ParticipantStatus, QuorumOutcome, QuorumThreshold, SinkReport,
        StepPolicy, Unconfirmed, Wei,
    };

    // Configuration
    pub use crate::config::{
        ContractSurface, DeployConfig, HarnessConfig, InitialStateConfig, NetworkConfig,
        ReceiptPolicy,
    };

    // Errors
    pub use crate::errors::{
        ArtifactError, AuthorizationError, ConfigError, DeploymentError, DescriptorError,
        LedgerError, PublishError, RegistrationError,
    };

    // Ports
    pub use crate::ports::inbound::{DeploymentApi, RegistrationApi};
    pub use crate::ports::outbound::{
        CallReceipt, ComponentSpec, ContractCall, DescriptorSink, Ledger, LedgerEvent,
    };

    // Adapters
    pub use crate::adapters::{
        ArtifactStore, FileSink, InMemoryLedger, JsonRpcLedger, MemorySink, RegistryPrograms,
    };

    // Services
    pub use crate::service::{
        AuthorizationHandshake, DeploymentOrchestrator, DeploymentPlan, DescriptorPublisher,
        RegistrationHarness,
    };
}
