//! # Domain Layer (Inner Hexagon)
//!
//! Pure deployment and registration concepts.
//! NO I/O, NO async.
//!
//! - Dependencies point INWARD only (adapters and services depend on this).

pub mod abi;
pub mod descriptor;
pub mod entities;
pub mod interface;
pub mod registration;
pub mod report;
pub mod services;
pub mod value_objects;

pub use abi::CallArg;
pub use descriptor::{
    check_component_names, ComponentRecord, DeploymentDescriptor, NetworkDeployment, URL_KEY,
};
pub use entities::{AuthorizationGrant, Component, InitialState};
pub use interface::{Artifact, CallSignature, Interface, Param, SignatureKind};
pub use registration::{
    tally, ParticipantRecord, ParticipantStatus, QuorumOutcome, QuorumThreshold, Unconfirmed,
};
pub use report::{DeploymentReport, SinkReport, StepPolicy};
pub use value_objects::{ether, Address, Hash, Identity, Wei, U256};
