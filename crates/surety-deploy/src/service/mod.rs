//! # Services
//!
//! Deployment and registration services wired from the ports.
//!
//! - `DeploymentOrchestrator`: implements `DeploymentApi`
//! - `DescriptorPublisher`: per-sink publication
//! - `AuthorizationHandshake`: single privileged call
//! - `RegistrationHarness`: implements `RegistrationApi`

pub mod handshake;
pub mod harness;
pub mod orchestrator;
pub mod publisher;

pub use handshake::AuthorizationHandshake;
pub use harness::RegistrationHarness;
pub use orchestrator::{DeploymentOrchestrator, DeploymentPlan};
pub use publisher::DescriptorPublisher;
