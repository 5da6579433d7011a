//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions between the deployment services and the outside world.
//!
//! - **Driving Ports (Inbound)**: `DeploymentApi`, `RegistrationApi`
//! - **Driven Ports (Outbound)**: `Ledger`, `DescriptorSink`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
