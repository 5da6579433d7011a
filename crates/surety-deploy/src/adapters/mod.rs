//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the outbound ports.
//!
//! - `InMemoryLedger`: simulated ledger hosting `programs`
//! - `JsonRpcLedger`: node over JSON-RPC
//! - `FileSink` / `MemorySink`: descriptor sinks
//! - `ArtifactStore`: build artifact loading

pub mod artifacts;
pub mod file_sink;
pub mod json_rpc;
pub mod memory_ledger;
pub mod memory_sink;
pub mod programs;

pub use artifacts::ArtifactStore;
pub use file_sink::FileSink;
pub use json_rpc::JsonRpcLedger;
pub use memory_ledger::{DeployedComponent, InMemoryLedger};
pub use memory_sink::MemorySink;
pub use programs::{
    CallContext, ComponentProgram, ComponentState, FeeRegistry, GrantableStore, RegistryPrograms,
};
