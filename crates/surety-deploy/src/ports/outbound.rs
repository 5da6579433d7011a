//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the deployment tooling depends on:
//! - a ledger that creates components and executes calls,
//! - descriptor sinks that receive the published descriptor.
//!
//! Adapters in `crate::adapters` implement these traits.

use crate::domain::abi::CallArg;
use crate::domain::entities::Component;
use crate::domain::interface::Artifact;
use crate::domain::value_objects::{Address, Hash, Identity, Wei};
use crate::errors::{LedgerError, PublishError};
use async_trait::async_trait;

// =============================================================================
// LEDGER
// =============================================================================

/// What to create: an artifact plus its constructor arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentSpec {
    /// Build artifact (name, interface, bytecode).
    pub artifact: Artifact,
    /// Constructor arguments, in order.
    pub constructor_args: Vec<CallArg>,
}

impl ComponentSpec {
    /// Creates a spec.
    #[must_use]
    pub fn new(artifact: Artifact, constructor_args: Vec<CallArg>) -> Self {
        Self {
            artifact,
            constructor_args,
        }
    }

    /// Component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.artifact.contract_name
    }
}

/// A state-changing call on an existing component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractCall {
    /// Signing identity (`msg.sender`).
    pub from: Identity,
    /// Target component.
    pub to: Address,
    /// Method name.
    pub method: String,
    /// Arguments, in order.
    pub args: Vec<CallArg>,
    /// Value attached to the call.
    pub value: Wei,
}

impl ContractCall {
    /// Creates a call carrying no value.
    #[must_use]
    pub fn new(from: Identity, to: Address, method: &str, args: Vec<CallArg>) -> Self {
        Self {
            from,
            to,
            method: method.to_string(),
            args,
            value: Wei::zero(),
        }
    }

    /// Attaches a value (fee, funding) to the call.
    #[must_use]
    pub fn with_value(mut self, value: Wei) -> Self {
        self.value = value;
        self
    }
}

/// An event emitted while executing a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEvent {
    /// Emitting component.
    pub emitter: Address,
    /// Event name.
    pub name: String,
    /// Decoded arguments, in declaration order.
    pub args: Vec<CallArg>,
}

impl LedgerEvent {
    /// Returns true if this event is `name` and one of its arguments is
    /// `address`.
    #[must_use]
    pub fn names(&self, name: &str, address: Address) -> bool {
        self.name == name && self.args.iter().any(|a| a.as_address() == Some(address))
    }
}

/// Result of a finalized, successful call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallReceipt {
    /// Transaction hash.
    pub tx_hash: Hash,
    /// Events emitted, in emission order.
    pub events: Vec<LedgerEvent>,
}

/// Interface to an append-only ledger hosting the components.
///
/// A transaction that executes and reverts is reported as
/// [`LedgerError::Reverted`]; a successful return means the transaction
/// finalized.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Creates a component from `spec`, signed by `from`, funded with `value`.
    async fn create(
        &self,
        spec: &ComponentSpec,
        from: Identity,
        value: Wei,
    ) -> Result<Component, LedgerError>;

    /// Executes a state-changing call and waits for it to finalize.
    async fn send(&self, call: &ContractCall) -> Result<CallReceipt, LedgerError>;
}

// =============================================================================
// DESCRIPTOR SINK
// =============================================================================

/// A consumer-visible location receiving the serialized descriptor.
///
/// A write is atomic from the caller's view: either the full bytes land or
/// an error is returned and the previous content is untouched.
#[async_trait]
pub trait DescriptorSink: Send + Sync {
    /// Human-readable sink name (a path, a label).
    fn name(&self) -> String;

    /// Replaces the sink's content with `bytes`.
    async fn write(&self, bytes: &[u8]) -> Result<(), PublishError>;
}
