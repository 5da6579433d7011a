//! # In-Memory Ledger
//!
//! Deterministic simulated ledger for tests and local dry runs.
//!
//! Components are [`ComponentProgram`]s registered by artifact name.
//! Addresses follow the creation-address rule (sender, nonce); every
//! transaction, reverted or not, consumes a nonce. State lives behind one
//! lock, which serializes concurrent submissions the way a node orders
//! transactions in a block.

use crate::adapters::programs::{CallContext, ComponentProgram, ComponentState, RegistryPrograms};
use crate::domain::abi::{encode, encode_call, CallArg};
use crate::domain::entities::Component;
use crate::domain::services::{compute_contract_address, keccak256, transaction_hash};
use crate::domain::value_objects::{Address, Identity, Wei};
use crate::errors::LedgerError;
use crate::ports::outbound::{CallReceipt, ComponentSpec, ContractCall, Ledger};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A component as seen by the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployedComponent {
    /// Artifact name.
    pub name: String,
    /// Creation address.
    pub address: Address,
    /// Creator identity.
    pub creator: Identity,
    /// Arguments its constructor received.
    pub constructor_args: Vec<CallArg>,
    /// Value held by the component.
    pub balance: Wei,
}

struct Hosted {
    info: DeployedComponent,
    state: Box<dyn ComponentState>,
}

#[derive(Default)]
struct LedgerState {
    nonces: HashMap<Address, u64>,
    hosted: HashMap<Address, Hosted>,
    // Injected failures keyed by artifact or method name.
    failures: HashMap<String, LedgerError>,
    transactions: u64,
}

impl LedgerState {
    fn next_nonce(&mut self, from: Address) -> u64 {
        let nonce = self.nonces.entry(from).or_insert(0);
        let current = *nonce;
        *nonce += 1;
        self.transactions += 1;
        current
    }
}

/// Simulated ledger hosting [`ComponentProgram`] instances.
#[derive(Default)]
pub struct InMemoryLedger {
    programs: HashMap<String, Arc<dyn ComponentProgram>>,
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// Create a ledger with no programs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a ledger hosting the data holder / logic holder pair.
    #[must_use]
    pub fn with_registry(programs: &RegistryPrograms) -> Self {
        let mut ledger = Self::new();
        for (name, program) in programs.programs() {
            ledger.register_program(&name, program);
        }
        ledger
    }

    /// Makes components named `name` creatable.
    pub fn register_program(&mut self, name: &str, program: Arc<dyn ComponentProgram>) {
        self.programs.insert(name.to_string(), program);
    }

    /// Makes every later creation of artifact `key`, or call of method `key`,
    /// fail with `error` without reaching the component.
    pub fn fail_on(&self, key: &str, error: LedgerError) {
        self.state.lock().failures.insert(key.to_string(), error);
    }

    /// Removes an injected failure.
    pub fn clear_failure(&self, key: &str) {
        self.state.lock().failures.remove(key);
    }

    /// Deterministic development accounts, like a local node's unlocked
    /// accounts.
    #[must_use]
    pub fn dev_accounts(count: usize) -> Vec<Identity> {
        (0..count)
            .map(|i| {
                let digest = keccak256(format!("surety-dev-account-{i}").as_bytes());
                let mut bytes = [0u8; 20];
                bytes.copy_from_slice(&digest.as_bytes()[12..]);
                Identity::new(Address::new(bytes))
            })
            .collect()
    }

    /// Components currently hosted, in no particular order.
    #[must_use]
    pub fn deployed(&self) -> Vec<DeployedComponent> {
        self.state
            .lock()
            .hosted
            .values()
            .map(|h| h.info.clone())
            .collect()
    }

    /// The component at `address`, if any.
    #[must_use]
    pub fn component_at(&self, address: Address) -> Option<DeployedComponent> {
        self.state
            .lock()
            .hosted
            .get(&address)
            .map(|h| h.info.clone())
    }

    /// Total transactions processed, including reverted ones.
    #[must_use]
    pub fn transaction_count(&self) -> u64 {
        self.state.lock().transactions
    }

    /// Read-only query against a hosted component.
    pub fn view(
        &self,
        at: Address,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<CallArg>, LedgerError> {
        let state = self.state.lock();
        let hosted = state
            .hosted
            .get(&at)
            .ok_or(LedgerError::UnknownComponent(at))?;
        hosted
            .state
            .view(method, args)
            .map_err(|reason| LedgerError::Reverted { reason })
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn create(
        &self,
        spec: &ComponentSpec,
        from: Identity,
        value: Wei,
    ) -> Result<Component, LedgerError> {
        // Let concurrently submitted transactions interleave.
        tokio::task::yield_now().await;

        let program = self
            .programs
            .get(spec.name())
            .cloned()
            .ok_or_else(|| LedgerError::UnknownArtifact(spec.name().to_string()))?;

        let mut state = self.state.lock();
        if let Some(error) = state.failures.get(spec.name()) {
            return Err(error.clone());
        }

        let nonce = state.next_nonce(from.address());
        let address = compute_contract_address(from.address(), nonce);
        let tx_hash = transaction_hash(from.address(), nonce, &encode(&spec.constructor_args));

        let ctx = CallContext {
            caller: from,
            value,
            this: address,
        };
        let instance = program
            .instantiate(&ctx, &spec.constructor_args)
            .map_err(|reason| LedgerError::Reverted { reason })?;

        state.hosted.insert(
            address,
            Hosted {
                info: DeployedComponent {
                    name: spec.name().to_string(),
                    address,
                    creator: from,
                    constructor_args: spec.constructor_args.clone(),
                    balance: value,
                },
                state: instance,
            },
        );

        debug!(
            component = %spec.name(),
            address = %address,
            tx = %tx_hash,
            "Created simulated component"
        );

        Ok(Component::new(
            spec.name(),
            address,
            spec.artifact.abi.clone(),
            tx_hash,
        ))
    }

    async fn send(&self, call: &ContractCall) -> Result<CallReceipt, LedgerError> {
        tokio::task::yield_now().await;

        let mut state = self.state.lock();
        if let Some(error) = state.failures.get(&call.method) {
            return Err(error.clone());
        }
        if !state.hosted.contains_key(&call.to) {
            return Err(LedgerError::UnknownComponent(call.to));
        }

        let nonce = state.next_nonce(call.from.address());
        let tx_hash = transaction_hash(
            call.from.address(),
            nonce,
            &encode_call(&call.method, &call.args),
        );

        let ctx = CallContext {
            caller: call.from,
            value: call.value,
            this: call.to,
        };
        let hosted = state
            .hosted
            .get_mut(&call.to)
            .ok_or(LedgerError::UnknownComponent(call.to))?;
        let events = hosted
            .state
            .call(&ctx, &call.method, &call.args)
            .map_err(|reason| LedgerError::Reverted { reason })?;
        hosted.info.balance = hosted.info.balance.saturating_add(call.value);

        debug!(
            method = %call.method,
            to = %call.to,
            tx = %tx_hash,
            events = events.len(),
            "Executed simulated call"
        );

        Ok(CallReceipt { tx_hash, events })
    }
}

// =============================================================================
// TESTS
// =============================================================================
