//! # Simulated Component Programs
//!
//! Behaviour of the components hosted by [`InMemoryLedger`]. Only the parts
//! of the registry the deployment and registration tooling touches are
//! modelled: funding at creation, the owner-only authorization call, and fee
//! registration with its confirmation event.
//!
//! [`InMemoryLedger`]: super::memory_ledger::InMemoryLedger

use crate::config::ContractSurface;
use crate::domain::abi::CallArg;
use crate::domain::interface::{Artifact, CallSignature, Interface, Param};
use crate::domain::value_objects::{ether, Address, Identity, Wei};
use crate::ports::outbound::LedgerEvent;
use std::collections::HashSet;
use std::sync::Arc;

/// Who is calling, with what value, on which component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Signing identity.
    pub caller: Identity,
    /// Attached value.
    pub value: Wei,
    /// Address of the component being created or called.
    pub this: Address,
}

/// Live state of one simulated component.
///
/// A call returning `Err` is a revert: implementations must validate before
/// mutating so a reverted call leaves the state untouched.
pub trait ComponentState: Send {
    /// Executes a state-changing call, returning emitted events.
    fn call(
        &mut self,
        ctx: &CallContext,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<LedgerEvent>, String>;

    /// Answers a read-only query.
    fn view(&self, method: &str, args: &[CallArg]) -> Result<Vec<CallArg>, String>;
}

/// Factory creating component state from constructor arguments.
pub trait ComponentProgram: Send + Sync {
    /// Runs the constructor. `Err` reverts the creation.
    fn instantiate(
        &self,
        ctx: &CallContext,
        args: &[CallArg],
    ) -> Result<Box<dyn ComponentState>, String>;
}

// =============================================================================
// GRANTABLE STORE (data holder)
// =============================================================================

/// Data holder: funded at creation, opened to exactly one logic holder by its
/// creator.
#[derive(Debug, Clone)]
pub struct GrantableStore {
    min_funding: Wei,
    authorize_method: String,
}

impl GrantableStore {
    /// Read-only query returning the authorized logic holder.
    pub const AUTHORIZED_VIEW: &'static str = "authorizedApp";

    /// Creates the program.
    pub fn new(min_funding: Wei, authorize_method: impl Into<String>) -> Self {
        Self {
            min_funding,
            authorize_method: authorize_method.into(),
        }
    }
}

struct StoreState {
    owner: Identity,
    authorize_method: String,
    authorized: Option<Address>,
}

impl ComponentProgram for GrantableStore {
    fn instantiate(
        &self,
        ctx: &CallContext,
        _args: &[CallArg],
    ) -> Result<Box<dyn ComponentState>, String> {
        if ctx.value < self.min_funding {
            return Err("minimum funding is required".to_string());
        }
        Ok(Box::new(StoreState {
            owner: ctx.caller,
            authorize_method: self.authorize_method.clone(),
            authorized: None,
        }))
    }
}

impl ComponentState for StoreState {
    fn call(
        &mut self,
        ctx: &CallContext,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<LedgerEvent>, String> {
        if method != self.authorize_method {
            return Err(format!("unknown method {method}"));
        }
        if ctx.caller != self.owner {
            return Err("caller is not contract owner".to_string());
        }
        let grantee = args
            .first()
            .and_then(CallArg::as_address)
            .ok_or_else(|| "expected the app address".to_string())?;

        match self.authorized {
            Some(current) if current == grantee => Ok(Vec::new()),
            Some(_) => Err("app is already wired".to_string()),
            None => {
                self.authorized = Some(grantee);
                Ok(Vec::new())
            }
        }
    }

    fn view(&self, method: &str, _args: &[CallArg]) -> Result<Vec<CallArg>, String> {
        match method {
            GrantableStore::AUTHORIZED_VIEW => Ok(vec![CallArg::Address(
                self.authorized.unwrap_or(Address::ZERO),
            )]),
            _ => Err(format!("unknown view {method}")),
        }
    }
}

// =============================================================================
// FEE REGISTRY (logic holder)
// =============================================================================

/// Logic holder: admits participants paying at least the fee, once each.
#[derive(Debug, Clone)]
pub struct FeeRegistry {
    min_fee: Wei,
    register_method: String,
    confirmation_event: String,
}

impl FeeRegistry {
    /// Read-only query: number of registered participants.
    pub const COUNT_VIEW: &'static str = "registeredCount";

    /// Read-only query: data holder address given at creation.
    pub const DATA_VIEW: &'static str = "dataContract";

    /// Creates the program.
    pub fn new(
        min_fee: Wei,
        register_method: impl Into<String>,
        confirmation_event: impl Into<String>,
    ) -> Self {
        Self {
            min_fee,
            register_method: register_method.into(),
            confirmation_event: confirmation_event.into(),
        }
    }
}

struct RegistryState {
    data_holder: Address,
    registry: FeeRegistry,
    registered: HashSet<Identity>,
}

impl ComponentProgram for FeeRegistry {
    fn instantiate(
        &self,
        _ctx: &CallContext,
        args: &[CallArg],
    ) -> Result<Box<dyn ComponentState>, String> {
        let data_holder = args
            .first()
            .and_then(CallArg::as_address)
            .filter(|a| !a.is_zero())
            .ok_or_else(|| "expected the data contract address".to_string())?;
        Ok(Box::new(RegistryState {
            data_holder,
            registry: self.clone(),
            registered: HashSet::new(),
        }))
    }
}

impl ComponentState for RegistryState {
    fn call(
        &mut self,
        ctx: &CallContext,
        method: &str,
        _args: &[CallArg],
    ) -> Result<Vec<LedgerEvent>, String> {
        if method != self.registry.register_method {
            return Err(format!("unknown method {method}"));
        }
        if ctx.value < self.registry.min_fee {
            return Err("registration fee is required".to_string());
        }
        if self.registered.contains(&ctx.caller) {
            return Err("oracle is already registered".to_string());
        }

        self.registered.insert(ctx.caller);
        Ok(vec![LedgerEvent {
            emitter: ctx.this,
            name: self.registry.confirmation_event.clone(),
            args: vec![CallArg::Address(ctx.caller.address())],
        }])
    }

    fn view(&self, method: &str, _args: &[CallArg]) -> Result<Vec<CallArg>, String> {
        match method {
            FeeRegistry::COUNT_VIEW => Ok(vec![CallArg::Uint(Wei::from(self.registered.len()))]),
            FeeRegistry::DATA_VIEW => Ok(vec![CallArg::Address(self.data_holder)]),
            _ => Err(format!("unknown view {method}")),
        }
    }
}

// =============================================================================
// REGISTRY PROGRAM SET
// =============================================================================

/// The data holder / logic holder pair, with matching artifacts.
#[derive(Debug, Clone)]
pub struct RegistryPrograms {
    /// Data holder artifact name.
    pub data_component: String,
    /// Logic holder artifact name.
    pub logic_component: String,
    /// Method/event names.
    pub surface: ContractSurface,
    /// Minimum funding accepted by the data holder.
    pub min_funding: Wei,
    /// Minimum registration fee.
    pub min_fee: Wei,
}

impl Default for RegistryPrograms {
    fn default() -> Self {
        Self {
            data_component: "FlightSuretyData".to_string(),
            logic_component: "FlightSuretyApp".to_string(),
            surface: ContractSurface::default(),
            min_funding: ether(10),
            min_fee: ether(1),
        }
    }
}

impl RegistryPrograms {
    /// Program instances keyed by artifact name.
    #[must_use]
    pub fn programs(&self) -> Vec<(String, Arc<dyn ComponentProgram>)> {
        vec![
            (
                self.data_component.clone(),
                Arc::new(GrantableStore::new(
                    self.min_funding,
                    &self.surface.authorize_method,
                )) as Arc<dyn ComponentProgram>,
            ),
            (
                self.logic_component.clone(),
                Arc::new(FeeRegistry::new(
                    self.min_fee,
                    &self.surface.register_method,
                    &self.surface.confirmation_event,
                )) as Arc<dyn ComponentProgram>,
            ),
        ]
    }

    /// Artifact describing the data holder.
    #[must_use]
    pub fn data_artifact(&self) -> Artifact {
        let abi = Interface::new(vec![
            CallSignature::constructor(
                vec![
                    Param::new("initialAirlineName", "string"),
                    Param::new("initialFlight", "string"),
                    Param::new("initialFlightTime", "uint256"),
                ],
                "payable",
            ),
            CallSignature::function(
                &self.surface.authorize_method,
                vec![Param::new("appAddress", "address")],
                "nonpayable",
            ),
        ]);
        Artifact::new(&self.data_component, abi, "0x")
    }

    /// Artifact describing the logic holder.
    #[must_use]
    pub fn logic_artifact(&self) -> Artifact {
        let abi = Interface::new(vec![
            CallSignature::constructor(vec![Param::new("dataContract", "address")], "nonpayable"),
            CallSignature::function(&self.surface.register_method, Vec::new(), "payable"),
            CallSignature::event(
                &self.surface.confirmation_event,
                vec![Param::new("oracle", "address")],
            ),
        ]);
        Artifact::new(&self.logic_component, abi, "0x")
    }
}

// =============================================================================
// TESTS
// =============================================================================
