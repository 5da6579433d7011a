//! # Core Domain Entities
//!
//! Components created during a deployment run and the authorization grant
//! that links them.

use crate::domain::abi::CallArg;
use crate::domain::interface::Interface;
use crate::domain::value_objects::{Address, Hash, Identity};
use serde::{Deserialize, Serialize};

// =============================================================================
// COMPONENT
// =============================================================================

/// A freshly created ledger-resident component.
///
/// Created exactly once per deployment run. Its internal state is owned by
/// the ledger; this crate only ever holds its address and interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Component name (descriptor key).
    pub name: String,
    /// Address assigned at creation.
    pub address: Address,
    /// Interface captured from the creation output.
    pub interface: Interface,
    /// Hash of the creation transaction.
    pub creation_tx: Hash,
}

impl Component {
    /// Creates a component record.
    #[must_use]
    pub fn new(name: &str, address: Address, interface: Interface, creation_tx: Hash) -> Self {
        Self {
            name: name.to_string(),
            address,
            interface,
            creation_tx,
        }
    }
}

// =============================================================================
// INITIAL STATE
// =============================================================================

/// Constructor arguments seeding the data holder's domain state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialState(pub Vec<CallArg>);

impl InitialState {
    /// Wraps constructor arguments.
    #[must_use]
    pub fn new(args: Vec<CallArg>) -> Self {
        Self(args)
    }

    /// The constructor arguments, in order.
    #[must_use]
    pub fn args(&self) -> &[CallArg] {
        &self.0
    }
}

// =============================================================================
// AUTHORIZATION GRANT
// =============================================================================

/// The fact "grantee is the sole authorized mutator of grantor".
///
/// Only produced by a successful handshake call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationGrant {
    /// Component whose state is being opened up (the data holder).
    pub grantor: Address,
    /// Component receiving exclusive write access (the logic holder).
    pub grantee: Address,
    /// Identity that issued the privileged call.
    pub caller: Identity,
    /// Transaction that established the grant.
    pub tx_hash: Hash,
}
