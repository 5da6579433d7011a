//! # Component Interfaces
//!
//! A component's interface is an explicit, ordered list of call signatures
//! captured at creation time. It is carried by value in component records and
//! published verbatim in the deployment descriptor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// PARAMETERS
// =============================================================================

/// A single input or output parameter of a call signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name (may be empty).
    #[serde(default)]
    pub name: String,
    /// Canonical ABI type, e.g. `address` or `uint256`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether an event parameter is stored in a topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
    /// Keys this crate does not interpret (`internalType`, `components`, ...),
    /// kept so the published interface is lossless.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Param {
    /// Creates a parameter with the given name and type.
    #[must_use]
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            indexed: None,
            extra: BTreeMap::new(),
        }
    }

    /// Creates an indexed event parameter.
    #[must_use]
    pub fn indexed(name: &str, kind: &str) -> Self {
        Self {
            indexed: Some(true),
            ..Self::new(name, kind)
        }
    }

    /// Returns true if this is an indexed event parameter.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        self.indexed.unwrap_or(false)
    }
}

// =============================================================================
// CALL SIGNATURES
// =============================================================================

/// Kind of an interface entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureKind {
    /// Callable function.
    Function,
    /// Creation-time constructor.
    Constructor,
    /// Emitted event.
    Event,
    /// Fallback entry point.
    Fallback,
    /// Plain value receiver.
    Receive,
    /// Custom error.
    Error,
}

/// One entry of a component interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSignature {
    /// Entry kind.
    #[serde(rename = "type")]
    pub kind: SignatureKind,
    /// Entry name (absent for constructor/fallback/receive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Input parameters, in declaration order.
    #[serde(default)]
    pub inputs: Vec<Param>,
    /// Output parameters (functions only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Param>>,
    /// `pure`, `view`, `nonpayable` or `payable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_mutability: Option<String>,
    /// Anonymous flag (events only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous: Option<bool>,
    /// Uninterpreted keys, preserved.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CallSignature {
    /// Builds a function entry.
    #[must_use]
    pub fn function(name: &str, inputs: Vec<Param>, state_mutability: &str) -> Self {
        Self {
            kind: SignatureKind::Function,
            name: Some(name.to_string()),
            inputs,
            outputs: Some(Vec::new()),
            state_mutability: Some(state_mutability.to_string()),
            anonymous: None,
            extra: BTreeMap::new(),
        }
    }

    /// Builds a constructor entry.
    #[must_use]
    pub fn constructor(inputs: Vec<Param>, state_mutability: &str) -> Self {
        Self {
            kind: SignatureKind::Constructor,
            name: None,
            inputs,
            outputs: None,
            state_mutability: Some(state_mutability.to_string()),
            anonymous: None,
            extra: BTreeMap::new(),
        }
    }

    /// Builds an event entry.
    #[must_use]
    pub fn event(name: &str, inputs: Vec<Param>) -> Self {
        Self {
            kind: SignatureKind::Event,
            name: Some(name.to_string()),
            inputs,
            outputs: None,
            state_mutability: None,
            anonymous: Some(false),
            extra: BTreeMap::new(),
        }
    }

    /// Entry name, or the empty string for unnamed entries.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Canonical signature text, e.g. `registerOracle()` or
    /// `OracleRegistered(address)`.
    #[must_use]
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.inputs.iter().map(|p| p.kind.as_str()).collect();
        format!("{}({})", self.name(), types.join(","))
    }

    /// Returns true for payable functions and constructors.
    #[must_use]
    pub fn is_payable(&self) -> bool {
        self.state_mutability.as_deref() == Some("payable")
    }
}

// =============================================================================
// INTERFACE
// =============================================================================

/// Ordered capability set of a component.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Interface(pub Vec<CallSignature>);

impl Interface {
    /// Wraps an ordered list of signatures.
    #[must_use]
    pub fn new(entries: Vec<CallSignature>) -> Self {
        Self(entries)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the interface has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<&CallSignature> {
        self.find(SignatureKind::Function, name)
    }

    /// Looks up an event by name.
    #[must_use]
    pub fn event(&self, name: &str) -> Option<&CallSignature> {
        self.find(SignatureKind::Event, name)
    }

    /// All event entries.
    pub fn events(&self) -> impl Iterator<Item = &CallSignature> {
        self.0.iter().filter(|e| e.kind == SignatureKind::Event)
    }

    fn find(&self, kind: SignatureKind, name: &str) -> Option<&CallSignature> {
        self.0.iter().find(|e| e.kind == kind && e.name() == name)
    }
}

// =============================================================================
// ARTIFACTS
// =============================================================================

/// Build output for one component: its interface and creation bytecode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    /// Component name, e.g. `FlightSuretyData`.
    pub contract_name: String,
    /// Interface published alongside the address.
    pub abi: Interface,
    /// `0x`-prefixed creation bytecode. Empty for simulated components.
    #[serde(default)]
    pub bytecode: String,
}

impl Artifact {
    /// Creates an artifact.
    #[must_use]
    pub fn new(contract_name: &str, abi: Interface, bytecode: &str) -> Self {
        Self {
            contract_name: contract_name.to_string(),
            abi,
            bytecode: bytecode.to_string(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
