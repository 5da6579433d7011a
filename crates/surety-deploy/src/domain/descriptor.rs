//! # Deployment Descriptor
//!
//! The published record of component addresses and interfaces, keyed by
//! network. Serialized as tab-indented JSON:
//!
//! ```text
//! {
//!     "localhost": {
//!         "url": "http://localhost:8545",
//!         "FlightSuretyApp":  { "address": "0x…", "abi": [ … ] },
//!         "FlightSuretyData": { "address": "0x…", "abi": [ … ] }
//!     }
//! }
//! ```
//!
//! Maps are ordered, so a descriptor always serializes to the same bytes.
//! There are no mutators: a re-deployment builds a new descriptor.

use crate::domain::entities::Component;
use crate::domain::interface::Interface;
use crate::domain::value_objects::Address;
use crate::errors::DescriptorError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Network-level key holding the endpoint. No component may use it as a name.
pub const URL_KEY: &str = "url";

/// Checks that `names` can share one network entry: distinct, and none equal
/// to [`URL_KEY`].
pub fn check_component_names<'a, I>(names: I) -> Result<(), DescriptorError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = BTreeSet::new();
    for name in names {
        if name == URL_KEY {
            return Err(DescriptorError::ReservedName(name.to_string()));
        }
        if !seen.insert(name) {
            return Err(DescriptorError::DuplicateComponent(name.to_string()));
        }
    }
    Ok(())
}

/// Address and interface of one component, as consumers see it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Component address.
    pub address: Address,
    /// Component interface.
    pub abi: Interface,
}

impl From<&Component> for ComponentRecord {
    fn from(component: &Component) -> Self {
        Self {
            address: component.address,
            abi: component.interface.clone(),
        }
    }
}

/// All components deployed on one network.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkDeployment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(flatten)]
    components: BTreeMap<String, ComponentRecord>,
}

impl NetworkDeployment {
    /// Endpoint consumers should use to reach this network.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Looks up a component by name.
    #[must_use]
    pub fn component(&self, name: &str) -> Option<&ComponentRecord> {
        self.components.get(name)
    }

    /// Number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns true if no component is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Network name → deployed components.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeploymentDescriptor(BTreeMap<String, NetworkDeployment>);

impl DeploymentDescriptor {
    /// Builds the descriptor of a single deployment run.
    ///
    /// Fails if two components share a name or a component is named
    /// [`URL_KEY`]; either would drop an address from the record.
    pub fn for_network(
        network: &str,
        url: Option<&str>,
        components: &[&Component],
    ) -> Result<Self, DescriptorError> {
        check_component_names(components.iter().map(|c| c.name.as_str()))?;

        let deployment = NetworkDeployment {
            url: url.map(str::to_string),
            components: components
                .iter()
                .map(|c| (c.name.clone(), ComponentRecord::from(*c)))
                .collect(),
        };
        Ok(Self(BTreeMap::from([(network.to_string(), deployment)])))
    }

    /// Looks up a network.
    #[must_use]
    pub fn network(&self, name: &str) -> Option<&NetworkDeployment> {
        self.0.get(name)
    }

    /// Serializes to tab-indented JSON.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(out)
    }

    /// Parses a published descriptor.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::interface::{CallSignature, Param};
    use crate::domain::value_objects::Hash;

    fn component(name: &str, byte: u8) -> Component {
        Component::new(
            name,
            Address::new([byte; 20]),
            Interface::new(vec![CallSignature::function(
                "wireApp",
                vec![Param::new("app", "address")],
                "nonpayable",
            )]),
            Hash::ZERO,
        )
    }

    #[test]
    fn test_descriptor_contains_both_components() {
        let data = component("FlightSuretyData", 1);
        let app = component("FlightSuretyApp", 2);
        let descriptor =
            DeploymentDescriptor::for_network("localhost", Some("http://localhost:8545"), &[&data, &app])
                .unwrap();

        let network = descriptor.network("localhost").unwrap();
        assert_eq!(network.len(), 2);
        assert_eq!(network.url(), Some("http://localhost:8545"));
        assert_eq!(network.component("FlightSuretyData").unwrap().address, data.address);
        assert_eq!(network.component("FlightSuretyApp").unwrap().abi, app.interface);
    }

    #[test]
    fn test_serialization_is_tab_indented_and_stable() {
        let data = component("FlightSuretyData", 1);
        let app = component("FlightSuretyApp", 2);
        let first = DeploymentDescriptor::for_network("localhost", None, &[&data, &app]).unwrap();
        let second = DeploymentDescriptor::for_network("localhost", None, &[&app, &data]).unwrap();

        let bytes = first.to_bytes().unwrap();
        assert_eq!(bytes, second.to_bytes().unwrap());

        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("{\n\t\"localhost\": {\n\t\t\"FlightSuretyApp\""));
    }

    #[test]
    fn test_url_is_not_mistaken_for_a_component() {
        let data = component("FlightSuretyData", 1);
        let descriptor = DeploymentDescriptor::for_network("localhost", Some("http://node:8545"), &[&data])
                .unwrap();

        let parsed = DeploymentDescriptor::from_slice(&descriptor.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed, descriptor);
        let network = parsed.network("localhost").unwrap();
        assert_eq!(network.len(), 1);
        assert_eq!(network.url(), Some("http://node:8545"));
    }

    #[test]
    fn test_components_sharing_a_name_are_rejected() {
        let first = component("Same", 1);
        let second = component("Same", 2);

        let err = DeploymentDescriptor::for_network("localhost", None, &[&first, &second]).unwrap_err();
        assert_eq!(err, DescriptorError::DuplicateComponent("Same".into()));
    }

    #[test]
    fn test_component_named_url_is_rejected() {
        let data = component("FlightSuretyData", 1);
        let clash = component(URL_KEY, 2);

        let err = DeploymentDescriptor::for_network("localhost", Some("http://node:8545"), &[&data, &clash])
            .unwrap_err();
        assert_eq!(err, DescriptorError::ReservedName("url".into()));
    }

    #[test]
    fn test_check_component_names_accepts_distinct_names() {
        assert!(check_component_names(["FlightSuretyData", "FlightSuretyApp"]).is_ok());
        assert!(check_component_names(["A", "B", "A"]).is_err());
    }
}
