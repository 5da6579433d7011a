//! Deployment and harness configuration from environment variables.

use crate::domain::abi::CallArg;
use crate::domain::descriptor::{check_component_names, URL_KEY};
use crate::domain::entities::InitialState;
use crate::domain::registration::QuorumThreshold;
use crate::domain::report::StepPolicy;
use crate::domain::value_objects::{ether, Wei};
use crate::errors::ConfigError;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Ledger network the descriptor is published for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    /// Descriptor key (e.g. `localhost`).
    pub name: String,
    /// JSON-RPC endpoint, also written into the descriptor.
    pub url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: "localhost".to_string(),
            url: "http://localhost:8545".to_string(),
        }
    }
}

/// Method and event names of the deployed components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractSurface {
    /// Privileged call on the data holder naming the logic holder.
    pub authorize_method: String,
    /// Registration call on the logic holder.
    pub register_method: String,
    /// Event the registry emits per confirmed registration.
    pub confirmation_event: String,
}

impl Default for ContractSurface {
    fn default() -> Self {
        Self {
            authorize_method: "wireApp".to_string(),
            register_method: "registerOracle".to_string(),
            confirmation_event: "OracleRegistered".to_string(),
        }
    }
}

/// Seed data for the data holder's constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialStateConfig {
    /// Name of the first admitted airline.
    pub airline: String,
    /// First flight registered for that airline.
    pub flight: String,
    /// Seconds from now until the flight departs.
    pub departure_offset: Duration,
}

impl Default for InitialStateConfig {
    fn default() -> Self {
        Self {
            airline: "INITIAL_AIRLINE".to_string(),
            flight: "FIRST_TEST_FLIGHT".to_string(),
            departure_offset: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl InitialStateConfig {
    /// Builds constructor arguments, resolving the departure time against
    /// the current clock.
    #[must_use]
    pub fn resolve(&self) -> InitialState {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        self.resolve_at(now)
    }

    /// Builds constructor arguments relative to `now` (seconds since epoch).
    #[must_use]
    pub fn resolve_at(&self, now: Duration) -> InitialState {
        let departure = (now + self.departure_offset).as_secs();
        InitialState::new(vec![
            CallArg::Str(self.airline.clone()),
            CallArg::Str(self.flight.clone()),
            CallArg::Uint(Wei::from(departure)),
        ])
    }
}

/// Receipt polling budget for real nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolicy {
    /// Delay between receipt polls.
    pub poll_interval: Duration,
    /// Polls before giving up with `NotFinalized`.
    pub max_polls: u32,
}

impl Default for ReceiptPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_polls: 120,
        }
    }
}

/// Configuration of a deployment run.
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Target network.
    pub network: NetworkConfig,
    /// Artifact name of the data holder.
    pub data_component: String,
    /// Artifact name of the logic holder.
    pub logic_component: String,
    /// Value sent with the data holder's creation.
    pub funding: Wei,
    /// Data holder constructor seed.
    pub initial_state: InitialStateConfig,
    /// Descriptor sink paths, written in this order.
    pub sinks: Vec<PathBuf>,
    /// Directory holding `<Name>.json` build artifacts.
    pub artifacts_dir: PathBuf,
    /// Method/event names.
    pub surface: ContractSurface,
    /// Treatment of a failed authorization handshake.
    pub authorization_policy: StepPolicy,
    /// Treatment of failed sink writes.
    pub publish_policy: StepPolicy,
    /// Receipt polling budget.
    pub receipts: ReceiptPolicy,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            data_component: "FlightSuretyData".to_string(),
            logic_component: "FlightSuretyApp".to_string(),
            funding: ether(11),
            initial_state: InitialStateConfig::default(),
            sinks: vec![
                PathBuf::from("./client/src/deployments.json"),
                PathBuf::from("./server/deployments.json"),
            ],
            artifacts_dir: PathBuf::from("./build/contracts"),
            surface: ContractSurface::default(),
            authorization_policy: StepPolicy::Fatal,
            publish_policy: StepPolicy::Warn,
            receipts: ReceiptPolicy::default(),
        }
    }
}

impl DeployConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SURETY_NETWORK`: Descriptor network key (default: localhost)
    /// - `SURETY_RPC_URL`: Node endpoint (default: http://localhost:8545)
    /// - `SURETY_DATA_COMPONENT` / `SURETY_APP_COMPONENT`: Artifact names
    /// - `SURETY_FUNDING_WEI`: Data holder funding (default: 11 ether)
    /// - `SURETY_INITIAL_AIRLINE`, `SURETY_INITIAL_FLIGHT`: Seed names
    /// - `SURETY_DEPARTURE_OFFSET_SECS`: Departure delay (default: 86400)
    /// - `SURETY_SINKS`: Comma-separated descriptor paths
    /// - `SURETY_ARTIFACTS_DIR`: Build artifacts (default: ./build/contracts)
    /// - `SURETY_AUTHORIZE_METHOD`, `SURETY_REGISTER_METHOD`,
    ///   `SURETY_CONFIRMATION_EVENT`: Surface names
    /// - `SURETY_AUTHORIZATION_POLICY`: warn | fatal (default: fatal)
    /// - `SURETY_PUBLISH_POLICY`: warn | fatal (default: warn)
    /// - `SURETY_RECEIPT_POLL_MS`, `SURETY_RECEIPT_MAX_POLLS`: Receipt budget
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let initial = InitialStateConfig::default();
        let receipts = ReceiptPolicy::default();

        let sinks = match lookup("SURETY_SINKS") {
            Some(raw) => {
                let paths: Vec<PathBuf> = raw
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
                    .collect();
                if paths.is_empty() {
                    return Err(ConfigError {
                        key: "SURETY_SINKS".to_string(),
                        value: raw,
                        reason: "at least one sink path is required".to_string(),
                    });
                }
                paths
            }
            None => defaults.sinks,
        };

        let data_component = lookup("SURETY_DATA_COMPONENT").unwrap_or(defaults.data_component);
        let logic_component = lookup("SURETY_APP_COMPONENT").unwrap_or(defaults.logic_component);
        check_component_names([data_component.as_str(), logic_component.as_str()]).map_err(
            |e| {
                let (key, value) = if data_component == URL_KEY {
                    ("SURETY_DATA_COMPONENT", &data_component)
                } else {
                    ("SURETY_APP_COMPONENT", &logic_component)
                };
                ConfigError {
                    key: key.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            },
        )?;

        Ok(Self {
            network: NetworkConfig {
                name: lookup("SURETY_NETWORK").unwrap_or(defaults.network.name),
                url: lookup("SURETY_RPC_URL").unwrap_or(defaults.network.url),
            },
            data_component,
            logic_component,
            funding: wei_var(&lookup, "SURETY_FUNDING_WEI")?.unwrap_or(defaults.funding),
            initial_state: InitialStateConfig {
                airline: lookup("SURETY_INITIAL_AIRLINE").unwrap_or(initial.airline),
                flight: lookup("SURETY_INITIAL_FLIGHT").unwrap_or(initial.flight),
                departure_offset: parsed_var::<u64, _>(&lookup, "SURETY_DEPARTURE_OFFSET_SECS")?
                    .map_or(initial.departure_offset, Duration::from_secs),
            },
            sinks,
            artifacts_dir: lookup("SURETY_ARTIFACTS_DIR")
                .map_or(defaults.artifacts_dir, PathBuf::from),
            surface: ContractSurface::from_lookup(&lookup),
            authorization_policy: policy_var(&lookup, "SURETY_AUTHORIZATION_POLICY")?
                .unwrap_or(defaults.authorization_policy),
            publish_policy: policy_var(&lookup, "SURETY_PUBLISH_POLICY")?
                .unwrap_or(defaults.publish_policy),
            receipts: ReceiptPolicy {
                poll_interval: parsed_var::<u64, _>(&lookup, "SURETY_RECEIPT_POLL_MS")?
                    .map_or(receipts.poll_interval, Duration::from_millis),
                max_polls: parsed_var(&lookup, "SURETY_RECEIPT_MAX_POLLS")?
                    .unwrap_or(receipts.max_polls),
            },
        })
    }
}

impl ContractSurface {
    fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            authorize_method: lookup("SURETY_AUTHORIZE_METHOD")
                .unwrap_or(defaults.authorize_method),
            register_method: lookup("SURETY_REGISTER_METHOD").unwrap_or(defaults.register_method),
            confirmation_event: lookup("SURETY_CONFIRMATION_EVENT")
                .unwrap_or(defaults.confirmation_event),
        }
    }
}

/// Configuration of a registration harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Fee attached to each registration.
    pub fee: Wei,
    /// Minimum confirmed registrations.
    pub quorum_threshold: QuorumThreshold,
    /// Method/event names.
    pub surface: ContractSurface,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fee: ether(1),
            quorum_threshold: QuorumThreshold::new(30),
            surface: ContractSurface::default(),
        }
    }
}

impl HarnessConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `SURETY_FEE_WEI`: Fee per registration (default: 1 ether)
    /// - `SURETY_QUORUM_THRESHOLD`: Required confirmations (default: 30)
    /// - Surface names as for [`DeployConfig::from_env`]
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            fee: wei_var(&lookup, "SURETY_FEE_WEI")?.unwrap_or(defaults.fee),
            quorum_threshold: parsed_var(&lookup, "SURETY_QUORUM_THRESHOLD")?
                .map_or(defaults.quorum_threshold, QuorumThreshold::new),
            surface: ContractSurface::from_lookup(&lookup),
        })
    }
}

fn parsed_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError {
                key: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

fn wei_var<F>(lookup: &F, key: &str) -> Result<Option<Wei>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            Wei::from_dec_str(raw.trim()).map_err(|e| ConfigError {
                key: key.to_string(),
                value: raw.clone(),
                reason: format!("{e:?}"),
            })
        })
        .transpose()
}

fn policy_var<F>(lookup: &F, key: &str) -> Result<Option<StepPolicy>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.parse::<StepPolicy>().map_err(|e| ConfigError {
                key: key.to_string(),
                ..e
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_deploy_config() {
        let config = DeployConfig::default();
        assert_eq!(config.network.name, "localhost");
        assert_eq!(config.funding, ether(11));
        assert_eq!(config.sinks.len(), 2);
        assert_eq!(config.surface.authorize_method, "wireApp");
        assert_eq!(config.authorization_policy, StepPolicy::Fatal);
        assert_eq!(config.publish_policy, StepPolicy::Warn);
    }

    #[test]
    fn test_empty_environment_gives_defaults() {
        let config = DeployConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.sinks, DeployConfig::default().sinks);
        assert_eq!(config.receipts, ReceiptPolicy::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = DeployConfig::from_lookup(lookup_from(&[
            ("SURETY_NETWORK", "devnet"),
            ("SURETY_FUNDING_WEI", "42"),
            ("SURETY_SINKS", "a.json, b.json,"),
            ("SURETY_PUBLISH_POLICY", "fatal"),
            ("SURETY_RECEIPT_MAX_POLLS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.network.name, "devnet");
        assert_eq!(config.funding, Wei::from(42u64));
        assert_eq!(config.sinks, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert_eq!(config.publish_policy, StepPolicy::Fatal);
        assert_eq!(config.receipts.max_polls, 3);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = DeployConfig::from_lookup(lookup_from(&[("SURETY_FUNDING_WEI", "lots")]))
            .unwrap_err();
        assert_eq!(err.key, "SURETY_FUNDING_WEI");

        let err = DeployConfig::from_lookup(lookup_from(&[("SURETY_AUTHORIZATION_POLICY", "x")]))
            .unwrap_err();
        assert_eq!(err.key, "SURETY_AUTHORIZATION_POLICY");

        let err = DeployConfig::from_lookup(lookup_from(&[("SURETY_SINKS", " , ")])).unwrap_err();
        assert_eq!(err.key, "SURETY_SINKS");
    }

    #[test]
    fn test_component_names_must_be_distinct_and_unreserved() {
        let err = DeployConfig::from_lookup(lookup_from(&[
            ("SURETY_DATA_COMPONENT", "Registry"),
            ("SURETY_APP_COMPONENT", "Registry"),
        ]))
        .unwrap_err();
        assert_eq!(err.key, "SURETY_APP_COMPONENT");
        assert!(err.reason.contains("more than once"));

        let err = DeployConfig::from_lookup(lookup_from(&[("SURETY_DATA_COMPONENT", "url")]))
            .unwrap_err();
        assert_eq!(err.key, "SURETY_DATA_COMPONENT");
        assert!(err.reason.contains("reserved"));
    }

    #[test]
    fn test_harness_config() {
        let config = HarnessConfig::from_lookup(lookup_from(&[
            ("SURETY_QUORUM_THRESHOLD", "5"),
            ("SURETY_REGISTER_METHOD", "join"),
        ]))
        .unwrap();
        assert_eq!(config.fee, ether(1));
        assert_eq!(config.quorum_threshold, QuorumThreshold::new(5));
        assert_eq!(config.surface.register_method, "join");

        assert!(HarnessConfig::from_lookup(lookup_from(&[("SURETY_QUORUM_THRESHOLD", "-1")]))
            .is_err());
    }

    #[test]
    fn test_initial_state_resolves_departure() {
        let state = InitialStateConfig::default().resolve_at(Duration::from_secs(1_000));
        assert_eq!(state.args().len(), 3);
        assert_eq!(state.args()[2], CallArg::Uint(Wei::from(1_000u64 + 86_400)));
    }
}
