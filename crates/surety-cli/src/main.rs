//! # Surety CLI
//!
//! Entry point for deploying the registry components and checking the
//! deployed registry's quorum.
//!
//! ## Commands
//!
//! - `deploy`: create both components on a node, publish the descriptor,
//!   wire the logic holder
//! - `register`: register the node's first N accounts against a published
//!   registry and check quorum
//! - `simulate`: the two above, end to end, on the in-memory ledger
//!
//! ## Exit Status
//!
//! Non-zero when a component could not be created, when the enforced
//! authorization/publication policy fails, or when quorum is not reached.

mod telemetry;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use surety_deploy::prelude::*;

use crate::telemetry::{init_logging, LogConfig};

/// Deploy the surety registry components and verify registration quorum.
#[derive(Parser, Debug)]
#[command(name = "surety", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Deploy both components to the configured node.
    Deploy {
        /// Succeed even if the logic component could not be authorized.
        #[arg(long)]
        allow_unauthorized: bool,

        /// Explicit gas limit per transaction.
        #[arg(long, env = "SURETY_GAS_LIMIT")]
        gas_limit: Option<u64>,
    },

    /// Register node accounts against a published registry.
    Register {
        /// Published deployment descriptor.
        #[arg(long)]
        descriptor: PathBuf,

        /// Number of node accounts to register.
        #[arg(long, default_value_t = 30)]
        count: usize,
    },

    /// Deploy and register on the in-memory ledger.
    Simulate {
        /// Number of registering participants.
        #[arg(long, default_value_t = 30)]
        participants: usize,

        /// Sign the authorization call with a participant instead of the
        /// deployer.
        #[arg(long)]
        foreign_authorizer: bool,

        /// Succeed even if the logic component could not be authorized.
        #[arg(long)]
        allow_unauthorized: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_env())?;

    match cli.command {
        Command::Deploy {
            allow_unauthorized,
            gas_limit,
        } => deploy(allow_unauthorized, gas_limit).await,
        Command::Register { descriptor, count } => register(&descriptor, count).await,
        Command::Simulate {
            participants,
            foreign_authorizer,
            allow_unauthorized,
        } => simulate(participants, foreign_authorizer, allow_unauthorized).await,
    }
}

fn deploy_config(allow_unauthorized: bool) -> Result<DeployConfig> {
    let mut config = DeployConfig::from_env().context("invalid deployment configuration")?;
    if allow_unauthorized {
        config.authorization_policy = StepPolicy::Warn;
    }
    Ok(config)
}

async fn deploy(allow_unauthorized: bool, gas_limit: Option<u64>) -> Result<()> {
    let config = deploy_config(allow_unauthorized)?;

    let store = ArtifactStore::new(&config.artifacts_dir);
    let data_holder = store.load(&config.data_component).await?;
    let logic_holder = store.load(&config.logic_component).await?;

    let mut ledger = JsonRpcLedger::new(&config.network.url, config.receipts)?;
    if let Some(gas) = gas_limit {
        ledger = ledger.with_gas_limit(gas);
    }
    let ledger = Arc::new(ledger);

    let deployer = ledger
        .accounts()
        .await
        .with_context(|| format!("cannot list accounts on {}", ledger.url()))?
        .first()
        .copied()
        .context("node has no unlocked accounts")?;

    let sinks: Vec<Arc<dyn DescriptorSink>> = config
        .sinks
        .iter()
        .map(|path| Arc::new(FileSink::new(path)) as Arc<dyn DescriptorSink>)
        .collect();

    let plan = DeploymentPlan {
        network: config.network.name.clone(),
        url: Some(config.network.url.clone()),
        data_holder,
        logic_holder,
    };
    let orchestrator = DeploymentOrchestrator::new(
        ledger,
        plan,
        DescriptorPublisher::new(sinks),
        &config.surface.authorize_method,
    );

    let report = orchestrator
        .deploy(&config.initial_state.resolve(), config.funding, deployer)
        .await?
        .enforce(config.authorization_policy, config.publish_policy)?;

    summarize_deployment(&report);
    Ok(())
}

async fn register(descriptor_path: &Path, count: usize) -> Result<()> {
    let config = deploy_config(false)?;
    let harness_config = HarnessConfig::from_env().context("invalid harness configuration")?;

    let bytes = tokio::fs::read(descriptor_path)
        .await
        .with_context(|| format!("cannot read descriptor {}", descriptor_path.display()))?;
    let descriptor = DeploymentDescriptor::from_slice(&bytes)
        .with_context(|| format!("cannot parse descriptor {}", descriptor_path.display()))?;

    let network = descriptor
        .network(&config.network.name)
        .with_context(|| format!("descriptor has no network {:?}", config.network.name))?;
    let registry = network
        .component(&config.logic_component)
        .with_context(|| format!("descriptor has no component {:?}", config.logic_component))?;
    let url = network.url().unwrap_or(&config.network.url);

    let ledger = JsonRpcLedger::new(url, config.receipts)?;
    ledger.bind(registry.address, registry.abi.clone());

    let mut participants = ledger.accounts().await?;
    if participants.len() < count {
        warn!(
            requested = count,
            available = participants.len(),
            "Fewer node accounts than requested participants"
        );
    }
    participants.truncate(count);

    let harness = RegistrationHarness::new(Arc::new(ledger), registry.address, &harness_config);
    info!(
        registry = %registry.address,
        participants = participants.len(),
        threshold = harness.threshold().get(),
        "Registering participants"
    );
    let outcome = harness.register_all(&participants, harness_config.fee).await;
    check_quorum(&outcome)
}

async fn simulate(
    participants: usize,
    foreign_authorizer: bool,
    allow_unauthorized: bool,
) -> Result<()> {
    let config = deploy_config(allow_unauthorized)?;
    let harness_config = HarnessConfig::from_env().context("invalid harness configuration")?;

    let programs = RegistryPrograms {
        data_component: config.data_component.clone(),
        logic_component: config.logic_component.clone(),
        surface: config.surface.clone(),
        min_fee: harness_config.fee,
        ..RegistryPrograms::default()
    };
    let ledger = Arc::new(InMemoryLedger::with_registry(&programs));
    let roles = SimulationAccounts::new(participants, foreign_authorizer);

    let sinks: Vec<Arc<dyn DescriptorSink>> = config
        .sinks
        .iter()
        .map(|path| {
            Arc::new(MemorySink::new(path.display().to_string())) as Arc<dyn DescriptorSink>
        })
        .collect();

    let plan = DeploymentPlan {
        network: config.network.name.clone(),
        url: Some(config.network.url.clone()),
        data_holder: programs.data_artifact(),
        logic_holder: programs.logic_artifact(),
    };
    let mut orchestrator = DeploymentOrchestrator::new(
        ledger.clone(),
        plan,
        DescriptorPublisher::new(sinks),
        &config.surface.authorize_method,
    );
    if let Some(stranger) = roles.authorizer {
        orchestrator = orchestrator.with_authorizer(stranger);
    }

    let report = orchestrator
        .deploy(&config.initial_state.resolve(), config.funding, roles.deployer)
        .await?
        .enforce(config.authorization_policy, config.publish_policy)?;
    summarize_deployment(&report);

    let harness = RegistrationHarness::new(ledger, report.logic_holder.address, &harness_config);
    let outcome = harness
        .register_all(&roles.participants, harness_config.fee)
        .await;
    check_quorum(&outcome)
}

/// Dev accounts of a simulated run. The foreign authorizer is the first
/// non-deployer account and exists even when no participant registers.
#[derive(Debug)]
struct SimulationAccounts {
    deployer: Identity,
    authorizer: Option<Identity>,
    participants: Vec<Identity>,
}

impl SimulationAccounts {
    fn new(participants: usize, foreign_authorizer: bool) -> Self {
        let mut accounts =
            InMemoryLedger::dev_accounts(participants.max(usize::from(foreign_authorizer)) + 1);
        let deployer = accounts.remove(0);
        let authorizer = accounts.first().copied().filter(|_| foreign_authorizer);
        accounts.truncate(participants);
        Self {
            deployer,
            authorizer,
            participants: accounts,
        }
    }
}

fn summarize_deployment(report: &DeploymentReport) {
    info!(
        run_id = %report.run_id,
        data = %report.data_holder.address,
        app = %report.logic_holder.address,
        authorized = report.is_authorized(),
        "Deployment complete"
    );
    for failed in report.failed_sinks() {
        warn!(sink = %failed, "Descriptor not published");
    }
}

fn check_quorum(outcome: &QuorumOutcome) -> Result<()> {
    match outcome {
        QuorumOutcome::Quorum { confirmed } => {
            info!(confirmed = confirmed.len(), "Registry reached quorum");
            Ok(())
        }
        QuorumOutcome::QuorumFailure {
            confirmed,
            submitted,
            threshold,
            unconfirmed,
        } => {
            for entry in unconfirmed {
                warn!(participant = %entry.participant, reason = %entry.reason, "Unconfirmed");
            }
            bail!(
                "quorum not reached: {confirmed} of {submitted} confirmed, {} required",
                threshold.get()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_authorizer_exists_without_participants() {
        let roles = SimulationAccounts::new(0, true);

        let stranger = roles.authorizer.unwrap();
        assert_ne!(stranger, roles.deployer);
        assert!(roles.participants.is_empty());
    }

    #[test]
    fn test_participants_exclude_deployer() {
        let roles = SimulationAccounts::new(30, true);

        assert_eq!(roles.participants.len(), 30);
        assert!(!roles.participants.contains(&roles.deployer));
        assert_eq!(roles.authorizer, Some(roles.participants[0]));

        let roles = SimulationAccounts::new(3, false);
        assert_eq!(roles.participants.len(), 3);
        assert!(roles.authorizer.is_none());
    }

    #[test]
    fn test_cli_parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "surety",
            "simulate",
            "--participants",
            "0",
            "--foreign-authorizer",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Command::Simulate {
                participants: 0,
                foreign_authorizer: true,
                allow_unauthorized: false,
            }
        ));
    }
}
