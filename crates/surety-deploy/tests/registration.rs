//! # Registration Harness Integration Tests
//!
//! Concurrent registrations against a freshly deployed registry on the
//! in-memory ledger. Every test deploys its own registry so runs share no
//! ledger state.

use std::sync::Arc;

use surety_deploy::adapters::FeeRegistry;
use surety_deploy::prelude::*;

const THRESHOLD: usize = 30;

struct Registry {
    ledger: Arc<InMemoryLedger>,
    address: Address,
}

impl Registry {
    async fn deploy() -> Self {
        let programs = RegistryPrograms::default();
        let ledger = Arc::new(InMemoryLedger::with_registry(&programs));
        let deployer = InMemoryLedger::dev_accounts(1)[0];

        let plan = DeploymentPlan {
            network: "localhost".into(),
            url: None,
            data_holder: programs.data_artifact(),
            logic_holder: programs.logic_artifact(),
        };
        let report = DeploymentOrchestrator::new(
            ledger.clone(),
            plan,
            DescriptorPublisher::default(),
            &programs.surface.authorize_method,
        )
        .deploy(&InitialState::default(), ether(11), deployer)
        .await
        .unwrap()
        .enforce(StepPolicy::Fatal, StepPolicy::Fatal)
        .unwrap();

        Self {
            ledger,
            address: report.logic_holder.address,
        }
    }

    fn harness(&self) -> RegistrationHarness<InMemoryLedger> {
        let config = HarnessConfig {
            quorum_threshold: QuorumThreshold::new(THRESHOLD),
            ..HarnessConfig::default()
        };
        RegistrationHarness::new(self.ledger.clone(), self.address, &config)
    }

    fn registered_count(&self) -> Wei {
        match self
            .ledger
            .view(self.address, FeeRegistry::COUNT_VIEW, &[])
            .unwrap()
            .as_slice()
        {
            [CallArg::Uint(count)] => *count,
            other => panic!("unexpected view result: {other:?}"),
        }
    }
}

/// Participants other than the deployer (account 0).
fn participants(count: usize) -> Vec<Identity> {
    InMemoryLedger::dev_accounts(count + 1).split_off(1)
}

// =============================================================================
// END-TO-END RUNS
// =============================================================================

/// 30 identities against a threshold of 30 reach quorum.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_thirty_registrations_reach_quorum() {
    // Arrange
    let registry = Registry::deploy().await;
    let oracles = participants(30);

    // Act
    let outcome = registry.harness().register_all(&oracles, ether(1)).await;

    // Assert
    match outcome {
        QuorumOutcome::Quorum { confirmed } => assert_eq!(confirmed, oracles),
        other => panic!("expected quorum, got {other:?}"),
    }
    assert_eq!(registry.registered_count(), Wei::from(30u64));
}

/// 29 identities against a threshold of 30 all confirm, yet
/// quorum fails on the count alone.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_twenty_nine_registrations_fall_short() {
    let registry = Registry::deploy().await;

    let outcome = registry
        .harness()
        .register_all(&participants(29), ether(1))
        .await;

    assert_eq!(
        outcome,
        QuorumOutcome::QuorumFailure {
            confirmed: 29,
            submitted: 29,
            threshold: QuorumThreshold::new(THRESHOLD),
            unconfirmed: Vec::new(),
        }
    );
}

// =============================================================================
// INVARIANTS
// =============================================================================

/// N valid unique participants give N confirmations; quorum iff N
/// reaches the threshold.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_confirmed_count_matches_submissions() {
    for n in [0, 1, 17, 30, 45] {
        let registry = Registry::deploy().await;

        let outcome = registry
            .harness()
            .register_all(&participants(n), ether(1))
            .await;

        assert_eq!(outcome.confirmed_count(), n, "n = {n}");
        assert!(outcome.unconfirmed().is_empty(), "n = {n}");
        assert_eq!(outcome.is_quorum(), n >= THRESHOLD, "n = {n}");
    }
}

/// A registration paying less than the minimum fee is rejected and
/// never confirmed, even alongside valid ones.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_underpaid_registration_is_never_confirmed() {
    let registry = Registry::deploy().await;
    let harness = registry.harness();
    let oracles = participants(31);

    let paid = harness.submit_all(&oracles[..30], ether(1)).await;
    let underpaid = harness
        .submit_all(&oracles[30..], ether(1) / Wei::from(2u64))
        .await;

    assert!(paid.iter().all(ParticipantRecord::is_confirmed));
    assert_eq!(underpaid.len(), 1);
    match &underpaid[0].status {
        ParticipantStatus::Rejected(RegistrationError::Rejected(e)) => assert!(e.is_revert()),
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(registry.registered_count(), Wei::from(30u64));
}

/// Every registration below the fee fails, and quorum with it.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_fee_run_fails_quorum() {
    let registry = Registry::deploy().await;

    let outcome = registry
        .harness()
        .register_all(&participants(30), Wei::zero())
        .await;

    assert_eq!(outcome.confirmed_count(), 0);
    assert_eq!(outcome.unconfirmed().len(), 30);
    assert_eq!(registry.registered_count(), Wei::zero());
}

// =============================================================================
// EDGE CASES
// =============================================================================

/// A duplicated identity is submitted twice; the registry rejects one
/// submission and the harness reports it.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_duplicate_identity_is_submitted_twice() {
    let registry = Registry::deploy().await;
    let mut oracles = participants(30);
    oracles.push(oracles[0]);

    let outcome = registry.harness().register_all(&oracles, ether(1)).await;

    assert!(!outcome.is_quorum());
    assert_eq!(outcome.confirmed_count(), 30);
    assert_eq!(outcome.unconfirmed().len(), 1);
    assert_eq!(outcome.unconfirmed()[0].participant, oracles[0]);
    assert!(matches!(
        outcome.unconfirmed()[0].reason,
        RegistrationError::Rejected(LedgerError::Reverted { .. })
    ));
    assert_eq!(registry.registered_count(), Wei::from(30u64));
}

/// A registry that cannot be reached leaves every participant unconfirmed
/// without aborting the run.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_transport_failure_is_collected_per_participant() {
    let registry = Registry::deploy().await;
    registry
        .ledger
        .fail_on("registerOracle", LedgerError::Transport("node down".into()));

    let outcome = registry
        .harness()
        .register_all(&participants(3), ether(1))
        .await;

    assert_eq!(outcome.unconfirmed().len(), 3);
    assert!(outcome
        .unconfirmed()
        .iter()
        .all(|u| matches!(u.reason, RegistrationError::Rejected(LedgerError::Transport(_)))));
}
