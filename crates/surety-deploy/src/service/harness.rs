//! # Registration Harness
//!
//! Drives one registration per participant against a deployed registry, all
//! in flight at once, then checks each receipt for exactly one confirmation
//! naming the participant and evaluates the quorum predicate.
//!
//! Tasks share nothing on the caller side; the ledger orders them. Every
//! task is joined before the tally, so a failure never cuts the run short.

use crate::config::{ContractSurface, HarnessConfig};
use crate::domain::registration::{
    tally, ParticipantRecord, ParticipantStatus, QuorumOutcome, QuorumThreshold,
};
use crate::domain::value_objects::{Address, Identity, Wei};
use crate::errors::RegistrationError;
use crate::ports::inbound::RegistrationApi;
use crate::ports::outbound::{CallReceipt, ContractCall, Ledger};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Concurrent registration driver for one registry component.
pub struct RegistrationHarness<L: Ledger> {
    ledger: Arc<L>,
    registry: Address,
    threshold: QuorumThreshold,
    surface: ContractSurface,
}

impl<L: Ledger + 'static> RegistrationHarness<L> {
    /// Create a harness against the registry at `registry`.
    pub fn new(ledger: Arc<L>, registry: Address, config: &HarnessConfig) -> Self {
        Self {
            ledger,
            registry,
            threshold: config.quorum_threshold,
            surface: config.surface.clone(),
        }
    }

    /// Required confirmations.
    #[must_use]
    pub fn threshold(&self) -> QuorumThreshold {
        self.threshold
    }

    /// Submits every registration concurrently and returns one record per
    /// participant, in submission order.
    pub async fn submit_all(&self, participants: &[Identity], fee: Wei) -> Vec<ParticipantRecord> {
        let mut records: Vec<ParticipantRecord> = participants
            .iter()
            .enumerate()
            .map(|(index, participant)| ParticipantRecord {
                index,
                participant: *participant,
                status: ParticipantStatus::Unregistered,
            })
            .collect();

        let mut handles = Vec::with_capacity(records.len());
        for record in &mut records {
            let ledger = Arc::clone(&self.ledger);
            let call = ContractCall::new(
                record.participant,
                self.registry,
                &self.surface.register_method,
                Vec::new(),
            )
            .with_value(fee);

            record.status = ParticipantStatus::Pending;
            handles.push(tokio::spawn(async move { ledger.send(&call).await }));
        }

        let results = join_all(handles).await;

        for (record, joined) in records.iter_mut().zip(results) {
            record.status = match joined {
                Ok(Ok(receipt)) => self.confirmation(record.participant, &receipt),
                Ok(Err(e)) => ParticipantStatus::Rejected(RegistrationError::Rejected(e)),
                Err(e) => ParticipantStatus::Rejected(RegistrationError::Aborted(e.to_string())),
            };
            if let ParticipantStatus::Rejected(reason) = &record.status {
                warn!(
                    index = record.index,
                    participant = %record.participant,
                    reason = %reason,
                    "Registration not confirmed"
                );
            }
        }

        records
    }

    fn confirmation(&self, participant: Identity, receipt: &CallReceipt) -> ParticipantStatus {
        let seen = receipt
            .events
            .iter()
            .filter(|e| e.emitter == self.registry)
            .filter(|e| e.names(&self.surface.confirmation_event, participant.address()))
            .count();

        match seen {
            1 => ParticipantStatus::Confirmed {
                tx_hash: receipt.tx_hash,
            },
            0 => ParticipantStatus::Rejected(RegistrationError::Unconfirmed),
            n => ParticipantStatus::Rejected(RegistrationError::DuplicateConfirmation(n)),
        }
    }

    #[instrument(
        skip_all,
        fields(run_id = %run_id, registry = %self.registry, participants = participants.len())
    )]
    async fn run(&self, run_id: Uuid, participants: &[Identity], fee: Wei) -> QuorumOutcome {
        info!(fee = %fee, threshold = self.threshold.get(), "Submitting registrations");

        let records = self.submit_all(participants, fee).await;
        let outcome = tally(&records, self.threshold);

        match &outcome {
            QuorumOutcome::Quorum { confirmed } => {
                info!(confirmed = confirmed.len(), "Quorum reached");
            }
            QuorumOutcome::QuorumFailure {
                confirmed,
                submitted,
                threshold,
                unconfirmed,
            } => warn!(
                confirmed,
                submitted,
                threshold = threshold.get(),
                unconfirmed = unconfirmed.len(),
                "Quorum not reached"
            ),
        }
        outcome
    }
}

#[async_trait]
impl<L: Ledger + 'static> RegistrationApi for RegistrationHarness<L> {
    async fn register_all(&self, participants: &[Identity], fee: Wei) -> QuorumOutcome {
        self.run(Uuid::new_v4(), participants, fee).await
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::CallArg;
    use crate::domain::entities::Component;
    use crate::domain::value_objects::{ether, Hash};
    use crate::errors::LedgerError;
    use crate::ports::outbound::{ComponentSpec, LedgerEvent};

    /// Ledger answering every registration with a scripted event list.
    struct ScriptedLedger {
        registry: Address,
        confirmations: usize,
    }

    #[async_trait]
    impl Ledger for ScriptedLedger {
        async fn create(
            &self,
            spec: &ComponentSpec,
            _from: Identity,
            _value: Wei,
        ) -> Result<Component, LedgerError> {
            Err(LedgerError::UnknownArtifact(spec.name().to_string()))
        }

        async fn send(&self, call: &ContractCall) -> Result<CallReceipt, LedgerError> {
            let event = LedgerEvent {
                emitter: self.registry,
                name: "OracleRegistered".into(),
                args: vec![CallArg::Address(call.from.address())],
            };
            Ok(CallReceipt {
                tx_hash: Hash::ZERO,
                events: vec![event; self.confirmations],
            })
        }
    }

    fn harness(confirmations: usize) -> RegistrationHarness<ScriptedLedger> {
        let registry = Address::new([0x44; 20]);
        let config = HarnessConfig {
            quorum_threshold: QuorumThreshold::new(2),
            ..HarnessConfig::default()
        };
        RegistrationHarness::new(
            Arc::new(ScriptedLedger {
                registry,
                confirmations,
            }),
            registry,
            &config,
        )
    }

    fn participants(n: u8) -> Vec<Identity> {
        (1..=n).map(|i| Identity::new(Address::new([i; 20]))).collect()
    }

    #[tokio::test]
    async fn test_single_confirmation_confirms() {
        let records = harness(1).submit_all(&participants(2), ether(1)).await;
        assert!(records.iter().all(ParticipantRecord::is_confirmed));
        assert_eq!(records[1].index, 1);
    }

    #[tokio::test]
    async fn test_missing_confirmation_is_unconfirmed() {
        let outcome = harness(0).register_all(&participants(2), ether(1)).await;
        assert!(!outcome.is_quorum());
        assert_eq!(outcome.unconfirmed().len(), 2);
        assert_eq!(outcome.unconfirmed()[0].reason, RegistrationError::Unconfirmed);
    }

    #[tokio::test]
    async fn test_duplicate_confirmation_is_unconfirmed() {
        let outcome = harness(2).register_all(&participants(2), ether(1)).await;
        assert_eq!(
            outcome.unconfirmed()[0].reason,
            RegistrationError::DuplicateConfirmation(2)
        );
    }

    #[tokio::test]
    async fn test_empty_participant_set_fails_quorum() {
        let outcome = harness(1).register_all(&[], ether(1)).await;
        assert_eq!(
            outcome,
            QuorumOutcome::QuorumFailure {
                confirmed: 0,
                submitted: 0,
                threshold: QuorumThreshold::new(2),
                unconfirmed: Vec::new(),
            }
        );
    }
}
