//! # Registration Tally
//!
//! Participant lifecycle and the aggregate quorum predicate evaluated once
//! every registration has completed.
//!
//! ```text
//! Unregistered ──submit──→ Pending ──confirmation──→ Confirmed
//!                             │
//!                             └──failure / no event──→ Rejected
//! ```

use crate::domain::value_objects::{Hash, Identity};
use crate::errors::RegistrationError;

/// Minimum number of confirmed participants for the registry to be viable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct QuorumThreshold(pub usize);

impl QuorumThreshold {
    /// Creates a threshold.
    #[must_use]
    pub const fn new(minimum: usize) -> Self {
        Self(minimum)
    }

    /// The minimum count.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// Where a participant is in its registration lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParticipantStatus {
    /// Nothing submitted yet.
    Unregistered,
    /// Request submitted, outcome not yet observed.
    Pending,
    /// Confirmation observed exactly once.
    Confirmed {
        /// Registration transaction.
        tx_hash: Hash,
    },
    /// Request failed or was not confirmed.
    Rejected(RegistrationError),
}

/// Final state of one submitted registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParticipantRecord {
    /// Position in the submitted sequence.
    pub index: usize,
    /// Registering identity.
    pub participant: Identity,
    /// Lifecycle state.
    pub status: ParticipantStatus,
}

impl ParticipantRecord {
    /// Returns true if the participant's confirmation was observed.
    #[must_use]
    pub fn is_confirmed(&self) -> bool {
        matches!(self.status, ParticipantStatus::Confirmed { .. })
    }
}

/// A participant left unconfirmed, and why.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unconfirmed {
    /// Registering identity.
    pub participant: Identity,
    /// Why it was not confirmed.
    pub reason: RegistrationError,
}

/// Aggregate outcome of a registration run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuorumOutcome {
    /// Every submission confirmed and the count meets the threshold.
    Quorum {
        /// Confirmed participants in submission order.
        confirmed: Vec<Identity>,
    },
    /// Some submission unconfirmed, or too few submissions.
    QuorumFailure {
        /// Number of confirmed participants.
        confirmed: usize,
        /// Number of submitted participants.
        submitted: usize,
        /// Required minimum.
        threshold: QuorumThreshold,
        /// Unconfirmed participants in submission order.
        unconfirmed: Vec<Unconfirmed>,
    },
}

impl QuorumOutcome {
    /// Returns true if quorum was reached.
    #[must_use]
    pub fn is_quorum(&self) -> bool {
        matches!(self, Self::Quorum { .. })
    }

    /// Number of confirmed participants.
    #[must_use]
    pub fn confirmed_count(&self) -> usize {
        match self {
            Self::Quorum { confirmed } => confirmed.len(),
            Self::QuorumFailure { confirmed, .. } => *confirmed,
        }
    }

    /// Unconfirmed participants (empty on quorum).
    #[must_use]
    pub fn unconfirmed(&self) -> &[Unconfirmed] {
        match self {
            Self::Quorum { .. } => &[],
            Self::QuorumFailure { unconfirmed, .. } => unconfirmed,
        }
    }
}

/// Evaluates the quorum predicate over completed records.
///
/// Quorum holds iff every submitted participant is confirmed and the number
/// submitted is at least the threshold.
#[must_use]
pub fn tally(records: &[ParticipantRecord], threshold: QuorumThreshold) -> QuorumOutcome {
    let mut confirmed = Vec::with_capacity(records.len());
    let mut unconfirmed = Vec::new();

    let mut ordered: Vec<&ParticipantRecord> = records.iter().collect();
    ordered.sort_by_key(|r| r.index);

    for record in ordered {
        match &record.status {
            ParticipantStatus::Confirmed { .. } => confirmed.push(record.participant),
            ParticipantStatus::Rejected(reason) => unconfirmed.push(Unconfirmed {
                participant: record.participant,
                reason: reason.clone(),
            }),
            ParticipantStatus::Unregistered | ParticipantStatus::Pending => {
                unconfirmed.push(Unconfirmed {
                    participant: record.participant,
                    reason: RegistrationError::Unconfirmed,
                });
            }
        }
    }

    let submitted = records.len();
    if unconfirmed.is_empty() && submitted >= threshold.get() {
        QuorumOutcome::Quorum { confirmed }
    } else {
        QuorumOutcome::QuorumFailure {
            confirmed: confirmed.len(),
            submitted,
            threshold,
            unconfirmed,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Address;
    use crate::errors::LedgerError;

    fn identity(n: u8) -> Identity {
        Identity::new(Address::new([n; 20]))
    }

    fn confirmed(index: usize) -> ParticipantRecord {
        ParticipantRecord {
            index,
            participant: identity(index as u8 + 1),
            status: ParticipantStatus::Confirmed { tx_hash: Hash::ZERO },
        }
    }

    #[test]
    fn test_quorum_when_all_confirmed_and_threshold_met() {
        let records: Vec<_> = (0..3).map(confirmed).collect();
        let outcome = tally(&records, QuorumThreshold::new(3));
        assert!(outcome.is_quorum());
        assert_eq!(outcome.confirmed_count(), 3);
    }

    #[test]
    fn test_short_count_fails_with_no_unconfirmed() {
        let records: Vec<_> = (0..2).map(confirmed).collect();
        let outcome = tally(&records, QuorumThreshold::new(3));
        match outcome {
            QuorumOutcome::QuorumFailure {
                confirmed,
                submitted,
                unconfirmed,
                ..
            } => {
                assert_eq!(confirmed, 2);
                assert_eq!(submitted, 2);
                assert!(unconfirmed.is_empty());
            }
            QuorumOutcome::Quorum { .. } => panic!("two of three must not reach quorum"),
        }
    }

    #[test]
    fn test_single_rejection_breaks_quorum_even_above_threshold() {
        let mut records: Vec<_> = (0..4).map(confirmed).collect();
        records[2].status = ParticipantStatus::Rejected(RegistrationError::Rejected(
            LedgerError::Reverted { reason: "fee".into() },
        ));

        let outcome = tally(&records, QuorumThreshold::new(2));
        assert!(!outcome.is_quorum());
        assert_eq!(outcome.confirmed_count(), 3);
        assert_eq!(outcome.unconfirmed().len(), 1);
        assert_eq!(outcome.unconfirmed()[0].participant, identity(3));
    }

    #[test]
    fn test_empty_run_against_zero_threshold_is_quorum() {
        assert!(tally(&[], QuorumThreshold::new(0)).is_quorum());
        assert!(!tally(&[], QuorumThreshold::new(1)).is_quorum());
    }

    #[test]
    fn test_pending_record_counts_as_unconfirmed() {
        let records = vec![ParticipantRecord {
            index: 0,
            participant: identity(1),
            status: ParticipantStatus::Pending,
        }];
        let outcome = tally(&records, QuorumThreshold::new(0));
        assert_eq!(outcome.unconfirmed()[0].reason, RegistrationError::Unconfirmed);
    }
}
