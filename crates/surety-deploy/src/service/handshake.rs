//! # Authorization Handshake
//!
//! One privileged call from the deployer to the data holder naming the
//! logic holder as its sole mutator.

use crate::domain::abi::CallArg;
use crate::domain::entities::AuthorizationGrant;
use crate::domain::value_objects::{Address, Identity};
use crate::errors::{AuthorizationError, LedgerError};
use crate::ports::outbound::{ContractCall, Ledger};
use std::sync::Arc;
use tracing::debug;

/// Issues the authorization call. Holds no state between calls.
pub struct AuthorizationHandshake<L: Ledger> {
    ledger: Arc<L>,
    method: String,
}

impl<L: Ledger> AuthorizationHandshake<L> {
    /// Create a handshake calling `method` on grantors.
    pub fn new(ledger: Arc<L>, method: impl Into<String>) -> Self {
        Self {
            ledger,
            method: method.into(),
        }
    }

    /// Asks `grantor` to accept `grantee` as its sole mutator, signed by
    /// `caller`.
    ///
    /// Exactly one call is made. A refusal by the grantor is
    /// [`AuthorizationError::Rejected`]; a call that never completed is
    /// [`AuthorizationError::Ledger`].
    pub async fn authorize(
        &self,
        grantor: Address,
        grantee: Address,
        caller: Identity,
    ) -> Result<AuthorizationGrant, AuthorizationError> {
        let call = ContractCall::new(
            caller,
            grantor,
            &self.method,
            vec![CallArg::Address(grantee)],
        );
        debug!(
            grantor = %grantor,
            grantee = %grantee,
            caller = %caller,
            method = %self.method,
            "Issuing authorization call"
        );

        match self.ledger.send(&call).await {
            Ok(receipt) => Ok(AuthorizationGrant {
                grantor,
                grantee,
                caller,
                tx_hash: receipt.tx_hash,
            }),
            Err(LedgerError::Reverted { reason }) => Err(AuthorizationError::Rejected {
                grantor,
                grantee,
                reason,
            }),
            Err(other) => Err(AuthorizationError::Ledger(other)),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
