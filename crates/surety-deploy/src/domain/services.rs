//! # Domain Services
//!
//! Pure hashing helpers used to derive ledger identifiers.
//! Deterministic, no I/O.

use crate::domain::value_objects::{Address, Hash};
use sha3::{Digest, Keccak256};

/// Computes keccak256 hash.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    Hash::new(Keccak256::digest(data).into())
}

/// Address of a component created by `sender` at account nonce `nonce`.
///
/// Address = keccak256(rlp(\[sender, nonce\]))\[12:\]
#[must_use]
pub fn compute_contract_address(sender: Address, nonce: u64) -> Address {
    let mut content = Vec::with_capacity(30);

    // 20-byte string: 0x80 + 20
    content.push(0x94);
    content.extend_from_slice(sender.as_bytes());

    if nonce == 0 {
        content.push(0x80);
    } else if nonce < 0x80 {
        content.push(nonce as u8);
    } else {
        let bytes = nonce.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(7);
        let trimmed = &bytes[first..];
        content.push(0x80 + trimmed.len() as u8);
        content.extend_from_slice(trimmed);
    }

    // Content never exceeds 55 bytes, so a short list header suffices.
    let mut rlp = Vec::with_capacity(content.len() + 1);
    rlp.push(0xc0 + content.len() as u8);
    rlp.extend_from_slice(&content);

    let hash = Keccak256::digest(&rlp);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..32]);
    Address::new(addr)
}

/// Deterministic transaction identifier for simulated ledgers.
#[must_use]
pub fn transaction_hash(from: Address, nonce: u64, payload: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(from.as_bytes());
    hasher.update(nonce.to_be_bytes());
    hasher.update(payload);
    Hash::new(hasher.finalize().into())
}

// =============================================================================
// TESTS
// =============================================================================
