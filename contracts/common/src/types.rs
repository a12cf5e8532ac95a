//! Core Types
//!
//! Fundamental data structures shared by the engine, the oracles and the
//! token ledger.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Type alias for addresses (32-byte hash)
pub type Address = [u8; 32];

/// The null address; never a valid target for funds
pub const ZERO_ADDRESS: Address = [0u8; 32];

/// Derive a deterministic address from a domain tag and a seed
///
/// `address = SHA-256(len(domain) as u64 LE || domain || seed)`
pub fn derive_address(domain: &[u8], seed: &[u8]) -> Address {
    let mut hasher = Sha256::new();
    hasher.update((domain.len() as u64).to_le_bytes());
    hasher.update(domain);
    hasher.update(seed);
    let result = hasher.finalize();
    let mut address = [0u8; 32];
    address.copy_from_slice(&result);
    address
}

/// Returns true if the address is the null address
pub fn is_zero_address(address: &Address) -> bool {
    *address == ZERO_ADDRESS
}

/// Caller and host clock for a single call into the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct CallContext {
    /// Account invoking the operation
    pub caller: Address,
    /// Host timestamp in seconds; never decreases between calls
    pub timestamp: u64,
}

impl CallContext {
    /// Create a new call context
    pub fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

/// Audit record returned by every parameter setter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct ParamUpdate<T> {
    /// Value before the update
    pub old: T,
    /// Value after the update
    pub new: T,
}

impl<T: PartialEq> ParamUpdate<T> {
    /// Create a new update record
    pub fn new(old: T, new: T) -> Self {
        Self { old, new }
    }

    /// Returns true if the value actually changed
    pub fn changed(&self) -> bool {
        self.old != self.new
    }
}
