//! # Core Identity Entities
//!
//! ## Clusters
//!
//! - **Actors**: `Address` for operators, vaults, delegators and slashers
//! - **Partitions**: `SubnetworkId`
//! - **Identity keys**: `OperatorKey`
//! - **Time**: `Timestamp`

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export the fixed-width primitives so downstream crates share one version
pub use primitive_types::{H160, H256, U256};

/// A 20-byte address (operator, vault, delegator or slasher).
pub type Address = H160;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// The reserved "no address" value.
pub const ZERO_ADDRESS: Address = H160::zero();

/// Opaque 160-bit identifier of a subnetwork.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct SubnetworkId(pub H160);

impl SubnetworkId {
    /// Build an identifier from a small integer (big-endian, low bytes).
    pub fn from_low_u64(id: u64) -> Self {
        Self(H160::from_low_u64_be(id))
    }
}

impl From<H160> for SubnetworkId {
    fn from(raw: H160) -> Self {
        Self(raw)
    }
}

impl fmt::Display for SubnetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// 256-bit operator identity key.
///
/// `OperatorKey::ZERO` is the "no key" sentinel: it is never stored and is
/// exempt from the global uniqueness rule.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct OperatorKey(pub H256);

impl OperatorKey {
    /// The reserved "no key" value.
    pub const ZERO: OperatorKey = OperatorKey(H256::zero());

    /// Build a key from a small integer (big-endian, low bytes).
    pub fn from_low_u64(raw: u64) -> Self {
        Self(H256::from_low_u64_be(raw))
    }

    /// Whether this is the reserved "no key" value.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<H256> for OperatorKey {
    fn from(raw: H256) -> Self {
        Self(raw)
    }
}

impl From<[u8; 32]> for OperatorKey {
    fn from(raw: [u8; 32]) -> Self {
        Self(H256::from(raw))
    }
}

impl fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}
