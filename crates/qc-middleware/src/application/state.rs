use crate::domain::{
    invariant_key_bounds, invariant_key_uniqueness, invariant_vault_exclusivity,
    invariant_vault_reverse_map, KeyRegistry, MembershipRegistry, MiddlewareError,
    MiddlewareResult,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Encapsulates the mutable state of the Middleware Service.
/// Lock order is `membership` before `keys`.
pub struct MiddlewareState {
    pub membership: RwLock<MembershipRegistry>,
    pub keys: RwLock<KeyRegistry>,
}

impl MiddlewareState {
    pub fn new(slashing_window: u64) -> Self {
        Self {
            membership: RwLock::new(MembershipRegistry::new(slashing_window)),
            keys: RwLock::new(KeyRegistry::new(slashing_window)),
        }
    }

    /// Restore from an exported snapshot. Indexes are rebuilt and the
    /// structural invariants checked before anything is accepted.
    pub fn from_snapshot(snapshot: MiddlewareSnapshot) -> MiddlewareResult<Self> {
        let MiddlewareSnapshot {
            mut membership,
            mut keys,
        } = snapshot;
        membership.rebuild_indexes();
        keys.rebuild_indexes();
        check_restored(&membership, &keys)?;
        Ok(Self {
            membership: RwLock::new(membership),
            keys: RwLock::new(keys),
        })
    }

    /// Consistent copy of both registries.
    pub fn snapshot(&self) -> MiddlewareSnapshot {
        let membership = self.membership.read();
        let keys = self.keys.read();
        MiddlewareSnapshot {
            membership: membership.clone(),
            keys: keys.clone(),
        }
    }
}

fn check_restored(membership: &MembershipRegistry, keys: &KeyRegistry) -> MiddlewareResult<()> {
    let checks = [
        ("duplicate subnetwork or vault entry", membership.has_unique_entries()),
        ("vault registered in two roles", invariant_vault_exclusivity(membership)),
        ("vault operator map out of sync", invariant_vault_reverse_map(membership)),
        ("duplicate operator key entry", keys.has_unique_entries()),
        ("too many keys for one operator", invariant_key_bounds(keys)),
        ("key owner map out of sync", invariant_key_uniqueness(keys)),
    ];
    match checks.iter().find(|(_, holds)| !*holds) {
        Some((violation, _)) => Err(MiddlewareError::InvalidConfig(format!(
            "snapshot rejected: {}",
            violation
        ))),
        None => Ok(()),
    }
}

/// Serializable export of the whole registry state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MiddlewareSnapshot {
    pub membership: MembershipRegistry,
    pub keys: KeyRegistry,
}
