//! # Domain Invariants
//!
//! Structural rules that must hold after every committed mutation. The
//! service checks them with `debug_assert!` and enforces them on snapshot
//! restore; tests call them directly.

use super::key_registry::{KeyRegistry, MAX_DISABLED_KEYS};
use super::membership::MembershipRegistry;
use std::collections::HashSet;

/// Invariant: a vault is never shared and exclusive at once, and never bound
/// to two operators.
pub fn invariant_vault_exclusivity(registry: &MembershipRegistry) -> bool {
    let mut seen = HashSet::new();
    for (_, set) in registry.operators_with_vaults() {
        for vault in set.values() {
            if registry.is_shared_vault(&vault) || !seen.insert(vault) {
                return false;
            }
        }
    }
    true
}

/// Invariant: `vault_operator` holds exactly the stored exclusive vaults, each
/// pointing at the operator whose set stores it.
pub fn invariant_vault_reverse_map(registry: &MembershipRegistry) -> bool {
    let stored: usize = registry
        .operators_with_vaults()
        .map(|(_, set)| set.len())
        .sum();
    let bound = registry.vault_bindings().count();

    stored == bound
        && registry
            .vault_bindings()
            .all(|(vault, operator)| registry.operator_vault_set_contains(operator, vault))
}

/// Invariant: every operator stores at most one enabled key and at most
/// `MAX_DISABLED_KEYS + 1` keys overall.
pub fn invariant_key_bounds(registry: &KeyRegistry) -> bool {
    registry.operators().all(|(_, set)| {
        let enabled = set.iter().filter(|entry| entry.window.is_enabled()).count();
        enabled <= 1 && set.len() <= MAX_DISABLED_KEYS + 1
    })
}

/// Invariant: every stored key maps back to its owner, the map has no
/// dangling entries, and the zero key is never stored.
pub fn invariant_key_uniqueness(registry: &KeyRegistry) -> bool {
    let mut stored = 0usize;
    for (operator, set) in registry.operators() {
        for key in set.values() {
            stored += 1;
            if key.is_zero() || registry.operator_by_key(&key) != *operator {
                return false;
            }
        }
    }
    stored == registry.key_owners().count()
}
