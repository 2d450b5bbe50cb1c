//! # Membership Registry
//!
//! Subnetworks, shared vaults and per-operator exclusive vaults, each kept in
//! a [`WindowedSet`] with the slashing window as cool-down.
//!
//! ## Vault Exclusivity
//!
//! A vault is either shared (usable by every operator) or bound to exactly one
//! operator. Registration refuses a vault that is already known in either
//! role, so a vault is never shared and exclusive at once. The
//! `vault_operator` reverse map is written in the same call as the operator's
//! set, never separately.
//!
//! This module holds state only; collateral validation happens in the
//! application layer before any method here is called.

use super::errors::{MiddlewareError, MiddlewareResult, SetError};
use super::value_objects::{Address, SubnetworkId, Timestamp};
use super::windowed_set::{Entry, WindowedSet};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Time-windowed registry of subnetworks and vaults.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MembershipRegistry {
    slashing_window: u64,
    subnetworks: WindowedSet<SubnetworkId>,
    shared_vaults: WindowedSet<Address>,
    operator_vaults: HashMap<Address, WindowedSet<Address>>,
    /// Exclusive vault -> bound operator (ordered for deterministic enumeration)
    vault_operator: BTreeMap<Address, Address>,
}

impl MembershipRegistry {
    pub fn new(slashing_window: u64) -> Self {
        Self {
            slashing_window,
            subnetworks: WindowedSet::new(),
            shared_vaults: WindowedSet::new(),
            operator_vaults: HashMap::new(),
            vault_operator: BTreeMap::new(),
        }
    }

    pub fn slashing_window(&self) -> u64 {
        self.slashing_window
    }

    // === SUBNETWORKS ===

    pub fn register_subnetwork(
        &mut self,
        now: Timestamp,
        subnetwork: SubnetworkId,
    ) -> MiddlewareResult<()> {
        self.subnetworks
            .register(now, subnetwork)
            .map_err(|source| MiddlewareError::Subnetwork { subnetwork, source })
    }

    pub fn pause_subnetwork(
        &mut self,
        now: Timestamp,
        subnetwork: SubnetworkId,
    ) -> MiddlewareResult<()> {
        self.subnetworks
            .pause(now, subnetwork)
            .map_err(|source| MiddlewareError::Subnetwork { subnetwork, source })
    }

    pub fn unpause_subnetwork(
        &mut self,
        now: Timestamp,
        subnetwork: SubnetworkId,
    ) -> MiddlewareResult<()> {
        self.subnetworks
            .unpause(now, self.slashing_window, subnetwork)
            .map_err(|source| MiddlewareError::Subnetwork { subnetwork, source })
    }

    pub fn unregister_subnetwork(
        &mut self,
        now: Timestamp,
        subnetwork: SubnetworkId,
    ) -> MiddlewareResult<()> {
        self.subnetworks
            .unregister(now, self.slashing_window, subnetwork)
            .map_err(|source| MiddlewareError::Subnetwork { subnetwork, source })
    }

    pub fn can_unregister_subnetwork(&self, now: Timestamp, subnetwork: &SubnetworkId) -> bool {
        self.subnetworks
            .check_unregister(now, self.slashing_window, subnetwork)
    }

    pub fn active_subnetworks_at(&self, timestamp: Timestamp) -> Vec<SubnetworkId> {
        self.subnetworks.get_active(timestamp)
    }

    pub fn subnetwork_was_active_at(
        &self,
        timestamp: Timestamp,
        subnetwork: &SubnetworkId,
    ) -> bool {
        self.subnetworks.was_active_at(timestamp, subnetwork)
    }

    pub fn subnetworks_len(&self) -> usize {
        self.subnetworks.len()
    }

    /// Subnetwork and its window at a storage position.
    pub fn subnetwork_at(&self, pos: usize) -> Option<&Entry<SubnetworkId>> {
        self.subnetworks.at(pos)
    }

    // === SHARED VAULTS ===

    /// Whether `vault` is known in any role.
    pub fn is_vault_registered(&self, vault: &Address) -> bool {
        self.shared_vaults.contains(vault) || self.vault_operator.contains_key(vault)
    }

    pub fn register_shared_vault(
        &mut self,
        now: Timestamp,
        vault: Address,
    ) -> MiddlewareResult<()> {
        if self.is_vault_registered(&vault) {
            return Err(MiddlewareError::VaultAlreadyRegistered(vault));
        }
        self.shared_vaults
            .register(now, vault)
            .map_err(|source| MiddlewareError::SharedVault { vault, source })
    }

    pub fn pause_shared_vault(&mut self, now: Timestamp, vault: Address) -> MiddlewareResult<()> {
        self.shared_vaults
            .pause(now, vault)
            .map_err(|source| MiddlewareError::SharedVault { vault, source })
    }

    pub fn unpause_shared_vault(&mut self, now: Timestamp, vault: Address) -> MiddlewareResult<()> {
        self.shared_vaults
            .unpause(now, self.slashing_window, vault)
            .map_err(|source| MiddlewareError::SharedVault { vault, source })
    }

    pub fn unregister_shared_vault(
        &mut self,
        now: Timestamp,
        vault: Address,
    ) -> MiddlewareResult<()> {
        self.shared_vaults
            .unregister(now, self.slashing_window, vault)
            .map_err(|source| MiddlewareError::SharedVault { vault, source })
    }

    pub fn can_unregister_shared_vault(&self, now: Timestamp, vault: &Address) -> bool {
        self.shared_vaults
            .check_unregister(now, self.slashing_window, vault)
    }

    pub fn is_shared_vault(&self, vault: &Address) -> bool {
        self.shared_vaults.contains(vault)
    }

    pub fn shared_vaults_len(&self) -> usize {
        self.shared_vaults.len()
    }

    pub fn shared_vault_at(&self, pos: usize) -> Option<&Entry<Address>> {
        self.shared_vaults.at(pos)
    }

    pub fn active_shared_vaults_at(&self, timestamp: Timestamp) -> Vec<Address> {
        self.shared_vaults.get_active(timestamp)
    }

    // === OPERATOR VAULTS ===

    /// Bind `vault` to `operator` and open its window.
    pub fn register_operator_vault(
        &mut self,
        now: Timestamp,
        operator: Address,
        vault: Address,
    ) -> MiddlewareResult<()> {
        if self.is_vault_registered(&vault) {
            return Err(MiddlewareError::VaultAlreadyRegistered(vault));
        }

        let set = self.operator_vaults.entry(operator).or_default();
        set.register(now, vault)
            .map_err(|source| MiddlewareError::OperatorVault {
                operator,
                vault,
                source,
            })?;
        self.vault_operator.insert(vault, operator);
        Ok(())
    }

    pub fn pause_operator_vault(
        &mut self,
        now: Timestamp,
        operator: Address,
        vault: Address,
    ) -> MiddlewareResult<()> {
        self.operator_set_mut(operator, vault)?
            .pause(now, vault)
            .map_err(|source| MiddlewareError::OperatorVault {
                operator,
                vault,
                source,
            })
    }

    pub fn unpause_operator_vault(
        &mut self,
        now: Timestamp,
        operator: Address,
        vault: Address,
    ) -> MiddlewareResult<()> {
        let cool_down = self.slashing_window;
        self.operator_set_mut(operator, vault)?
            .unpause(now, cool_down, vault)
            .map_err(|source| MiddlewareError::OperatorVault {
                operator,
                vault,
                source,
            })
    }

    /// Remove `vault` from `operator` and release the binding.
    pub fn unregister_operator_vault(
        &mut self,
        now: Timestamp,
        operator: Address,
        vault: Address,
    ) -> MiddlewareResult<()> {
        let cool_down = self.slashing_window;
        let set = self.operator_set_mut(operator, vault)?;
        set.unregister(now, cool_down, vault)
            .map_err(|source| MiddlewareError::OperatorVault {
                operator,
                vault,
                source,
            })?;

        if set.is_empty() {
            self.operator_vaults.remove(&operator);
        }
        self.vault_operator.remove(&vault);
        Ok(())
    }

    pub fn can_unregister_operator_vault(
        &self,
        now: Timestamp,
        operator: &Address,
        vault: &Address,
    ) -> bool {
        self.operator_vaults
            .get(operator)
            .map_or(false, |set| set.check_unregister(now, self.slashing_window, vault))
    }

    /// Operator bound to an exclusive vault.
    pub fn vault_operator(&self, vault: &Address) -> Option<Address> {
        self.vault_operator.get(vault).copied()
    }

    /// Whether `vault` is one of `operator`'s exclusive vaults.
    pub fn operator_vault_set_contains(&self, operator: &Address, vault: &Address) -> bool {
        self.operator_vaults
            .get(operator)
            .map_or(false, |set| set.contains(vault))
    }

    pub fn operator_vaults_len(&self, operator: &Address) -> usize {
        self.operator_vaults.get(operator).map_or(0, WindowedSet::len)
    }

    pub fn operator_vault_at(&self, operator: &Address, pos: usize) -> Option<&Entry<Address>> {
        self.operator_vaults.get(operator).and_then(|set| set.at(pos))
    }

    /// Exclusive vaults of `operator` active at `timestamp`.
    pub fn active_exclusive_vaults_at(
        &self,
        timestamp: Timestamp,
        operator: &Address,
    ) -> Vec<Address> {
        self.operator_vaults
            .get(operator)
            .map(|set| set.get_active(timestamp))
            .unwrap_or_default()
    }

    // === CROSS-DOMAIN QUERIES ===

    /// Shared vaults active at `timestamp`, then every exclusive vault that is
    /// active at `timestamp` for its own operator.
    ///
    /// This mixes vaults available to anyone with vaults earmarked for one
    /// operator; use [`Self::active_operator_vaults_at`] for a per-operator view.
    pub fn active_vaults_at(&self, timestamp: Timestamp) -> Vec<Address> {
        let mut vaults = self.shared_vaults.get_active(timestamp);
        vaults.extend(
            self.vault_operator
                .iter()
                .filter(|&(vault, operator)| {
                    self.operator_vaults
                        .get(operator)
                        .map_or(false, |set| set.was_active_at(timestamp, vault))
                })
                .map(|(vault, _)| *vault),
        );
        vaults
    }

    /// Vaults usable by `operator` at `timestamp`: active shared vaults plus
    /// the operator's active exclusive vaults.
    pub fn active_operator_vaults_at(
        &self,
        timestamp: Timestamp,
        operator: &Address,
    ) -> Vec<Address> {
        let mut vaults = self.shared_vaults.get_active(timestamp);
        vaults.extend(self.active_exclusive_vaults_at(timestamp, operator));
        vaults
    }

    /// Whether `vault` is stored as shared or as one of `operator`'s vaults.
    pub fn is_operator_vault(&self, operator: &Address, vault: &Address) -> bool {
        self.shared_vaults.contains(vault) || self.operator_vault_set_contains(operator, vault)
    }

    /// Whether `vault` was usable by `operator` at `timestamp`.
    pub fn vault_was_active_at(
        &self,
        timestamp: Timestamp,
        operator: &Address,
        vault: &Address,
    ) -> bool {
        self.shared_vaults.was_active_at(timestamp, vault)
            || self
                .operator_vaults
                .get(operator)
                .map_or(false, |set| set.was_active_at(timestamp, vault))
    }

    /// Every operator with at least one stored exclusive vault.
    pub fn operators_with_vaults(&self) -> impl Iterator<Item = (&Address, &WindowedSet<Address>)> {
        self.operator_vaults.iter()
    }

    /// Every exclusive vault binding.
    pub fn vault_bindings(&self) -> impl Iterator<Item = (&Address, &Address)> {
        self.vault_operator.iter()
    }

    /// Shared vault entries in storage order.
    pub fn shared_vaults(&self) -> impl Iterator<Item = &Entry<Address>> {
        self.shared_vaults.iter()
    }

    /// Rebuild every set's lookup table (after deserialization)
    pub fn rebuild_indexes(&mut self) {
        self.subnetworks.rebuild_index();
        self.shared_vaults.rebuild_index();
        for set in self.operator_vaults.values_mut() {
            set.rebuild_index();
        }
    }

    /// No set holds a value twice and no operator keeps an empty set.
    pub fn has_unique_entries(&self) -> bool {
        self.subnetworks.has_unique_values()
            && self.shared_vaults.has_unique_values()
            && self
                .operator_vaults
                .values()
                .all(|set| !set.is_empty() && set.has_unique_values())
    }

    fn operator_set_mut(
        &mut self,
        operator: Address,
        vault: Address,
    ) -> MiddlewareResult<&mut WindowedSet<Address>> {
        self.operator_vaults
            .get_mut(&operator)
            .ok_or(MiddlewareError::OperatorVault {
                operator,
                vault,
                source: SetError::NotRegistered,
            })
    }
}
