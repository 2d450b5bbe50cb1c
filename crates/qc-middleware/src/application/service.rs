//! Middleware Service - registry mutations and queries
//!
//! Every mutation takes the write lock of the registry it changes, runs all
//! collaborator reads and validations under that lock, and mutates only after
//! every check has passed.

use super::state::{MiddlewareSnapshot, MiddlewareState};
use crate::config::MiddlewareConfig;
use crate::domain::{
    invariant_key_bounds, invariant_key_uniqueness, invariant_vault_exclusivity,
    invariant_vault_reverse_map, Address, Entry, MembershipRegistry, MiddlewareError,
    MiddlewareResult, OperatorKey, SlashResponse, SlasherVariant, SubnetworkId, Timestamp, U256,
};
use crate::metrics;
use crate::ports::{
    CollateralGateway, DelegatorGateway, MiddlewareApi, SlasherGateway, StakePowerPolicy,
    SystemTimeSource, TimeSource,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Which role a vault is registered in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VaultRole {
    Shared,
    /// Bound to one operator.
    Exclusive(Address),
}

/// Middleware Service
pub struct MiddlewareService<C, D, S, P>
where
    C: CollateralGateway,
    D: DelegatorGateway,
    S: SlasherGateway,
    P: StakePowerPolicy,
{
    pub(super) collateral: Arc<C>,
    pub(super) delegators: Arc<D>,
    pub(super) slashers: Arc<S>,
    pub(super) policy: Arc<P>,
    pub(super) state: MiddlewareState,
    pub(super) config: MiddlewareConfig,
    time_source: Box<dyn TimeSource>,
}

/// Dependencies for MiddlewareService
pub struct MiddlewareDependencies<C, D, S, P> {
    pub collateral: Arc<C>,
    pub delegators: Arc<D>,
    pub slashers: Arc<S>,
    pub policy: Arc<P>,
    pub config: MiddlewareConfig,
}

impl<C, D, S, P> MiddlewareService<C, D, S, P>
where
    C: CollateralGateway,
    D: DelegatorGateway,
    S: SlasherGateway,
    P: StakePowerPolicy,
{
    /// Create a new MiddlewareService with empty registries
    pub fn new(deps: MiddlewareDependencies<C, D, S, P>) -> MiddlewareResult<Self> {
        deps.config.validate()?;
        let state = MiddlewareState::new(deps.config.slashing_window);
        Ok(Self::with_state(deps, state))
    }

    /// Restore a service from an exported snapshot.
    pub fn from_snapshot(
        deps: MiddlewareDependencies<C, D, S, P>,
        snapshot: MiddlewareSnapshot,
    ) -> MiddlewareResult<Self> {
        deps.config.validate()?;
        let window = deps.config.slashing_window;
        if snapshot.membership.slashing_window() != window
            || snapshot.keys.slashing_window() != window
        {
            return Err(MiddlewareError::InvalidConfig(format!(
                "snapshot slashing window does not match configured {}s",
                window
            )));
        }
        let state = MiddlewareState::from_snapshot(snapshot)?;
        Ok(Self::with_state(deps, state))
    }

    fn with_state(deps: MiddlewareDependencies<C, D, S, P>, state: MiddlewareState) -> Self {
        Self {
            collateral: deps.collateral,
            delegators: deps.delegators,
            slashers: deps.slashers,
            policy: deps.policy,
            state,
            config: deps.config,
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Set custom time source (capture timestamps, tests)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn config(&self) -> &MiddlewareConfig {
        &self.config
    }

    pub fn slashing_window(&self) -> u64 {
        self.config.slashing_window
    }

    /// Current timestamp from the time source.
    pub fn now(&self) -> Timestamp {
        self.time_source.now()
    }

    /// Consistent export of both registries.
    pub fn snapshot(&self) -> MiddlewareSnapshot {
        self.state.snapshot()
    }

    // === VALIDATION ===

    /// Check `vault` against the collateral registry before registration.
    fn validate_vault(
        &self,
        registry: &MembershipRegistry,
        vault: Address,
        role: VaultRole,
    ) -> MiddlewareResult<()> {
        if !self.collateral.is_collateral_entity(&vault)? {
            return Err(MiddlewareError::NotVault(vault));
        }
        if !self.collateral.is_initialized(&vault)? {
            return Err(MiddlewareError::VaultNotInitialized(vault));
        }
        if registry.is_vault_registered(&vault) {
            return Err(MiddlewareError::VaultAlreadyRegistered(vault));
        }

        self.validate_vault_epoch(vault)?;

        if let VaultRole::Exclusive(operator) = role {
            let delegator = self.collateral.delegator(&vault)?;
            let kind = self.delegators.delegator_kind(&delegator)?;
            if kind.operator_specific_to() != Some(operator) {
                return Err(MiddlewareError::NotOperatorSpecificVault { operator, vault });
            }
        }

        Ok(())
    }

    /// The vault epoch, minus the veto period of a veto slasher, must cover
    /// the slashing window. A veto period longer than the epoch never does.
    fn validate_vault_epoch(&self, vault: Address) -> MiddlewareResult<()> {
        let epoch_duration = self.collateral.epoch_duration(&vault)?;
        let mut veto_duration = 0;
        if let Some(slasher) = self.collateral.slasher(&vault)? {
            if self.slasher_variant(&slasher)? == SlasherVariant::Veto {
                veto_duration = self.slashers.veto_duration(&slasher)?;
            }
        }

        let slashing_window = self.config.slashing_window;
        let covered = epoch_duration
            .checked_sub(veto_duration)
            .map_or(false, |usable| usable >= slashing_window);
        if !covered {
            return Err(MiddlewareError::VaultEpochTooShort {
                epoch_duration,
                veto_duration,
                slashing_window,
            });
        }
        Ok(())
    }

    pub(super) fn slasher_variant(&self, slasher: &Address) -> MiddlewareResult<SlasherVariant> {
        Ok(SlasherVariant::from_type(self.slashers.slasher_type(slasher)?))
    }

    // === MEMBERSHIP TRANSITIONS ===

    /// Run one membership transition under the write lock and record it.
    fn transition<F>(
        &self,
        domain: &'static str,
        action: &'static str,
        apply: F,
    ) -> MiddlewareResult<()>
    where
        F: FnOnce(&mut MembershipRegistry, Timestamp) -> MiddlewareResult<()>,
    {
        let mut registry = self.state.membership.write();
        let now = self.now();

        match apply(&mut *registry, now) {
            Ok(()) => {
                debug_assert!(invariant_vault_exclusivity(&registry));
                debug_assert!(invariant_vault_reverse_map(&registry));
                debug!(domain, action, now, "Membership transition applied");
                metrics::record_transition(domain, action);
                Ok(())
            }
            Err(err) => {
                warn!(
                    domain,
                    action,
                    reason = err.reason(),
                    "Membership transition rejected: {}",
                    err
                );
                Err(err)
            }
        }
    }

    pub fn register_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()> {
        self.transition("subnetwork", "register", |registry, now| {
            registry.register_subnetwork(now, subnetwork)?;
            info!(%subnetwork, now, "Subnetwork registered");
            Ok(())
        })
    }

    pub fn pause_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()> {
        self.transition("subnetwork", "pause", |registry, now| {
            registry.pause_subnetwork(now, subnetwork)?;
            info!(%subnetwork, now, "Subnetwork paused");
            Ok(())
        })
    }

    pub fn unpause_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()> {
        self.transition("subnetwork", "unpause", |registry, now| {
            registry.unpause_subnetwork(now, subnetwork)?;
            info!(%subnetwork, now, "Subnetwork unpaused");
            Ok(())
        })
    }

    pub fn unregister_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()> {
        self.transition("subnetwork", "unregister", |registry, now| {
            registry.unregister_subnetwork(now, subnetwork)?;
            info!(%subnetwork, now, "Subnetwork unregistered");
            Ok(())
        })
    }

    pub fn register_shared_vault(&self, vault: Address) -> MiddlewareResult<()> {
        self.transition("shared_vault", "register", |registry, now| {
            self.validate_vault(registry, vault, VaultRole::Shared)?;
            registry.register_shared_vault(now, vault)?;
            info!(?vault, now, "Shared vault registered");
            Ok(())
        })
    }

    pub fn pause_shared_vault(&self, vault: Address) -> MiddlewareResult<()> {
        self.transition("shared_vault", "pause", |registry, now| {
            registry.pause_shared_vault(now, vault)?;
            info!(?vault, now, "Shared vault paused");
            Ok(())
        })
    }

    pub fn unpause_shared_vault(&self, vault: Address) -> MiddlewareResult<()> {
        self.transition("shared_vault", "unpause", |registry, now| {
            registry.unpause_shared_vault(now, vault)?;
            info!(?vault, now, "Shared vault unpaused");
            Ok(())
        })
    }

    pub fn unregister_shared_vault(&self, vault: Address) -> MiddlewareResult<()> {
        self.transition("shared_vault", "unregister", |registry, now| {
            registry.unregister_shared_vault(now, vault)?;
            info!(?vault, now, "Shared vault unregistered");
            Ok(())
        })
    }

    pub fn register_operator_vault(
        &self,
        operator: Address,
        vault: Address,
    ) -> MiddlewareResult<()> {
        self.transition("operator_vault", "register", |registry, now| {
            self.validate_vault(registry, vault, VaultRole::Exclusive(operator))?;
            registry.register_operator_vault(now, operator, vault)?;
            info!(?operator, ?vault, now, "Operator vault registered");
            Ok(())
        })
    }

    pub fn pause_operator_vault(&self, operator: Address, vault: Address) -> MiddlewareResult<()> {
        self.transition("operator_vault", "pause", |registry, now| {
            registry.pause_operator_vault(now, operator, vault)?;
            info!(?operator, ?vault, now, "Operator vault paused");
            Ok(())
        })
    }

    pub fn unpause_operator_vault(
        &self,
        operator: Address,
        vault: Address,
    ) -> MiddlewareResult<()> {
        self.transition("operator_vault", "unpause", |registry, now| {
            registry.unpause_operator_vault(now, operator, vault)?;
            info!(?operator, ?vault, now, "Operator vault unpaused");
            Ok(())
        })
    }

    pub fn unregister_operator_vault(
        &self,
        operator: Address,
        vault: Address,
    ) -> MiddlewareResult<()> {
        self.transition("operator_vault", "unregister", |registry, now| {
            registry.unregister_operator_vault(now, operator, vault)?;
            info!(?operator, ?vault, now, "Operator vault unregistered");
            Ok(())
        })
    }

    // === MEMBERSHIP QUERIES ===

    pub fn active_subnetworks_at(&self, timestamp: Timestamp) -> Vec<SubnetworkId> {
        self.state.membership.read().active_subnetworks_at(timestamp)
    }

    pub fn active_subnetworks(&self) -> Vec<SubnetworkId> {
        self.active_subnetworks_at(self.now())
    }

    pub fn subnetwork_was_active_at(
        &self,
        timestamp: Timestamp,
        subnetwork: &SubnetworkId,
    ) -> bool {
        self.state
            .membership
            .read()
            .subnetwork_was_active_at(timestamp, subnetwork)
    }

    pub fn active_vaults_at(&self, timestamp: Timestamp) -> Vec<Address> {
        self.state.membership.read().active_vaults_at(timestamp)
    }

    pub fn active_vaults(&self) -> Vec<Address> {
        self.active_vaults_at(self.now())
    }

    pub fn active_operator_vaults_at(
        &self,
        timestamp: Timestamp,
        operator: &Address,
    ) -> Vec<Address> {
        self.state
            .membership
            .read()
            .active_operator_vaults_at(timestamp, operator)
    }

    pub fn active_operator_vaults(&self, operator: &Address) -> Vec<Address> {
        self.active_operator_vaults_at(self.now(), operator)
    }

    pub fn vault_was_active_at(
        &self,
        timestamp: Timestamp,
        operator: &Address,
        vault: &Address,
    ) -> bool {
        self.state
            .membership
            .read()
            .vault_was_active_at(timestamp, operator, vault)
    }

    pub fn is_operator_vault(&self, operator: &Address, vault: &Address) -> bool {
        self.state.membership.read().is_operator_vault(operator, vault)
    }

    /// Role `vault` is registered in, if any.
    pub fn vault_role(&self, vault: &Address) -> Option<VaultRole> {
        let registry = self.state.membership.read();
        if registry.is_shared_vault(vault) {
            Some(VaultRole::Shared)
        } else {
            registry.vault_operator(vault).map(VaultRole::Exclusive)
        }
    }

    pub fn subnetworks_len(&self) -> usize {
        self.state.membership.read().subnetworks_len()
    }

    /// Subnetwork with its window at a storage position.
    pub fn subnetwork_with_times_at(&self, pos: usize) -> Option<Entry<SubnetworkId>> {
        self.state.membership.read().subnetwork_at(pos).copied()
    }

    pub fn shared_vaults_len(&self) -> usize {
        self.state.membership.read().shared_vaults_len()
    }

    pub fn shared_vault_with_times_at(&self, pos: usize) -> Option<Entry<Address>> {
        self.state.membership.read().shared_vault_at(pos).copied()
    }

    pub fn operator_vaults_len(&self, operator: &Address) -> usize {
        self.state.membership.read().operator_vaults_len(operator)
    }

    pub fn operator_vault_with_times_at(
        &self,
        operator: &Address,
        pos: usize,
    ) -> Option<Entry<Address>> {
        self.state
            .membership
            .read()
            .operator_vault_at(operator, pos)
            .copied()
    }

    // === KEYS ===

    pub fn update_operator_key(&self, operator: Address, key: OperatorKey) -> MiddlewareResult<()> {
        let mut keys = self.state.keys.write();
        let now = self.now();

        match keys.update_key(now, operator, key) {
            Ok(rotation) => {
                debug_assert!(invariant_key_bounds(&keys));
                debug_assert!(invariant_key_uniqueness(&keys));
                info!(
                    ?operator,
                    now,
                    released = rotation.released.len(),
                    paused = ?rotation.paused,
                    registered = ?rotation.registered,
                    "Operator key updated"
                );
                metrics::record_key_rotation();
                Ok(())
            }
            Err(err) => {
                warn!(?operator, reason = err.reason(), "Key update rejected: {}", err);
                Err(err)
            }
        }
    }

    pub fn operator_key(&self, operator: &Address) -> OperatorKey {
        self.operator_key_at(operator, self.now())
    }

    /// Key of `operator` active at `timestamp`.
    pub fn operator_key_at(&self, operator: &Address, timestamp: Timestamp) -> OperatorKey {
        self.state.keys.read().operator_key(timestamp, operator)
    }

    pub fn operator_by_key(&self, key: &OperatorKey) -> Address {
        self.state.keys.read().operator_by_key(key)
    }

    pub fn key_was_active_at(&self, timestamp: Timestamp, key: &OperatorKey) -> bool {
        self.state.keys.read().key_was_active_at(timestamp, key)
    }

    /// Stored keys of `operator`, cooling ones included.
    pub fn key_count(&self, operator: &Address) -> usize {
        self.state.keys.read().key_count(operator)
    }
}

impl<C, D, S, P> MiddlewareApi for MiddlewareService<C, D, S, P>
where
    C: CollateralGateway,
    D: DelegatorGateway,
    S: SlasherGateway,
    P: StakePowerPolicy,
{
    fn register_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()> {
        MiddlewareService::register_subnetwork(self, subnetwork)
    }

    fn pause_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()> {
        MiddlewareService::pause_subnetwork(self, subnetwork)
    }

    fn unpause_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()> {
        MiddlewareService::unpause_subnetwork(self, subnetwork)
    }

    fn unregister_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()> {
        MiddlewareService::unregister_subnetwork(self, subnetwork)
    }

    fn register_shared_vault(&self, vault: Address) -> MiddlewareResult<()> {
        MiddlewareService::register_shared_vault(self, vault)
    }

    fn pause_shared_vault(&self, vault: Address) -> MiddlewareResult<()> {
        MiddlewareService::pause_shared_vault(self, vault)
    }

    fn unpause_shared_vault(&self, vault: Address) -> MiddlewareResult<()> {
        MiddlewareService::unpause_shared_vault(self, vault)
    }

    fn unregister_shared_vault(&self, vault: Address) -> MiddlewareResult<()> {
        MiddlewareService::unregister_shared_vault(self, vault)
    }

    fn register_operator_vault(&self, operator: Address, vault: Address) -> MiddlewareResult<()> {
        MiddlewareService::register_operator_vault(self, operator, vault)
    }

    fn pause_operator_vault(&self, operator: Address, vault: Address) -> MiddlewareResult<()> {
        MiddlewareService::pause_operator_vault(self, operator, vault)
    }

    fn unpause_operator_vault(&self, operator: Address, vault: Address) -> MiddlewareResult<()> {
        MiddlewareService::unpause_operator_vault(self, operator, vault)
    }

    fn unregister_operator_vault(&self, operator: Address, vault: Address) -> MiddlewareResult<()> {
        MiddlewareService::unregister_operator_vault(self, operator, vault)
    }

    fn slash_vault(
        &self,
        timestamp: Timestamp,
        vault: Address,
        subnetwork: SubnetworkId,
        operator: Address,
        amount: U256,
        hints: &[u8],
    ) -> MiddlewareResult<SlashResponse> {
        MiddlewareService::slash_vault(self, timestamp, vault, subnetwork, operator, amount, hints)
    }

    fn execute_slash(
        &self,
        vault: Address,
        request_index: u64,
        hints: &[u8],
    ) -> MiddlewareResult<U256> {
        MiddlewareService::execute_slash(self, vault, request_index, hints)
    }

    fn update_operator_key(&self, operator: Address, key: OperatorKey) -> MiddlewareResult<()> {
        MiddlewareService::update_operator_key(self, operator, key)
    }

    fn operator_key(&self, operator: &Address) -> OperatorKey {
        MiddlewareService::operator_key(self, operator)
    }

    fn operator_by_key(&self, key: &OperatorKey) -> Address {
        MiddlewareService::operator_by_key(self, key)
    }

    fn key_was_active_at(&self, timestamp: Timestamp, key: &OperatorKey) -> bool {
        MiddlewareService::key_was_active_at(self, timestamp, key)
    }

    fn active_subnetworks_at(&self, timestamp: Timestamp) -> Vec<SubnetworkId> {
        MiddlewareService::active_subnetworks_at(self, timestamp)
    }

    fn active_vaults_at(&self, timestamp: Timestamp) -> Vec<Address> {
        MiddlewareService::active_vaults_at(self, timestamp)
    }

    fn active_operator_vaults_at(&self, timestamp: Timestamp, operator: &Address) -> Vec<Address> {
        MiddlewareService::active_operator_vaults_at(self, timestamp, operator)
    }

    fn operator_power_at(
        &self,
        operator: &Address,
        timestamp: Timestamp,
    ) -> MiddlewareResult<U256> {
        MiddlewareService::operator_power_at(self, operator, timestamp)
    }

    fn total_power_at(
        &self,
        operators: &[Address],
        timestamp: Timestamp,
    ) -> MiddlewareResult<U256> {
        MiddlewareService::total_power_at(self, operators, timestamp)
    }
}
