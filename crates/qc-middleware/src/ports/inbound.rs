//! Driving ports (Inbound API)

use crate::domain::{
    Address, MiddlewareResult, OperatorKey, SlashResponse, SubnetworkId, Timestamp, U256,
};

/// Primary middleware API
///
/// Mutations use the service's time source for "now" and either apply in
/// full or fail with no state change.
pub trait MiddlewareApi: Send + Sync {
    // === SUBNETWORKS ===

    fn register_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()>;

    fn pause_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()>;

    /// Fails until one slashing window has passed since the pause.
    fn unpause_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()>;

    /// Fails until one slashing window has passed since the pause.
    fn unregister_subnetwork(&self, subnetwork: SubnetworkId) -> MiddlewareResult<()>;

    // === SHARED VAULTS ===

    /// Validate `vault` against the collateral registry and register it as
    /// usable by every operator.
    fn register_shared_vault(&self, vault: Address) -> MiddlewareResult<()>;

    fn pause_shared_vault(&self, vault: Address) -> MiddlewareResult<()>;

    fn unpause_shared_vault(&self, vault: Address) -> MiddlewareResult<()>;

    fn unregister_shared_vault(&self, vault: Address) -> MiddlewareResult<()>;

    // === OPERATOR VAULTS ===

    /// Validate `vault` and bind it to `operator`. The vault's delegator must
    /// be operator-specific to `operator`.
    fn register_operator_vault(&self, operator: Address, vault: Address) -> MiddlewareResult<()>;

    fn pause_operator_vault(&self, operator: Address, vault: Address) -> MiddlewareResult<()>;

    fn unpause_operator_vault(&self, operator: Address, vault: Address) -> MiddlewareResult<()>;

    fn unregister_operator_vault(&self, operator: Address, vault: Address)
        -> MiddlewareResult<()>;

    // === SLASHING ===

    /// Slash `operator` through `vault` for misbehavior at `timestamp`.
    ///
    /// Instant slashers seize immediately; veto slashers queue a request.
    fn slash_vault(
        &self,
        timestamp: Timestamp,
        vault: Address,
        subnetwork: SubnetworkId,
        operator: Address,
        amount: U256,
        hints: &[u8],
    ) -> MiddlewareResult<SlashResponse>;

    /// Execute a queued veto slash; returns the amount seized.
    fn execute_slash(
        &self,
        vault: Address,
        request_index: u64,
        hints: &[u8],
    ) -> MiddlewareResult<U256>;

    // === KEYS ===

    /// Rotate the key of `operator`. [`OperatorKey::ZERO`] clears it.
    fn update_operator_key(&self, operator: Address, key: OperatorKey) -> MiddlewareResult<()>;

    /// Current key of `operator`, or [`OperatorKey::ZERO`].
    fn operator_key(&self, operator: &Address) -> OperatorKey;

    /// Owner of `key`, or the zero address.
    fn operator_by_key(&self, key: &OperatorKey) -> Address;

    fn key_was_active_at(&self, timestamp: Timestamp, key: &OperatorKey) -> bool;

    // === QUERIES ===

    fn active_subnetworks_at(&self, timestamp: Timestamp) -> Vec<SubnetworkId>;

    /// Active shared vaults plus every active exclusive vault.
    fn active_vaults_at(&self, timestamp: Timestamp) -> Vec<Address>;

    /// Active shared vaults plus the active exclusive vaults of `operator`.
    fn active_operator_vaults_at(&self, timestamp: Timestamp, operator: &Address)
        -> Vec<Address>;

    /// Power of `operator` summed over its active vaults and the active
    /// subnetworks at `timestamp`.
    fn operator_power_at(&self, operator: &Address, timestamp: Timestamp)
        -> MiddlewareResult<U256>;

    /// Sum of [`Self::operator_power_at`] over `operators`.
    fn total_power_at(&self, operators: &[Address], timestamp: Timestamp)
        -> MiddlewareResult<U256>;
}
