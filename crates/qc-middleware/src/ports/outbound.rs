//! Driven ports (Outbound dependencies)
//!
//! All calls are synchronous. A failure is reported as [`GatewayError`] and
//! aborts the calling operation before any registry state changes.

use crate::domain::{Address, DelegatorKind, GatewayError, SubnetworkId, Timestamp, U256};

/// Collateral vault registry and vault configuration.
pub trait CollateralGateway: Send + Sync {
    /// Whether `vault` is a vault known to the collateral registry.
    fn is_collateral_entity(&self, vault: &Address) -> Result<bool, GatewayError>;

    /// Whether the vault finished its initialization.
    fn is_initialized(&self, vault: &Address) -> Result<bool, GatewayError>;

    /// Vault epoch duration in seconds.
    fn epoch_duration(&self, vault: &Address) -> Result<u64, GatewayError>;

    /// Delegator attached to the vault.
    fn delegator(&self, vault: &Address) -> Result<Address, GatewayError>;

    /// Slasher attached to the vault, if any.
    fn slasher(&self, vault: &Address) -> Result<Option<Address>, GatewayError>;
}

/// Stake delegation of a vault.
pub trait DelegatorGateway: Send + Sync {
    fn delegator_kind(&self, delegator: &Address) -> Result<DelegatorKind, GatewayError>;

    /// Stake of `operator` in `subnetwork` at `timestamp`.
    ///
    /// `hints` is passed through unchanged.
    fn stake_at(
        &self,
        delegator: &Address,
        subnetwork: &SubnetworkId,
        operator: &Address,
        timestamp: Timestamp,
        hints: &[u8],
    ) -> Result<U256, GatewayError>;
}

/// Slashers attached to vaults.
pub trait SlasherGateway: Send + Sync {
    /// Raw `TYPE()` tag (0 instant, 1 veto).
    fn slasher_type(&self, slasher: &Address) -> Result<u64, GatewayError>;

    /// Veto period of a veto slasher in seconds.
    fn veto_duration(&self, slasher: &Address) -> Result<u64, GatewayError>;

    /// Instant slash; returns the amount actually seized.
    fn slash(
        &self,
        slasher: &Address,
        subnetwork: &SubnetworkId,
        operator: &Address,
        amount: U256,
        capture_timestamp: Timestamp,
        hints: &[u8],
    ) -> Result<U256, GatewayError>;

    /// Queue a vetoable slash; returns the request index.
    fn request_slash(
        &self,
        slasher: &Address,
        subnetwork: &SubnetworkId,
        operator: &Address,
        amount: U256,
        capture_timestamp: Timestamp,
        hints: &[u8],
    ) -> Result<u64, GatewayError>;

    /// Execute a queued request; returns the amount actually seized.
    fn execute_slash(
        &self,
        slasher: &Address,
        request_index: u64,
        hints: &[u8],
    ) -> Result<U256, GatewayError>;
}

/// Stake-to-power transform.
pub trait StakePowerPolicy: Send + Sync {
    fn stake_to_power(&self, vault: &Address, stake: U256) -> U256;
}

/// Source of the "now" timestamp
pub trait TimeSource: Send + Sync {
    /// Current unix timestamp in seconds
    fn now(&self) -> Timestamp;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}
