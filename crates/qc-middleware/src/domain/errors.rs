//! Error types for the middleware
//!
//! Every failure aborts the triggering operation with no state change.

use super::value_objects::{Address, OperatorKey, SubnetworkId, Timestamp};
use thiserror::Error;

/// Failures of a single windowed-set transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetError {
    #[error("Entry already registered")]
    AlreadyRegistered,

    #[error("Entry not registered")]
    NotRegistered,

    /// Pause of an entry that already has a pending disable.
    #[error("Entry already disabled at {disabled_at}")]
    AlreadyDisabled { disabled_at: Timestamp },

    /// Unpause or unregister of an entry that is still enabled.
    #[error("Entry is still enabled")]
    NotDisabled,

    #[error("Cool-down not elapsed: disabled at {disabled_at}, ready at {ready_at}")]
    CoolDownNotElapsed {
        disabled_at: Timestamp,
        ready_at: Timestamp,
    },
}

impl SetError {
    /// True for failures that resolve by themselves once time passes.
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::CoolDownNotElapsed { .. })
    }
}

/// Failures reported by an external collaborator (vault, delegator, slasher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid collaborator response: {0}")]
    InvalidResponse(String),

    #[error("Collaborator rejected call: {0}")]
    Rejected(String),
}

/// Coarse classification so callers can tell "try again later" apart from
/// "permanently invalid".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Entity unknown, not initialized, already registered, wrong kind.
    Precondition,
    /// Cool-down not elapsed, stale timestamp, epoch too short.
    Temporal,
    /// Missing or unknown slasher, collaborator failure.
    Collaborator,
}

/// Middleware error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MiddlewareError {
    #[error("Subnetwork {subnetwork}: {source}")]
    Subnetwork {
        subnetwork: SubnetworkId,
        source: SetError,
    },

    #[error("Shared vault {vault:?}: {source}")]
    SharedVault { vault: Address, source: SetError },

    #[error("Vault {vault:?} of operator {operator:?}: {source}")]
    OperatorVault {
        operator: Address,
        vault: Address,
        source: SetError,
    },

    #[error("Key of operator {operator:?}: {source}")]
    Key { operator: Address, source: SetError },

    #[error("Not a registered collateral vault: {0:?}")]
    NotVault(Address),

    #[error("Vault not initialized: {0:?}")]
    VaultNotInitialized(Address),

    #[error("Vault already registered: {0:?}")]
    VaultAlreadyRegistered(Address),

    #[error(
        "Vault epoch too short: epoch {epoch_duration}s - veto {veto_duration}s < window {slashing_window}s"
    )]
    VaultEpochTooShort {
        epoch_duration: u64,
        veto_duration: u64,
        slashing_window: u64,
    },

    #[error("Vault {vault:?} is not operator-specific to {operator:?}")]
    NotOperatorSpecificVault { operator: Address, vault: Address },

    #[error("Vault {vault:?} is not usable by operator {operator:?}")]
    NotOperatorVault { operator: Address, vault: Address },

    #[error("Vault {vault:?} was not active for operator {operator:?} at {timestamp}")]
    InactiveVaultSlash {
        operator: Address,
        vault: Address,
        timestamp: Timestamp,
    },

    #[error("Slash timestamp too old: {timestamp} + window {slashing_window}s < now {now}")]
    TooOldTimestampSlash {
        timestamp: Timestamp,
        slashing_window: u64,
        now: Timestamp,
    },

    #[error("Vault has no slasher: {0:?}")]
    NoSlasher(Address),

    #[error("Unknown slasher type: {0}")]
    UnknownSlasherType(u64),

    #[error("Slasher of vault {0:?} is not a veto slasher")]
    NonVetoSlasher(Address),

    #[error("Key already in use: {0}")]
    DuplicateKey(OperatorKey),

    #[error("Operator {0:?} already has a cooling key")]
    MaxDisabledKeysReached(Address),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Collateral gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl MiddlewareError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Subnetwork { source, .. }
            | Self::SharedVault { source, .. }
            | Self::OperatorVault { source, .. }
            | Self::Key { source, .. } => {
                if source.is_temporal() {
                    ErrorKind::Temporal
                } else {
                    ErrorKind::Precondition
                }
            }
            Self::TooOldTimestampSlash { .. }
            | Self::VaultEpochTooShort { .. }
            | Self::MaxDisabledKeysReached(_) => ErrorKind::Temporal,
            Self::NoSlasher(_)
            | Self::UnknownSlasherType(_)
            | Self::NonVetoSlasher(_)
            | Self::Gateway(_) => ErrorKind::Collaborator,
            _ => ErrorKind::Precondition,
        }
    }

    /// Whether the same call can succeed later without any other change.
    ///
    /// A stale slash timestamp only gets staler and a short vault epoch is a
    /// property of the vault, so neither is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Subnetwork { source, .. }
            | Self::SharedVault { source, .. }
            | Self::OperatorVault { source, .. }
            | Self::Key { source, .. } => source.is_temporal(),
            Self::MaxDisabledKeysReached(_) => true,
            _ => false,
        }
    }

    /// Short label used in logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Subnetwork { .. } => "subnetwork",
            Self::SharedVault { .. } => "shared_vault",
            Self::OperatorVault { .. } => "operator_vault",
            Self::Key { .. } => "key",
            Self::NotVault(_) => "not_vault",
            Self::VaultNotInitialized(_) => "vault_not_initialized",
            Self::VaultAlreadyRegistered(_) => "vault_already_registered",
            Self::VaultEpochTooShort { .. } => "vault_epoch_too_short",
            Self::NotOperatorSpecificVault { .. } => "not_operator_specific_vault",
            Self::NotOperatorVault { .. } => "not_operator_vault",
            Self::InactiveVaultSlash { .. } => "inactive_vault_slash",
            Self::TooOldTimestampSlash { .. } => "too_old_timestamp_slash",
            Self::NoSlasher(_) => "no_slasher",
            Self::UnknownSlasherType(_) => "unknown_slasher_type",
            Self::NonVetoSlasher(_) => "non_veto_slasher",
            Self::DuplicateKey(_) => "duplicate_key",
            Self::MaxDisabledKeysReached(_) => "max_disabled_keys_reached",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Gateway(_) => "gateway",
        }
    }
}

/// Result type for middleware operations
pub type MiddlewareResult<T> = Result<T, MiddlewareError>;
