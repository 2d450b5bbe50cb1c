//! Value objects for the middleware domain

use serde::{Deserialize, Serialize};
pub use shared_types::{Address, OperatorKey, SubnetworkId, Timestamp, U256, ZERO_ADDRESS};

/// Slasher `TYPE()` tag of an instant slasher.
pub const INSTANT_SLASHER_TYPE: u64 = 0;

/// Slasher `TYPE()` tag of a veto slasher.
pub const VETO_SLASHER_TYPE: u64 = 1;

/// Enable/disable window of a stored entry.
///
/// `disabled_at == None` means "not yet disabled" (open-ended).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub enabled_at: Timestamp,
    pub disabled_at: Option<Timestamp>,
}

impl Window {
    /// A fresh window opened at `now`.
    pub fn open(now: Timestamp) -> Self {
        Self {
            enabled_at: now,
            disabled_at: None,
        }
    }

    /// True while no disable is pending.
    pub fn is_enabled(&self) -> bool {
        self.disabled_at.is_none()
    }

    /// `enabled_at <= t < disabled_at`
    pub fn contains(&self, t: Timestamp) -> bool {
        self.enabled_at <= t && self.disabled_at.map_or(true, |disabled| t < disabled)
    }

    /// Earliest timestamp at which a disabled entry may be unpaused or removed.
    pub fn ready_at(&self, cool_down: u64) -> Option<Timestamp> {
        self.disabled_at
            .map(|disabled| disabled.saturating_add(cool_down))
    }

    /// Whether the entry is disabled and has cooled down for `cool_down` seconds.
    pub fn cooled_down(&self, now: Timestamp, cool_down: u64) -> bool {
        self.ready_at(cool_down).map_or(false, |ready| now >= ready)
    }
}

/// Slashing mechanism attached to a vault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlasherVariant {
    /// Slash executes immediately.
    Instant,
    /// Slash is requested, can be vetoed, and is executed later.
    Veto,
    /// Any other `TYPE()` tag.
    Unknown(u64),
}

impl SlasherVariant {
    pub fn from_type(tag: u64) -> Self {
        match tag {
            INSTANT_SLASHER_TYPE => Self::Instant,
            VETO_SLASHER_TYPE => Self::Veto,
            other => Self::Unknown(other),
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instant => "instant",
            Self::Veto => "veto",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Delegation scheme configured on a vault.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DelegatorKind {
    NetworkRestake,
    FullRestake,
    /// Stake is delegated to exactly one operator.
    OperatorSpecific { operator: Address },
    /// Stake is delegated to one operator inside one network.
    OperatorNetworkSpecific { operator: Address, network: Address },
}

impl DelegatorKind {
    /// The operator an operator-specific delegator is bound to.
    pub fn operator_specific_to(&self) -> Option<Address> {
        match self {
            Self::OperatorSpecific { operator } => Some(*operator),
            _ => None,
        }
    }
}

/// Result of a dispatched slash. The two variants are not interchangeable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashOutcome {
    /// Amount seized by an instant slasher.
    Slashed(U256),
    /// Index of the pending request on a veto slasher.
    Requested(u64),
}

/// Response of `slash_vault`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashResponse {
    pub vault: Address,
    pub slasher_variant: SlasherVariant,
    pub subnetwork: SubnetworkId,
    pub outcome: SlashOutcome,
}

impl SlashResponse {
    /// Slashed amount for instant slashes.
    pub fn slashed_amount(&self) -> Option<U256> {
        match self.outcome {
            SlashOutcome::Slashed(amount) => Some(amount),
            SlashOutcome::Requested(_) => None,
        }
    }

    /// Request index for veto slashes.
    pub fn request_index(&self) -> Option<u64> {
        match self.outcome {
            SlashOutcome::Requested(index) => Some(index),
            SlashOutcome::Slashed(_) => None,
        }
    }
}
