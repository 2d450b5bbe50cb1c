//! # Key Rotation Registry
//!
//! One [`WindowedSet`] of keys per operator plus a global `key -> operator`
//! map. A key stays globally reserved while it is stored, active or cooling,
//! and is released only when it is physically removed.
//!
//! ## Rotation
//!
//! ```text
//! update_key(op, K)
//!   1. remove every stored key of `op` whose cool-down has elapsed
//!   2. pause the key of `op` that is still enabled
//!   3. K == ZERO -> done ("clear key")
//!   4. more than MAX_DISABLED_KEYS entries left -> MaxDisabledKeysReached
//!   5. K mapped to any operator -> DuplicateKey
//!   6. register K, map K -> op
//! ```
//!
//! Steps run on a copy of the operator's set; nothing is committed unless
//! every step succeeds.

use super::errors::{MiddlewareError, MiddlewareResult};
use super::value_objects::{Address, OperatorKey, Timestamp, ZERO_ADDRESS};
use super::windowed_set::WindowedSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Cooling keys an operator may hold while registering a new one.
pub const MAX_DISABLED_KEYS: usize = 1;

/// What a successful rotation did, for logging.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyRotation {
    /// Keys physically removed (now free for anyone).
    pub released: Vec<OperatorKey>,
    /// Previously enabled key, now cooling.
    pub paused: Option<OperatorKey>,
    /// Newly registered key, `None` when clearing.
    pub registered: Option<OperatorKey>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyRegistry {
    slashing_window: u64,
    keys: HashMap<Address, WindowedSet<OperatorKey>>,
    key_to_operator: HashMap<OperatorKey, Address>,
}

impl KeyRegistry {
    pub fn new(slashing_window: u64) -> Self {
        Self {
            slashing_window,
            keys: HashMap::new(),
            key_to_operator: HashMap::new(),
        }
    }

    pub fn slashing_window(&self) -> u64 {
        self.slashing_window
    }

    /// Rotate the key of `operator` to `key`, or clear it when `key` is zero.
    pub fn update_key(
        &mut self,
        now: Timestamp,
        operator: Address,
        key: OperatorKey,
    ) -> MiddlewareResult<KeyRotation> {
        let mut set = self.keys.get(&operator).cloned().unwrap_or_default();
        let mut rotation = KeyRotation::default();
        let key_error = |source| MiddlewareError::Key { operator, source };

        let expired: Vec<OperatorKey> = set
            .iter()
            .filter(|entry| entry.window.cooled_down(now, self.slashing_window))
            .map(|entry| entry.value)
            .collect();
        for old in expired {
            set.unregister(now, self.slashing_window, old)
                .map_err(key_error)?;
            rotation.released.push(old);
        }

        let enabled = set
            .iter()
            .find(|entry| entry.window.is_enabled())
            .map(|entry| entry.value);
        if let Some(current) = enabled {
            set.pause(now, current).map_err(key_error)?;
            rotation.paused = Some(current);
        }

        if !key.is_zero() {
            if set.len() > MAX_DISABLED_KEYS {
                return Err(MiddlewareError::MaxDisabledKeysReached(operator));
            }
            if self.is_reserved_by_other(&key, &rotation.released) {
                return Err(MiddlewareError::DuplicateKey(key));
            }
            set.register(now, key).map_err(key_error)?;
            rotation.registered = Some(key);
        }

        // Commit
        for old in &rotation.released {
            self.key_to_operator.remove(old);
        }
        if let Some(new_key) = rotation.registered {
            self.key_to_operator.insert(new_key, operator);
        }
        if set.is_empty() {
            self.keys.remove(&operator);
        } else {
            self.keys.insert(operator, set);
        }

        Ok(rotation)
    }

    /// Key of `operator` active at `now`, or [`OperatorKey::ZERO`].
    pub fn operator_key(&self, now: Timestamp, operator: &Address) -> OperatorKey {
        self.keys
            .get(operator)
            .and_then(|set| set.get_active(now).first().copied())
            .unwrap_or(OperatorKey::ZERO)
    }

    /// Operator owning `key`, or [`ZERO_ADDRESS`] when unmapped.
    pub fn operator_by_key(&self, key: &OperatorKey) -> Address {
        self.key_to_operator
            .get(key)
            .copied()
            .unwrap_or(ZERO_ADDRESS)
    }

    /// Whether `key` was active for its owner at `timestamp`.
    pub fn key_was_active_at(&self, timestamp: Timestamp, key: &OperatorKey) -> bool {
        self.key_to_operator
            .get(key)
            .and_then(|operator| self.keys.get(operator))
            .map_or(false, |set| set.was_active_at(timestamp, key))
    }

    /// Stored keys of `operator`, cooling ones included.
    pub fn key_count(&self, operator: &Address) -> usize {
        self.keys.get(operator).map_or(0, WindowedSet::len)
    }

    pub fn operator_keys(&self, operator: &Address) -> Option<&WindowedSet<OperatorKey>> {
        self.keys.get(operator)
    }

    /// Every `(key, operator)` mapping.
    pub fn key_owners(&self) -> impl Iterator<Item = (&OperatorKey, &Address)> {
        self.key_to_operator.iter()
    }

    pub fn operators(&self) -> impl Iterator<Item = (&Address, &WindowedSet<OperatorKey>)> {
        self.keys.iter()
    }

    /// Rebuild every set's lookup table (after deserialization)
    pub fn rebuild_indexes(&mut self) {
        for set in self.keys.values_mut() {
            set.rebuild_index();
        }
    }

    /// No operator holds a key twice or keeps an empty set.
    pub fn has_unique_entries(&self) -> bool {
        self.keys
            .values()
            .all(|set| !set.is_empty() && set.has_unique_values())
    }

    // Keys released in the same rotation are free again.
    fn is_reserved_by_other(&self, key: &OperatorKey, released: &[OperatorKey]) -> bool {
        self.key_to_operator.contains_key(key) && !released.contains(key)
    }
}
