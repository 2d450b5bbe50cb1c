//! # Windowed Set
//!
//! Ordered set of unique values, each carrying one enable/disable window.
//!
//! ## Lifecycle
//!
//! ```text
//! register ──→ [enabled] ──pause──→ [disabled] ──unregister──→ removed
//!                  ↑                    │
//!                  └──────unpause───────┘
//! ```
//!
//! Only the current window is stored. Once an entry is unregistered its
//! history is gone, so a disabled entry must stay stored for at least one
//! cool-down period for past-activity queries to keep answering.
//!
//! ## Storage
//!
//! Entries live in a `Vec` in insertion order; removal swaps the last entry
//! into the freed slot. A `value -> position` index gives O(1) lookup and
//! removal.

use super::errors::SetError;
use super::value_objects::{Timestamp, Window};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;

/// A stored value together with its window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<V> {
    pub value: V,
    pub window: Window,
}

/// Set of values with enable/disable windows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WindowedSet<V>
where
    V: Copy + Eq + Hash,
{
    entries: Vec<Entry<V>>,
    /// Quick lookup by value
    #[serde(skip)]
    index: HashMap<V, usize>,
}

impl<V> Default for WindowedSet<V>
where
    V: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<V> WindowedSet<V>
where
    V: Copy + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, enabled or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, value: &V) -> bool {
        self.index.contains_key(value)
    }

    /// Window of a stored value.
    pub fn window(&self, value: &V) -> Option<Window> {
        self.position(value).map(|pos| self.entries[pos].window)
    }

    /// Entry at a storage position.
    pub fn at(&self, pos: usize) -> Option<&Entry<V>> {
        self.entries.get(pos)
    }

    /// All stored entries in storage order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry<V>> {
        self.entries.iter()
    }

    /// All stored values in storage order.
    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.entries.iter().map(|entry| entry.value)
    }

    /// Insert `value` with a window opened at `now`.
    pub fn register(&mut self, now: Timestamp, value: V) -> Result<(), SetError> {
        if self.contains(&value) {
            return Err(SetError::AlreadyRegistered);
        }

        self.index.insert(value, self.entries.len());
        self.entries.push(Entry {
            value,
            window: Window::open(now),
        });
        Ok(())
    }

    /// Close the window of `value` at `now`. Pausing twice is an error.
    pub fn pause(&mut self, now: Timestamp, value: V) -> Result<(), SetError> {
        let pos = self.position(&value).ok_or(SetError::NotRegistered)?;
        let window = &mut self.entries[pos].window;

        if let Some(disabled_at) = window.disabled_at {
            return Err(SetError::AlreadyDisabled { disabled_at });
        }

        window.disabled_at = Some(now);
        Ok(())
    }

    /// Open a fresh window for a disabled `value` once `cool_down` has elapsed.
    pub fn unpause(&mut self, now: Timestamp, cool_down: u64, value: V) -> Result<(), SetError> {
        let pos = self.position(&value).ok_or(SetError::NotRegistered)?;
        Self::ensure_cooled_down(&self.entries[pos].window, now, cool_down)?;

        self.entries[pos].window = Window::open(now);
        Ok(())
    }

    /// Whether `value` is stored, disabled, and has cooled down.
    pub fn check_unregister(&self, now: Timestamp, cool_down: u64, value: &V) -> bool {
        self.window(value)
            .map_or(false, |window| window.cooled_down(now, cool_down))
    }

    /// Physically remove a disabled `value` once `cool_down` has elapsed.
    pub fn unregister(&mut self, now: Timestamp, cool_down: u64, value: V) -> Result<(), SetError> {
        let pos = self.position(&value).ok_or(SetError::NotRegistered)?;
        Self::ensure_cooled_down(&self.entries[pos].window, now, cool_down)?;

        self.index.remove(&value);
        self.entries.swap_remove(pos);
        if let Some(moved) = self.entries.get(pos) {
            self.index.insert(moved.value, pos);
        }
        Ok(())
    }

    /// Values whose window contains `now`, in storage order.
    pub fn get_active(&self, now: Timestamp) -> Vec<V> {
        self.entries
            .iter()
            .filter(|entry| entry.window.contains(now))
            .map(|entry| entry.value)
            .collect()
    }

    /// Whether the stored window of `value` contains `timestamp`.
    ///
    /// Unknown values were never active as far as the set can tell.
    pub fn was_active_at(&self, timestamp: Timestamp, value: &V) -> bool {
        self.window(value)
            .map_or(false, |window| window.contains(timestamp))
    }

    /// Rebuild the lookup table (after deserialization)
    pub fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (entry.value, pos))
            .collect();
    }

    /// Every stored value appears once. Only meaningful after
    /// [`Self::rebuild_index`] on deserialized data.
    pub fn has_unique_values(&self) -> bool {
        self.index.len() == self.entries.len()
    }

    fn position(&self, value: &V) -> Option<usize> {
        self.index.get(value).copied()
    }

    fn ensure_cooled_down(window: &Window, now: Timestamp, cool_down: u64) -> Result<(), SetError> {
        let disabled_at = window.disabled_at.ok_or(SetError::NotDisabled)?;
        let ready_at = disabled_at.saturating_add(cool_down);
        if now < ready_at {
            return Err(SetError::CoolDownNotElapsed {
                disabled_at,
                ready_at,
            });
        }
        Ok(())
    }
}
