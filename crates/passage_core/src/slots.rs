//! Named effect slots
//!
//! One map from stable slot keys to at most one live [`EffectHandle`] each,
//! owned by the coordinator. This replaces free-floating `cleanup*` module
//! variables: every live handle has exactly one owner, installing into an
//! occupied slot tears the previous occupant down first, and clearing an
//! empty slot is a no-op.

use rustc_hash::FxHashMap;

use crate::handle::EffectHandle;

/// Stable key identifying an effect slot
pub type SlotKey = &'static str;

/// Slot map holding the live handles of the current page
#[derive(Default)]
pub struct EffectSlots {
    slots: FxHashMap<SlotKey, EffectHandle>,
}

impl EffectSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a handle, tearing down any existing occupant of the slot
    ///
    /// This is what enforces at-most-one concurrent instance per effect
    /// kind regardless of which navigation created the old one.
    pub fn install(&mut self, key: SlotKey, handle: EffectHandle) {
        if let Some(previous) = self.slots.remove(key) {
            tracing::debug!(slot = key, "replacing live handle");
            previous.teardown(key);
        }
        self.slots.insert(key, handle);
    }

    /// Tear down and clear one slot
    ///
    /// Returns whether a live handle was actually torn down. Clearing an
    /// already-empty slot is a no-op, which is what makes coordinator-level
    /// teardown idempotent without requiring idempotent teardown actions.
    pub fn clear(&mut self, key: SlotKey) -> bool {
        match self.slots.remove(key) {
            Some(handle) => {
                handle.teardown(key);
                true
            }
            None => false,
        }
    }

    /// Tear down every live handle (global teardown at PreLeave)
    pub fn clear_all(&mut self) {
        for (key, handle) in self.slots.drain() {
            handle.teardown(key);
        }
    }

    pub fn is_live(&self, key: SlotKey) -> bool {
        self.slots.contains_key(key)
    }

    pub fn live_count(&self) -> usize {
        self.slots.len()
    }

    /// Keys of all currently live slots
    pub fn live_keys(&self) -> Vec<SlotKey> {
        self.slots.keys().copied().collect()
    }
}
