#![forbid(unsafe_code)]

use crate::{ABSOLUTE_MAX_SLOTS, Error, PrefetchHandle, SlotKey};
use config::Prefetch;
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};

/// Bounded table of prefetch handles.
///
/// Every inserted handle gets a fresh key, strictly greater than all keys
/// handed out before. When the table is full the oldest handles (lowest keys)
/// are evicted to make room. All access happens from a single sequence; the
/// table does no locking.
#[derive(Debug)]
pub struct PrefetchSlotManager {
    ttl_secs: i32,
    max_slots: i32,
    /// `BTreeMap` iterates in key order, which is also insertion order.
    slots: BTreeMap<SlotKey, Box<dyn PrefetchHandle>>,
    /// Only ever increases.
    last_key: SlotKey,
}

impl Default for PrefetchSlotManager {
    fn default() -> Self {
        Self::new(&Prefetch::default())
    }
}

impl PrefetchSlotManager {
    pub fn new(settings: &Prefetch) -> Self {
        let mut manager = Self {
            ttl_secs: settings.ttl_secs,
            max_slots: 0,
            slots: BTreeMap::new(),
            last_key: SlotKey::NONE,
        };
        manager.set_max_slots(settings.max_slots);
        manager
    }

    /// Take ownership of `handle` and return its key.
    ///
    /// Evicts the oldest handles until one slot is free. Fails with
    /// [`Error::InvalidCapacity`] when `max_slots` is not positive and with
    /// [`Error::KeysExhausted`] once `i32::MAX` has been handed out; the handle
    /// is released and the table is left untouched in both cases.
    pub fn insert(&mut self, handle: Box<dyn PrefetchHandle>) -> Result<SlotKey, Error> {
        if self.max_slots <= 0 {
            warn!(
                max_slots = self.max_slots,
                url = handle.url(),
                "refusing prefetch, no capacity"
            );
            return Err(Error::InvalidCapacity(self.max_slots));
        }
        let Some(new_key) = self.last_key.checked_next() else {
            warn!(
                last_key = %self.last_key,
                url = handle.url(),
                "refusing prefetch, keys exhausted"
            );
            return Err(Error::KeysExhausted(self.last_key));
        };

        let capacity = self.max_slots as usize;
        if self.slots.len() >= capacity {
            let num_to_evict = self.slots.len() - capacity + 1;
            for _ in 0..num_to_evict {
                let Some((key, handle)) = self.slots.pop_first() else {
                    break;
                };
                debug!(%key, url = handle.url(), "evicting prefetch");
            }
        }

        debug_assert!(new_key > self.last_key);
        debug!(%new_key, url = handle.url(), "prefetch added");
        self.slots.insert(new_key, handle);
        self.last_key = new_key;
        Ok(new_key)
    }

    /// Release the handle stored at `key`.
    ///
    /// Unknown keys (already evicted, cancelled, or never handed out) are
    /// ignored. Returns whether a handle was released.
    pub fn cancel(&mut self, key: SlotKey) -> bool {
        match self.slots.remove(&key) {
            Some(handle) => {
                debug!(%key, url = handle.url(), "prefetch cancelled");
                true
            }
            None => {
                trace!(%key, "no prefetch to cancel");
                false
            }
        }
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn get(&self, key: SlotKey) -> Option<&dyn PrefetchHandle> {
        self.slots.get(&key).map(|handle| handle.as_ref())
    }

    /// All held handles, oldest first.
    pub fn handles(&self) -> impl Iterator<Item = (SlotKey, &dyn PrefetchHandle)> {
        self.slots.iter().map(|(key, handle)| (*key, handle.as_ref()))
    }

    pub fn keys(&self) -> Vec<SlotKey> {
        self.slots.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Key handed out by the latest successful insert, [`SlotKey::NONE`] if
    /// there was none.
    pub fn last_key(&self) -> SlotKey {
        self.last_key
    }

    /// Release every handle. Keys are still never reused afterwards.
    pub fn clear(&mut self) {
        debug!(count = self.slots.len(), "releasing all prefetches");
        self.slots.clear();
    }

    pub fn ttl_secs(&self) -> i32 {
        self.ttl_secs
    }

    /// Stored verbatim, including zero and negative values.
    pub fn set_ttl_secs(&mut self, ttl_secs: i32) {
        self.ttl_secs = ttl_secs;
    }

    pub fn max_slots(&self) -> i32 {
        self.max_slots
    }

    /// Capped at [`ABSOLUTE_MAX_SLOTS`]. Values below one are stored as given
    /// and make every following [`insert`](Self::insert) fail.
    pub fn set_max_slots(&mut self, max_slots: i32) {
        self.max_slots = max_slots.min(ABSOLUTE_MAX_SLOTS);
    }
}
