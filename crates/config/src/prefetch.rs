#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Default time-to-live of a prefetched response, in seconds.
pub const DEFAULT_TTL_SECS: i32 = 60;

/// Default number of prefetches held at once.
pub const DEFAULT_MAX_SLOTS: i32 = 10;

/// Upper bound on the number of prefetches that can ever be held, whatever
/// the caller asks for.
pub const ABSOLUTE_MAX_SLOTS: i32 = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Prefetch {
    /// Time-to-live of prefetched content in seconds.
    ///
    /// Not validated: zero and negative values are stored as given.
    pub ttl_secs: i32,

    /// Maximum number of prefetches held at once (capped at
    /// [`ABSOLUTE_MAX_SLOTS`]).
    pub max_slots: i32,

    /// Whether prefetches may be started by the embedder at all.
    pub browser_initiated_triggers: bool,
}

impl Default for Prefetch {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_TTL_SECS,
            max_slots: DEFAULT_MAX_SLOTS,
            browser_initiated_triggers: true,
        }
    }
}

impl Prefetch {
    /// Applies the absolute slot cap. There is no lower bound.
    pub fn clamp(self) -> Self {
        Self {
            max_slots: self.max_slots.min(ABSOLUTE_MAX_SLOTS),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn clamp_caps_only_from_above(max_slots in any::<i32>(), ttl_secs in any::<i32>()) {
            let prefetch = Prefetch { ttl_secs, max_slots, ..Default::default() }.clamp();
            prop_assert_eq!(prefetch.max_slots, max_slots.min(ABSOLUTE_MAX_SLOTS));
            prop_assert_eq!(prefetch.ttl_secs, ttl_secs);
        }
    }
}
