#![forbid(unsafe_code)]

use std::fmt;

/// Identifies one entry of the slot table.
///
/// Keys are handed out in strictly increasing order and never reused, so key
/// order is insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey(i32);

impl SlotKey {
    /// No slot was allocated.
    pub const NONE: SlotKey = SlotKey(-1);

    /// The key given to the first handle of a manager.
    pub const FIRST: SlotKey = SlotKey(0);

    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == Self::NONE.0
    }

    /// The key following this one, `None` once the key space is used up.
    pub const fn checked_next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }
}

impl Default for SlotKey {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for SlotKey {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl From<SlotKey> for i32 {
    fn from(key: SlotKey) -> Self {
        key.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_minus_one() {
        assert_eq!(i32::from(SlotKey::NONE), -1);
        assert!(SlotKey::NONE.is_none());
        assert!(!SlotKey::FIRST.is_none());
        assert_eq!(SlotKey::NONE.checked_next(), Some(SlotKey::FIRST));
        assert_eq!(SlotKey::default(), SlotKey::NONE);
    }

    #[test]
    fn last_key_has_no_successor() {
        assert_eq!(
            SlotKey::new(i32::MAX - 1).checked_next(),
            Some(SlotKey::new(i32::MAX))
        );
        assert_eq!(SlotKey::new(i32::MAX).checked_next(), None);
    }

    #[test]
    fn displays_raw_value() {
        assert_eq!(SlotKey::new(7).to_string(), "7");
        assert_eq!(SlotKey::NONE.to_string(), "-1");
    }
}
