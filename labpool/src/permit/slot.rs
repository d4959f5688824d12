//! SlotId - machine number inside the lab.

use std::collections::BTreeSet;

use serde::Serialize;

/// Machine number, `1..=capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct SlotId(usize);

impl SlotId {
    /// Returns `None` for zero; machine numbers start at one.
    pub fn new(number: usize) -> Option<Self> {
        (number != 0).then_some(Self(number))
    }

    /// Map an unbounded one-based counter value into `1..=capacity`.
    pub(crate) fn wrapping(counter: usize, capacity: usize) -> Self {
        debug_assert!(counter >= 1 && capacity >= 1);
        Self(((counter - 1) % capacity) + 1)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Free slot tokens, handed out lowest first.
pub(crate) fn full_slot_set(capacity: usize) -> BTreeSet<SlotId> {
    (1..=capacity).map(SlotId).collect()
}
