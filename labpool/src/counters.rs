//! Lab counters shared by students and the monitor.
//!
//! Each counter is atomic on its own. They are not updated together, so a
//! reader can see, for example, a student already served but still counted
//! as waiting.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::permit::SlotId;

#[derive(Debug, Default)]
pub struct LabCounters {
    waiting: AtomicUsize,
    served: AtomicUsize,
    next_slot: AtomicUsize,
}

impl LabCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// A student found every machine taken on arrival. Returns the new count.
    pub fn mark_waiting(&self) -> usize {
        self.waiting.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Decrement the waiting count if it is positive.
    ///
    /// Called by every student after acquiring, whether or not that student
    /// was the one counted as waiting. Returns whether a decrement happened.
    pub fn clear_waiting(&self) -> bool {
        self.waiting
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    /// A student finished and released its machine. Returns the new total.
    pub fn record_served(&self) -> usize {
        self.served.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Next round-robin machine label in `1..=capacity`.
    pub fn next_display_slot(&self, capacity: usize) -> SlotId {
        let counter = self.next_slot.fetch_add(1, Ordering::AcqRel) + 1;
        SlotId::wrapping(counter, capacity)
    }

    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    pub fn served(&self) -> usize {
        self.served.load(Ordering::Acquire)
    }
}
