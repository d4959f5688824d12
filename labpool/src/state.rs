//! LabState - the one shared object every task receives.
//!
//! Built once per lab and handed to students and the monitor as an `Arc`.

use std::sync::Arc;

use serde::Serialize;

use crate::config::SlotAssignment;
use crate::counters::LabCounters;
use crate::event::{EventSink, LabEvent};
use crate::permit::{MachinePermit, MachinePool, SlotId};

/// Point-in-time view of the lab for status lines.
///
/// Fields are read one after another, not atomically together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabSnapshot {
    pub in_use: usize,
    pub capacity: usize,
    pub waiting: usize,
    pub served: usize,
}

pub struct LabState {
    pool: MachinePool,
    counters: LabCounters,
    slot_assignment: SlotAssignment,
    events: Arc<dyn EventSink>,
}

impl LabState {
    pub fn new(
        capacity: usize,
        slot_assignment: SlotAssignment,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            pool: MachinePool::new(capacity),
            counters: LabCounters::new(),
            slot_assignment,
            events,
        }
    }

    pub fn pool(&self) -> &MachinePool {
        &self.pool
    }

    pub fn counters(&self) -> &LabCounters {
        &self.counters
    }

    pub fn emit(&self, event: LabEvent) {
        self.events.emit(&event);
    }

    /// Machine number shown to the student holding `permit`.
    pub fn display_slot(&self, permit: &MachinePermit) -> SlotId {
        match self.slot_assignment {
            SlotAssignment::Exclusive => permit.slot_id(),
            SlotAssignment::RoundRobin => {
                self.counters.next_display_slot(self.pool.capacity())
            }
        }
    }

    pub fn snapshot(&self) -> LabSnapshot {
        LabSnapshot {
            in_use: self.pool.in_use(),
            capacity: self.pool.capacity(),
            waiting: self.counters.waiting(),
            served: self.counters.served(),
        }
    }
}

impl std::fmt::Debug for LabState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabState")
            .field("pool", &self.pool)
            .field("counters", &self.counters)
            .field("slot_assignment", &self.slot_assignment)
            .finish_non_exhaustive()
    }
}
