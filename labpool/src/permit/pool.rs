//! Machine pool implementation.
//!
//! A slot token is always put back into the free set before its semaphore
//! permit is released, so a newly granted permit always finds a free slot.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, PoisonError};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use super::slot::{SlotId, full_slot_set};
use crate::error::{LabError, Result};

type FreeSlots = Arc<StdMutex<BTreeSet<SlotId>>>;

fn lock_slots(slots: &StdMutex<BTreeSet<SlotId>>) -> MutexGuard<'_, BTreeSet<SlotId>> {
    // The set is only touched for a single insert or remove, so a poisoned
    // lock still holds a consistent set.
    slots.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A machine held by one student. Returns to the pool on drop.
#[derive(Debug)]
#[must_use = "dropping the permit immediately frees the machine"]
pub struct MachinePermit {
    slot: SlotId,
    free_slots: FreeSlots,
    _permit: OwnedSemaphorePermit,
}

impl MachinePermit {
    pub fn slot_id(&self) -> SlotId {
        self.slot
    }

    /// Give the machine back. Equivalent to dropping the permit.
    pub fn release(self) -> SlotId {
        self.slot
    }
}

impl Drop for MachinePermit {
    fn drop(&mut self) {
        if !lock_slots(&self.free_slots).insert(self.slot) {
            debug_assert!(false, "slot returned twice");
            tracing::error!(slot = %self.slot, "Bug: slot was already in the free set");
        }
        tracing::debug!(slot = %self.slot, "Machine permit released");
    }
}

/// Fixed-size pool of lab machines.
///
/// Admission is first come, first served: tokio's semaphore queues waiters
/// in FIFO order.
#[derive(Debug)]
pub struct MachinePool {
    semaphore: Arc<Semaphore>,
    free_slots: FreeSlots,
    capacity: usize,
    peak_in_use: AtomicUsize,
}

impl MachinePool {
    /// Callers validate `capacity` first (see `LabConfig::validate`).
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            free_slots: Arc::new(StdMutex::new(full_slot_set(capacity))),
            capacity,
            peak_in_use: AtomicUsize::new(0),
        }
    }

    /// Wait for a free machine.
    pub async fn acquire(&self) -> Result<MachinePermit> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| LabError::PoolClosed)?;
        self.seat(permit)
    }

    /// Take a machine only if one is free right now.
    pub fn try_acquire(&self) -> Option<MachinePermit> {
        let permit = Arc::clone(&self.semaphore).try_acquire_owned().ok()?;
        self.seat(permit).ok()
    }

    fn seat(&self, permit: OwnedSemaphorePermit) -> Result<MachinePermit> {
        let slot = lock_slots(&self.free_slots)
            .pop_first()
            .ok_or(LabError::SlotsExhausted)?;

        let in_use = self.in_use();
        self.peak_in_use.fetch_max(in_use, Ordering::AcqRel);
        tracing::debug!(slot = %slot, in_use, "Machine permit acquired");

        Ok(MachinePermit {
            slot,
            free_slots: Arc::clone(&self.free_slots),
            _permit: permit,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free permits. May be stale as soon as it is read.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn in_use(&self) -> usize {
        self.capacity.saturating_sub(self.available())
    }

    /// Highest number of concurrent holders seen at acquire time.
    pub fn peak_in_use(&self) -> usize {
        self.peak_in_use.load(Ordering::Acquire)
    }
}
