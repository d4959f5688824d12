//! Machine pool for bounded concurrent access.
//!
//! A fair counting semaphore bounds how many students hold a machine, and an
//! arena of slot tokens gives every holder a distinct machine number:
//! - `MachinePool::acquire` waits for a permit, then takes the lowest free slot
//! - dropping `MachinePermit` puts the slot back, then releases the permit

mod pool;
mod slot;

pub use pool::{MachinePermit, MachinePool};
pub use slot::SlotId;
