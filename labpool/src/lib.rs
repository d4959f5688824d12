//! labpool: a computer lab with a fixed number of machines, shared by
//! students who arrive over time.
//!
//! The lab is a fair counting semaphore plus a few atomic counters. Students
//! queue for a machine, work for a while and leave; a monitor prints the
//! lab's status at a fixed interval.

mod counters;
mod monitor;
mod state;
mod student;

pub mod config;
pub mod error;
pub mod event;
pub mod lab;
pub mod permit;
pub mod telemetry;

pub use config::{DurationRange, LabConfig, SlotAssignment};
pub use counters::LabCounters;
pub use error::LabError;
pub use event::{ConsoleSink, EventSink, LabEvent, MemorySink};
pub use lab::{ComputeLab, LabReport};
pub use monitor::Monitor;
pub use permit::{MachinePermit, MachinePool, SlotId};
pub use state::{LabSnapshot, LabState};
pub use student::{Student, StudentId, StudentOutcome, StudentState};
