//! Simulation parameters.
//!
//! The binary always runs [`LabConfig::default`]. The builder methods exist so
//! embedders and tests can run smaller, deterministic labs.

use std::time::Duration;

use rand::Rng;
use tokio::sync::Semaphore;

use crate::error::{LabError, Result};

/// Machines in the lab.
pub const DEFAULT_CAPACITY: usize = 5;
/// Students arriving over the whole run.
pub const DEFAULT_STUDENTS: usize = 12;
pub const DEFAULT_WORK: DurationRange = DurationRange::from_millis_unchecked(1500, 4000);
pub const DEFAULT_ARRIVAL_GAP: DurationRange = DurationRange::from_millis_unchecked(200, 500);
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_millis(2000);

/// Half-open duration range `[min, max)` sampled uniformly.
///
/// A range with `min == max` is fixed and always yields `min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationRange {
    min: Duration,
    max: Duration,
}

impl DurationRange {
    pub fn new(min: Duration, max: Duration) -> Result<Self> {
        if min > max {
            return Err(LabError::InvertedRange {
                min_ms: min.as_millis(),
                max_ms: max.as_millis(),
            });
        }
        Ok(Self { min, max })
    }

    pub fn from_millis(min: u64, max: u64) -> Result<Self> {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    const fn from_millis_unchecked(min: u64, max: u64) -> Self {
        Self {
            min: Duration::from_millis(min),
            max: Duration::from_millis(max),
        }
    }

    pub const fn fixed(duration: Duration) -> Self {
        Self {
            min: duration,
            max: duration,
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn is_fixed(&self) -> bool {
        self.min == self.max
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        if self.is_fixed() {
            return self.min;
        }
        rng.gen_range(self.min..self.max)
    }
}

/// How the machine number shown to a student is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SlotAssignment {
    /// Show the slot token the permit actually holds. Unique among
    /// concurrent holders.
    #[default]
    Exclusive,
    /// Show a wrapping counter value in `1..=capacity`, independent of the
    /// permit. Concurrent holders may show the same machine.
    RoundRobin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabConfig {
    pub capacity: usize,
    pub students: usize,
    pub work: DurationRange,
    pub arrival_gap: DurationRange,
    pub monitor_interval: Duration,
    pub slot_assignment: SlotAssignment,
    /// Seed for work and arrival sampling. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            students: DEFAULT_STUDENTS,
            work: DEFAULT_WORK,
            arrival_gap: DEFAULT_ARRIVAL_GAP,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            slot_assignment: SlotAssignment::default(),
            seed: None,
        }
    }
}

impl LabConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_students(mut self, students: usize) -> Self {
        self.students = students;
        self
    }

    pub fn with_work(mut self, work: DurationRange) -> Self {
        self.work = work;
        self
    }

    pub fn with_arrival_gap(mut self, gap: DurationRange) -> Self {
        self.arrival_gap = gap;
        self
    }

    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.monitor_interval = interval;
        self
    }

    pub fn with_slot_assignment(mut self, assignment: SlotAssignment) -> Self {
        self.slot_assignment = assignment;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Reject configurations the lab cannot run.
    ///
    /// Duration ranges are checked when they are built, so only the scalar
    /// fields are checked here.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(LabError::ZeroCapacity);
        }
        if self.capacity > Semaphore::MAX_PERMITS {
            return Err(LabError::CapacityTooLarge {
                requested: self.capacity,
                max: Semaphore::MAX_PERMITS,
            });
        }
        if self.monitor_interval.is_zero() {
            return Err(LabError::ZeroMonitorInterval);
        }
        Ok(())
    }
}
