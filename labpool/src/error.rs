use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabError {
    #[error("lab capacity must be at least one machine")]
    ZeroCapacity,

    #[error("lab capacity {requested} exceeds the semaphore limit of {max} permits")]
    CapacityTooLarge { requested: usize, max: usize },

    #[error("duration range is inverted: min {min_ms}ms > max {max_ms}ms")]
    InvertedRange { min_ms: u128, max_ms: u128 },

    #[error("monitor interval must be greater than zero")]
    ZeroMonitorInterval,

    #[error("machine pool is closed")]
    PoolClosed,

    #[error("permit granted but no free slot was left in the pool")]
    SlotsExhausted,
}

pub type Result<T> = std::result::Result<T, LabError>;
