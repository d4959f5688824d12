//! Monitor - periodic status lines while the lab is open.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::event::LabEvent;
use crate::state::LabState;

pub struct Monitor {
    lab: Arc<LabState>,
    interval: Duration,
}

impl Monitor {
    pub fn new(lab: Arc<LabState>, interval: Duration) -> Self {
        Self { lab, interval }
    }

    /// Run on a background task until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<usize> {
        tokio::spawn(self.run(cancel))
    }

    /// Sleep one interval, emit a snapshot, repeat. Returns the number of
    /// snapshots emitted. Cancellation mid-sleep exits without a final line.
    pub async fn run(self, cancel: CancellationToken) -> usize {
        let mut emitted = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
            self.lab.emit(LabEvent::Status(self.lab.snapshot()));
            emitted += 1;
        }
        tracing::debug!(snapshots = emitted, "Monitor stopped");
        emitted
    }
}
