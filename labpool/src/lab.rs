//! ComputeLab - opens the lab, lets students in, closes when they are done.
//!
//! Flow:
//! 1. Print the banner
//! 2. Start the monitor
//! 3. Spawn students one by one with a random gap between arrivals
//! 4. Wait for every student
//! 5. Stop and join the monitor, print the closing line

use std::sync::Arc;

use futures::FutureExt;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::LabConfig;
use crate::error::Result;
use crate::event::{EventSink, LabEvent};
use crate::monitor::Monitor;
use crate::state::LabState;
use crate::student::{Student, StudentId, StudentOutcome};

/// Summary returned once the lab has closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabReport {
    pub capacity: usize,
    pub spawned: usize,
    pub served: usize,
    pub interrupted: usize,
    pub in_use_at_close: usize,
    pub peak_in_use: usize,
    pub snapshots: usize,
}

pub struct ComputeLab {
    config: LabConfig,
    state: Arc<LabState>,
    shutdown: CancellationToken,
}

impl ComputeLab {
    pub fn new(config: LabConfig, events: Arc<dyn EventSink>) -> Result<Self> {
        config.validate()?;
        let state = Arc::new(LabState::new(
            config.capacity,
            config.slot_assignment,
            events,
        ));
        Ok(Self {
            config,
            state,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn config(&self) -> &LabConfig {
        &self.config
    }

    pub fn state(&self) -> Arc<LabState> {
        Arc::clone(&self.state)
    }

    /// Cancelling this token stops new arrivals and interrupts every student.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub async fn run(self) -> LabReport {
        let state = &self.state;
        state.emit(LabEvent::Opened {
            capacity: self.config.capacity,
        });

        let monitor_cancel = self.shutdown.child_token();
        let monitor = Monitor::new(Arc::clone(state), self.config.monitor_interval)
            .spawn(monitor_cancel.clone());

        let visits = self.admit_students().await;
        let spawned = visits.len();

        let mut served = 0;
        let mut interrupted = 0;
        let finished = visits
            .into_iter()
            .map(|visit| visit.handle.map(move |result| (visit.id, result)));
        for (id, result) in futures::future::join_all(finished).await {
            match result {
                Ok(Ok(StudentOutcome::Served { .. })) => served += 1,
                Ok(Ok(StudentOutcome::Interrupted { .. })) => interrupted += 1,
                Ok(Err(e)) => {
                    tracing::error!(student = %id, error = %e, "Student visit failed");
                    interrupted += 1;
                }
                Err(e) => {
                    tracing::error!(student = %id, error = %e, "Student task panicked");
                    interrupted += 1;
                }
            }
        }

        monitor_cancel.cancel();
        let snapshots = match monitor.await {
            Ok(n) => n,
            Err(e) => {
                tracing::error!(error = %e, "Monitor task failed");
                0
            }
        };

        state.emit(LabEvent::Closed {
            served: state.counters().served(),
        });

        LabReport {
            capacity: self.config.capacity,
            spawned,
            served,
            interrupted,
            in_use_at_close: state.pool().in_use(),
            peak_in_use: state.pool().peak_in_use(),
            snapshots,
        }
    }

    /// Spawn every student, pausing between arrivals. Stops early on shutdown.
    async fn admit_students(&self) -> Vec<StudentVisit> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut visits = Vec::with_capacity(self.config.students);
        for number in 1..=self.config.students {
            if self.shutdown.is_cancelled() {
                tracing::warn!(
                    admitted = visits.len(),
                    "Lab shut down before every student arrived"
                );
                break;
            }

            let id = StudentId::new(number);
            let work = self.config.work.sample(&mut rng);
            let student = Student::new(id, work);
            let handle = tokio::spawn(
                student.run(Arc::clone(&self.state), self.shutdown.child_token()),
            );
            visits.push(StudentVisit { id, handle });

            if number < self.config.students {
                let gap = self.config.arrival_gap.sample(&mut rng);
                if !gap.is_zero() {
                    tokio::select! {
                        biased;
                        _ = self.shutdown.cancelled() => {}
                        _ = tokio::time::sleep(gap) => {}
                    }
                }
            }
        }
        visits
    }
}

struct StudentVisit {
    id: StudentId,
    handle: JoinHandle<Result<StudentOutcome>>,
}
