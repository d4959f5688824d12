//! Student - one simulated arrival at the lab.
//!
//! Lifecycle: `Arrived -> Waiting? -> Holding -> Released -> Done`.
//! The machine is held by a `MachinePermit`, so every exit path, including
//! cancellation during work, hands the machine back to the pool.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::event::LabEvent;
use crate::permit::{MachinePermit, SlotId};
use crate::state::LabState;

/// Sequential student number, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StudentId(usize);

impl StudentId {
    pub fn new(number: usize) -> Self {
        Self(number)
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StudentState {
    Arrived,
    /// Saw a full lab on arrival. Informational only.
    Waiting,
    Holding,
    Released,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudentOutcome {
    Served { slot: SlotId },
    /// Cancelled before releasing. `state` is where the student was.
    Interrupted { state: StudentState },
}

impl StudentOutcome {
    pub fn is_served(&self) -> bool {
        matches!(self, StudentOutcome::Served { .. })
    }
}

#[derive(Debug)]
pub struct Student {
    id: StudentId,
    work: Duration,
    state: StudentState,
    slot: Option<SlotId>,
}

impl Student {
    pub fn new(id: StudentId, work: Duration) -> Self {
        Self {
            id,
            work,
            state: StudentState::Arrived,
            slot: None,
        }
    }

    pub fn id(&self) -> StudentId {
        self.id
    }

    pub fn state(&self) -> StudentState {
        self.state
    }

    /// Machine number shown to this student, once seated.
    pub fn slot(&self) -> Option<SlotId> {
        self.slot
    }

    /// Run the whole visit.
    ///
    /// Cancelling `cancel` while waiting for a machine or while working ends
    /// the visit early with `StudentOutcome::Interrupted`.
    pub async fn run(
        mut self,
        lab: Arc<LabState>,
        cancel: CancellationToken,
    ) -> Result<StudentOutcome> {
        self.arrive(&lab);

        let permit = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(self.interrupted(&lab)),
            permit = lab.pool().acquire() => permit?,
        };
        self.seat(&lab, &permit);

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                drop(permit);
                return Ok(self.interrupted(&lab));
            }
            _ = tokio::time::sleep(self.work) => {}
        }

        let slot = self.leave(&lab, permit);
        Ok(StudentOutcome::Served { slot })
    }

    fn arrive(&mut self, lab: &LabState) {
        self.state = StudentState::Arrived;
        lab.emit(LabEvent::Arrived { student: self.id });

        if lab.pool().available() == 0 {
            self.state = StudentState::Waiting;
            lab.counters().mark_waiting();
            lab.emit(LabEvent::Waiting { student: self.id });
        }
    }

    fn seat(&mut self, lab: &LabState, permit: &MachinePermit) {
        self.state = StudentState::Holding;
        // Not necessarily this student's own waiting mark.
        lab.counters().clear_waiting();

        let slot = lab.display_slot(permit);
        self.slot = Some(slot);
        tracing::debug!(student = %self.id, slot = %slot, token = %permit.slot_id(), "Student seated");

        lab.emit(LabEvent::Seated {
            student: self.id,
            slot,
        });
        lab.emit(LabEvent::Working {
            student: self.id,
            work_ms: u64::try_from(self.work.as_millis()).unwrap_or(u64::MAX),
        });
    }

    fn leave(&mut self, lab: &LabState, permit: MachinePermit) -> SlotId {
        let slot = self.slot.unwrap_or_else(|| permit.slot_id());
        lab.emit(LabEvent::Released {
            student: self.id,
            slot,
        });
        permit.release();
        self.state = StudentState::Released;

        let total = lab.counters().record_served();
        lab.emit(LabEvent::Served {
            student: self.id,
            total,
        });
        self.state = StudentState::Done;
        slot
    }

    fn interrupted(&mut self, lab: &LabState) -> StudentOutcome {
        tracing::warn!(student = %self.id, state = ?self.state, "Student interrupted");
        lab.emit(LabEvent::Interrupted {
            student: self.id,
            state: self.state,
        });
        StudentOutcome::Interrupted { state: self.state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotAssignment;
    use crate::event::MemorySink;

    fn lab(capacity: usize) -> (Arc<LabState>, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let state = Arc::new(LabState::new(
            capacity,
            SlotAssignment::Exclusive,
            sink.clone(),
        ));
        (state, sink)
    }

    fn id(n: usize) -> StudentId {
        StudentId::new(n)
    }

    #[tokio::test(start_paused = true)]
    async fn student_is_served_and_releases() {
        let (state, sink) = lab(1);
        let student = Student::new(id(1), Duration::from_millis(1500));

        let outcome = student
            .run(Arc::clone(&state), CancellationToken::new())
            .await
            .unwrap();

        let slot = SlotId::new(1).unwrap();
        assert_eq!(outcome, StudentOutcome::Served { slot });
        assert_eq!(state.counters().served(), 1);
        assert_eq!(state.pool().in_use(), 0);
        assert_eq!(
            sink.events(),
            vec![
                LabEvent::Arrived { student: id(1) },
                LabEvent::Seated {
                    student: id(1),
                    slot
                },
                LabEvent::Working {
                    student: id(1),
                    work_ms: 1500
                },
                LabEvent::Released {
                    student: id(1),
                    slot
                },
                LabEvent::Served {
                    student: id(1),
                    total: 1
                },
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn full_lab_marks_student_waiting() {
        let (state, sink) = lab(1);
        let held = state.pool().acquire().await.unwrap();

        let visit = tokio::spawn(
            Student::new(id(2), Duration::from_millis(100))
                .run(Arc::clone(&state), CancellationToken::new()),
        );
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(state.counters().waiting(), 1);
        assert!(!visit.is_finished());

        drop(held);
        let outcome = visit.await.unwrap().unwrap();
        assert!(outcome.is_served());
        assert_eq!(state.counters().waiting(), 0);
        assert!(
            sink.events()
                .contains(&LabEvent::Waiting { student: id(2) })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_working_returns_machine() {
        let (state, _sink) = lab(1);
        let cancel = CancellationToken::new();

        let visit = tokio::spawn(
            Student::new(id(1), Duration::from_secs(10)).run(Arc::clone(&state), cancel.clone()),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(state.pool().in_use(), 1);

        cancel.cancel();
        let outcome = visit.await.unwrap().unwrap();

        assert_eq!(
            outcome,
            StudentOutcome::Interrupted {
                state: StudentState::Holding
            }
        );
        assert_eq!(state.pool().in_use(), 0);
        assert_eq!(state.counters().served(), 0);
        assert!(state.pool().try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_while_waiting_never_seats() {
        let (state, sink) = lab(1);
        let _held = state.pool().acquire().await.unwrap();
        let cancel = CancellationToken::new();

        let visit = tokio::spawn(
            Student::new(id(4), Duration::from_millis(100))
                .run(Arc::clone(&state), cancel.clone()),
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();

        let outcome = visit.await.unwrap().unwrap();
        assert_eq!(
            outcome,
            StudentOutcome::Interrupted {
                state: StudentState::Waiting
            }
        );
        assert_eq!(state.pool().in_use(), 1);
        assert!(
            !sink
                .events()
                .iter()
                .any(|e| matches!(e, LabEvent::Seated { .. }))
        );
    }

    #[tokio::test]
    async fn zero_work_is_served_immediately() {
        let (state, _sink) = lab(2);
        let student = Student::new(id(9), Duration::ZERO);
        assert_eq!(student.id(), id(9));
        assert_eq!(student.state(), StudentState::Arrived);
        assert_eq!(student.slot(), None);

        let outcome = Student::new(id(9), Duration::ZERO)
            .run(Arc::clone(&state), CancellationToken::new())
            .await
            .unwrap();
        assert!(outcome.is_served());
        assert_eq!(state.counters().served(), 1);
    }
}
