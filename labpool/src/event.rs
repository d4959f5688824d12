//! Lab events and where they go.
//!
//! Students, the monitor and the driver describe what happens as `LabEvent`
//! values. A sink decides what to do with them: `ConsoleSink` prints the
//! human-readable lines, `MemorySink` keeps them for inspection.

use std::io::Write;
use std::sync::{Mutex as StdMutex, PoisonError};

use serde::Serialize;

use crate::permit::SlotId;
use crate::state::LabSnapshot;
use crate::student::{StudentId, StudentState};

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LabEvent {
    Opened {
        capacity: usize,
    },
    Arrived {
        student: StudentId,
    },
    /// Every machine was taken when the student arrived.
    Waiting {
        student: StudentId,
    },
    Seated {
        student: StudentId,
        slot: SlotId,
    },
    Working {
        student: StudentId,
        work_ms: u64,
    },
    Released {
        student: StudentId,
        slot: SlotId,
    },
    Served {
        student: StudentId,
        total: usize,
    },
    Interrupted {
        student: StudentId,
        state: StudentState,
    },
    Status(LabSnapshot),
    Closed {
        served: usize,
    },
}

impl LabEvent {
    /// Console text for this event, `clock` being the `HH:MM:SS` time it is shown at.
    pub fn render(&self, clock: &str) -> String {
        match self {
            LabEvent::Opened { capacity } => format!(
                "🖥  COMPUTER LAB - concurrency simulation\n📅 {clock}\n🪑 Machines available: {capacity}\n{}",
                "=".repeat(RULE_WIDTH)
            ),
            LabEvent::Arrived { student } => {
                format!("[{clock}] 👋 Student {student} arrives at the lab")
            }
            LabEvent::Waiting { student } => {
                format!("   ⏳ Student {student} waits for a free machine")
            }
            LabEvent::Seated { student, slot } => {
                format!("[{clock}] 🪑 Student {student} uses machine #{slot}")
            }
            LabEvent::Working { student, work_ms } => format!(
                "   🖥 Student {student} working... ({:.3}s)",
                *work_ms as f64 / 1000.0
            ),
            LabEvent::Released { student, slot } => {
                format!("[{clock}] ✨ Student {student} frees machine #{slot}")
            }
            LabEvent::Served { total, .. } => format!("   📊 Total students served: {total}"),
            LabEvent::Interrupted { student, .. } => {
                format!("⚠️ Student {student} left because of an interruption")
            }
            LabEvent::Status(snapshot) => format!(
                "\n📈 [{clock}] CURRENT STATUS:\n   🪑 Machines in use: {}/{}\n   ⏳ Students waiting: {}\n   ✅ Students served: {}\n",
                snapshot.in_use, snapshot.capacity, snapshot.waiting, snapshot.served
            ),
            LabEvent::Closed { .. } => {
                "\n🔒 The computer lab has closed. All sessions finished.".to_string()
            }
        }
    }
}

/// Destination for lab events. Called concurrently from every task.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &LabEvent);
}

/// Prints events to stdout, one locked write per event.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink;

impl ConsoleSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for ConsoleSink {
    fn emit(&self, event: &LabEvent) {
        let clock = chrono::Local::now().format("%H:%M:%S").to_string();
        let mut out = std::io::stdout().lock();
        if let Err(e) = writeln!(out, "{}", event.render(&clock)) {
            tracing::warn!(error = %e, "Failed to write lab event to stdout");
        }
    }
}

/// Keeps every event in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: StdMutex<Vec<LabEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LabEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: &LabEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(n: usize) -> StudentId {
        StudentId::new(n)
    }

    fn slot(n: usize) -> SlotId {
        SlotId::new(n).unwrap()
    }

    #[test]
    fn renders_timestamped_lines() {
        let seated = LabEvent::Seated {
            student: student(3),
            slot: slot(2),
        };
        assert_eq!(
            seated.render("09:15:00"),
            "[09:15:00] 🪑 Student 3 uses machine #2"
        );

        let released = LabEvent::Released {
            student: student(3),
            slot: slot(2),
        };
        assert_eq!(
            released.render("09:15:04"),
            "[09:15:04] ✨ Student 3 frees machine #2"
        );
    }

    #[test]
    fn renders_work_duration_in_seconds() {
        let working = LabEvent::Working {
            student: student(7),
            work_ms: 2345,
        };
        assert_eq!(
            working.render("00:00:00"),
            "   🖥 Student 7 working... (2.345s)"
        );
    }

    #[test]
    fn renders_banner_with_capacity() {
        let banner = LabEvent::Opened { capacity: 5 }.render("12:00:00");
        let lines: Vec<&str> = banner.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "📅 12:00:00");
        assert_eq!(lines[2], "🪑 Machines available: 5");
        assert_eq!(lines[3], "=".repeat(60));
    }

    #[test]
    fn renders_status_block() {
        let status = LabEvent::Status(LabSnapshot {
            in_use: 3,
            capacity: 5,
            waiting: 1,
            served: 4,
        });
        let text = status.render("10:00:02");
        assert!(text.contains("📈 [10:00:02] CURRENT STATUS:"));
        assert!(text.contains("Machines in use: 3/5"));
        assert!(text.contains("Students waiting: 1"));
        assert!(text.contains("Students served: 4"));
    }

    #[test]
    fn seated_serializes_with_tag() {
        let seated = LabEvent::Seated {
            student: student(1),
            slot: slot(4),
        };
        insta::assert_json_snapshot!(seated, @r#"
        {
          "event": "seated",
          "student": 1,
          "slot": 4
        }
        "#);
    }

    #[test]
    fn status_serializes_snapshot_fields() {
        let status = LabEvent::Status(LabSnapshot {
            in_use: 2,
            capacity: 5,
            waiting: 0,
            served: 7,
        });
        insta::assert_json_snapshot!(status, @r#"
        {
          "event": "status",
          "in_use": 2,
          "capacity": 5,
          "waiting": 0,
          "served": 7
        }
        "#);
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit(&LabEvent::Arrived {
            student: student(1),
        });
        sink.emit(&LabEvent::Closed { served: 1 });

        assert_eq!(
            sink.events(),
            vec![
                LabEvent::Arrived {
                    student: student(1)
                },
                LabEvent::Closed { served: 1 },
            ]
        );
    }
}
