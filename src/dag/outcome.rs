// src/dag/outcome.rs

//! Result types of a scheduling pass.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

use crate::model::ScheduledDates;
use crate::types::{DateField, TaskId};

/// A task whose derived date had to move later than its authored date to
/// satisfy its incoming relations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlipped {
    pub task: TaskId,
    pub activity_id: String,
    pub field: DateField,
    pub authored: NaiveDate,
    pub derived: NaiveDate,
}

impl ScheduleSlipped {
    pub fn days(&self) -> i64 {
        (self.derived - self.authored).num_days()
    }
}

/// Non-fatal findings returned next to a successful recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advisory {
    ScheduleSlipped(ScheduleSlipped),
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::ScheduleSlipped(s) => write!(
                f,
                "{} {} slipped {} day(s): {} -> {}",
                s.activity_id,
                s.field,
                s.days(),
                s.authored,
                s.derived
            ),
        }
    }
}

/// Everything a scheduling pass derived. Nothing is applied until the
/// project aggregate commits it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleOutcome {
    pub dates: BTreeMap<TaskId, ScheduledDates>,
    /// Zero-float tasks in topological order.
    pub critical_path: Vec<TaskId>,
    pub advisories: Vec<Advisory>,
    /// Latest derived end among scheduled tasks.
    pub project_finish: Option<NaiveDate>,
}
