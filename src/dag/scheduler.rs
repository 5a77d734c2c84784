// src/dag/scheduler.rs

use std::collections::BTreeMap;

use chrono::{NaiveDate, TimeDelta};
use tracing::{debug, info};

use crate::dag::graph::{DependencyGraph, Edge};
use crate::dag::outcome::{Advisory, ScheduleOutcome, ScheduleSlipped};
use crate::errors::RecomputeError;
use crate::model::{ScheduledDates, Task};
use crate::store::TaskStore;
use crate::types::{DateField, TaskId};

/// Forward/backward pass over the dependency graph.
///
/// It is responsible for:
/// - deriving start/end for every task that takes part in a relation
/// - widening windows that their incoming relations push later, and
///   reporting each such slip as an advisory
/// - computing late dates, total float and critical-path membership
///
/// Tasks without incoming relations keep their authored dates as anchors.
/// The scheduler only reads; [`plan`](Self::plan) returns a
/// [`ScheduleOutcome`] for the caller to commit.
#[derive(Debug)]
pub struct Scheduler<'a> {
    tasks: &'a TaskStore,
    graph: &'a DependencyGraph,
}

/// Derived window of one task during the passes.
#[derive(Debug, Clone, Copy)]
struct Window {
    start: NaiveDate,
    end: NaiveDate,
}

impl Window {
    fn get(&self, field: DateField) -> NaiveDate {
        match field {
            DateField::Start => self.start,
            DateField::End => self.end,
        }
    }

    fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl<'a> Scheduler<'a> {
    pub fn new(tasks: &'a TaskStore, graph: &'a DependencyGraph) -> Self {
        Self { tasks, graph }
    }

    /// Run both passes. Refuses to run on a cyclic graph.
    pub fn plan(&self) -> Result<ScheduleOutcome, RecomputeError> {
        self.graph.ensure_acyclic()?;

        for id in self.graph.tasks() {
            if !self.tasks.contains(id) {
                return Err(RecomputeError::UnknownTask { task: id });
            }
        }

        let order = self
            .graph
            .topological_order(|id| self.tasks.get(id).map(|t| t.wbs_code.clone()))?;

        if order.is_empty() {
            debug!("scheduler: no relations; nothing to schedule");
            return Ok(ScheduleOutcome::default());
        }

        let mut advisories = Vec::new();
        let early = self.forward_pass(&order, &mut advisories)?;

        let project_finish = early.values().map(|w| w.end).max();
        let late = match project_finish {
            Some(finish) => self.backward_pass(&order, &early, finish)?,
            None => BTreeMap::new(),
        };

        let mut dates = BTreeMap::new();
        let mut critical_path = Vec::new();
        for id in &order {
            let (Some(e), Some(l)) = (early.get(id), late.get(id)) else {
                continue;
            };
            let total_float_days = (l.start - e.start).num_days();
            let critical = total_float_days == 0;
            if critical {
                critical_path.push(*id);
            }
            dates.insert(
                *id,
                ScheduledDates {
                    start: e.start,
                    end: e.end,
                    late_start: l.start,
                    late_end: l.end,
                    total_float_days,
                    critical,
                },
            );
        }

        info!(
            scheduled = dates.len(),
            critical = critical_path.len(),
            slips = advisories.len(),
            finish = ?project_finish,
            "scheduler: pass complete"
        );

        Ok(ScheduleOutcome {
            dates,
            critical_path,
            advisories,
            project_finish,
        })
    }

    fn task(&self, id: TaskId) -> Result<&'a Task, RecomputeError> {
        self.tasks
            .get(id)
            .ok_or(RecomputeError::UnknownTask { task: id })
    }

    /// Earliest consistent window per task, in topological order.
    fn forward_pass(
        &self,
        order: &[TaskId],
        advisories: &mut Vec<Advisory>,
    ) -> Result<BTreeMap<TaskId, Window>, RecomputeError> {
        let mut early: BTreeMap<TaskId, Window> = BTreeMap::new();

        for id in order {
            let task = self.task(*id)?;
            let authored = Window {
                start: task.start_date,
                end: task.end_date,
            };

            let preds = self.graph.predecessors_of(*id);
            if preds.is_empty() {
                early.insert(*id, authored);
                continue;
            }

            let mut start_bound: Option<NaiveDate> = None;
            let mut end_bound: Option<NaiveDate> = None;
            for edge in preds {
                let bound = self.incoming_bound(*id, edge, &early)?;
                let slot = match edge.relation_type.successor_anchor() {
                    DateField::Start => &mut start_bound,
                    DateField::End => &mut end_bound,
                };
                *slot = Some(slot.map_or(bound, |b| b.max(bound)));
            }

            let derived = if task.is_milestone {
                let day = [Some(authored.start), start_bound, end_bound]
                    .into_iter()
                    .flatten()
                    .max()
                    .unwrap_or(authored.start);
                Window {
                    start: day,
                    end: day,
                }
            } else {
                let start = start_bound.map_or(authored.start, |b| b.max(authored.start));
                let end = [
                    Some(authored.end),
                    Some(shift(start, authored.duration_days())),
                    end_bound,
                ]
                .into_iter()
                .flatten()
                .max()
                .unwrap_or(authored.end);
                Window { start, end }
            };

            for field in [DateField::Start, DateField::End] {
                if derived.get(field) > authored.get(field) {
                    debug!(
                        task = %id,
                        %field,
                        authored = %authored.get(field),
                        derived = %derived.get(field),
                        "scheduler: incoming relations push date later"
                    );
                    advisories.push(Advisory::ScheduleSlipped(ScheduleSlipped {
                        task: *id,
                        activity_id: task.activity_id.clone(),
                        field,
                        authored: authored.get(field),
                        derived: derived.get(field),
                    }));
                }
            }

            early.insert(*id, derived);
        }

        Ok(early)
    }

    /// The date an incoming edge requires of the successor's anchored field.
    fn incoming_bound(
        &self,
        successor: TaskId,
        edge: &Edge,
        early: &BTreeMap<TaskId, Window>,
    ) -> Result<NaiveDate, RecomputeError> {
        let pred = early
            .get(&edge.task)
            .ok_or(RecomputeError::GraphNotAcyclic { task: successor })?;
        let anchor = pred.get(edge.relation_type.predecessor_anchor());
        Ok(shift(anchor, edge.lag))
    }

    /// Latest windows that keep every successor's late window and the
    /// project finish, in reverse topological order.
    fn backward_pass(
        &self,
        order: &[TaskId],
        early: &BTreeMap<TaskId, Window>,
        finish: NaiveDate,
    ) -> Result<BTreeMap<TaskId, Window>, RecomputeError> {
        let mut late: BTreeMap<TaskId, Window> = BTreeMap::new();

        for id in order.iter().rev() {
            let own = early
                .get(id)
                .ok_or(RecomputeError::UnknownTask { task: *id })?;
            let duration = own.duration_days();

            let mut late_end = finish;
            for edge in self.graph.successors_of(*id) {
                let succ = late
                    .get(&edge.task)
                    .ok_or(RecomputeError::GraphNotAcyclic { task: *id })?;
                let limit = shift(succ.get(edge.relation_type.successor_anchor()), -edge.lag);
                // A limit on our start becomes a limit on our end through
                // the derived duration.
                let end_limit = match edge.relation_type.predecessor_anchor() {
                    DateField::Start => shift(limit, duration),
                    DateField::End => limit,
                };
                late_end = late_end.min(end_limit);
            }

            late.insert(
                *id,
                Window {
                    start: shift(late_end, -duration),
                    end: late_end,
                },
            );
        }

        Ok(late)
    }
}

/// Move a date by whole calendar days, saturating at the calendar bounds.
fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    TimeDelta::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
}
