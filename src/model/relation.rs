// src/model/relation.rs

use crate::types::{RelationId, RelationType, TaskId};

/// A directed precedence edge `predecessor -> successor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRelation {
    pub id: RelationId,
    pub predecessor_id: TaskId,
    pub successor_id: TaskId,
    pub relation_type: RelationType,
    /// Signed offset in calendar days; negative values express lead time.
    pub lag: i64,
}

impl TaskRelation {
    pub fn involves(&self, task: TaskId) -> bool {
        self.predecessor_id == task || self.successor_id == task
    }
}
