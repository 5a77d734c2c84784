// src/errors.rs

//! Crate-wide error types and aliases.
//!
//! Mutation errors are split by the boundary that raises them:
//! [`TaskError`] from the task store, [`RelationError`] from the relation
//! store and dependency graph, [`RecomputeError`] from rollup and
//! scheduling. [`ProjectError`] is what the project aggregate and the
//! service return, and [`WbsError`] is the top-level error for config,
//! persistence and the binary.

use chrono::NaiveDate;
use thiserror::Error;

use crate::types::{AmountField, ProjectId, RelationId, RelationType, TaskId};
use crate::wbs::WbsCode;

/// Bad parent / WBS code / level combinations and other shape violations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("invalid parent: {0}")]
    InvalidParent(String),

    #[error("duplicate WBS code '{0}'")]
    DuplicateWbsCode(WbsCode),

    #[error("duplicate task id {0}")]
    DuplicateTaskId(TaskId),

    #[error("WBS code '{code}' does not sit one level below parent '{parent}'")]
    LevelMismatch { code: WbsCode, parent: WbsCode },

    #[error("invalid WBS code '{0}' (expected dot-separated non-negative integers without leading zeros, e.g. \"2.1.2\")")]
    InvalidWbsCode(String),

    #[error("end date {end} is before start date {start}")]
    InvalidDates { start: NaiveDate, end: NaiveDate },

    #[error("milestone must start and end on the same day (got {start}..{end})")]
    MilestoneSpan { start: NaiveDate, end: NaiveDate },

    #[error("task '{code}' is at level {level}; resourcing is only allowed at level 4 and below")]
    ResourcingBelowWorkPackage { code: WbsCode, level: u32 },

    #[error("task '{code}' is at level {level}; costs are only allowed at level 4 and below")]
    CostBelowWorkPackage { code: WbsCode, level: u32 },

    #[error("resource quantity given without a unit on '{0}'")]
    MissingResourceUnit(WbsCode),

    #[error("relation {predecessor} -> {successor} ({relation_type}) already exists")]
    DuplicateRelation {
        predecessor: TaskId,
        successor: TaskId,
        relation_type: RelationType,
    },

    #[error("duplicate relation id {0}")]
    DuplicateRelationId(RelationId),

    #[error("{0} still has children")]
    HasChildren(TaskId),

    #[error("{0} is still referenced by relations")]
    HasRelations(TaskId),
}

/// Errors raised by the task store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("task not found: {0}")]
    NotFound(TaskId),

    #[error("{field} must not be negative (got {value})")]
    NegativeAmount { field: AmountField, value: f64 },
}

/// Errors raised when adding or removing relations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RelationError {
    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error("relation {predecessor} -> {successor} would create a cycle")]
    CycleDetected {
        predecessor: TaskId,
        successor: TaskId,
    },

    #[error("task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("relation not found: {0}")]
    NotFound(RelationId),
}

/// Errors that abort a recompute pass. Nothing is committed when one of
/// these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecomputeError {
    #[error("broken hierarchy: {task} references missing or misplaced parent {parent}")]
    BrokenHierarchy { task: TaskId, parent: TaskId },

    #[error("dependency graph is not acyclic (cycle through {task})")]
    GraphNotAcyclic { task: TaskId },

    #[error("a relation references unknown {task}")]
    UnknownTask { task: TaskId },
}

/// Errors returned by the project aggregate and the project service.
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    #[error("project already exists: {0}")]
    ProjectExists(ProjectId),

    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Relation(#[from] RelationError),

    #[error(transparent)]
    Recompute(#[from] RecomputeError),

    #[error("persistence error: {0}")]
    Persistence(#[from] anyhow::Error),
}

impl From<StructuralError> for ProjectError {
    fn from(err: StructuralError) -> Self {
        ProjectError::Task(TaskError::Structural(err))
    }
}

#[derive(Error, Debug)]
pub enum WbsError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error(transparent)]
    Project(#[from] ProjectError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WbsError>;
