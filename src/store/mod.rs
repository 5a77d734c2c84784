// src/store/mod.rs

//! Entity stores.
//!
//! - [`tasks`] owns tasks and the parent/child tree.
//! - [`relations`] owns the precedence edges between tasks.
//!
//! The two indices are kept apart: the tree drives rollup, the relations
//! drive scheduling.

pub mod relations;
pub mod tasks;

pub use relations::RelationStore;
pub use tasks::TaskStore;
