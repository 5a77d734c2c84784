// src/dag/mod.rs

//! Dependency graph and scheduling.
//!
//! - [`graph`] holds the adjacency view over a project's relations, the
//!   cycle check and the deterministic topological order.
//! - [`scheduler`] runs the forward/backward date passes.
//! - [`outcome`] defines what a scheduling pass returns.

pub mod graph;
pub mod outcome;
pub mod scheduler;

pub use graph::{DependencyGraph, Edge};
pub use outcome::{Advisory, ScheduleOutcome, ScheduleSlipped};
pub use scheduler::Scheduler;
