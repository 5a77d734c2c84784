// src/model/mod.rs

//! Entities owned by the stores: [`Task`] and [`TaskRelation`].

pub mod relation;
pub mod task;

pub use relation::TaskRelation;
pub use task::{Costs, NewTask, Resourcing, ScheduledDates, Task};
