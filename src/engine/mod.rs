// src/engine/mod.rs

//! Project engine.
//!
//! The pure aggregate lives in [`core`]; the async shell that serialises
//! access per project is implemented in [`service`].

pub mod core;
pub mod report;
pub mod service;

pub use core::Project;
pub use report::{ProjectSummary, RecomputeReport};
pub use service::ProjectService;
