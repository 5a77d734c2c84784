// src/persist/mod.rs

//! Persistence boundary.
//!
//! The core never touches storage. The service converts a project to a
//! [`ProjectRecord`] and hands it to a [`ProjectRepository`].

pub mod fs;
pub mod mock;
pub mod record;
pub mod repository;

pub use fs::{FileSystem, RealFileSystem};
pub use mock::MockFileSystem;
pub use record::{ProjectRecord, RelationRecord, TaskRecord};
pub use repository::{FileRepository, MemoryRepository, ProjectRepository};
