// src/config/mod.rs

//! Project seed files: TOML model, loading, validation and seeding.

pub mod loader;
pub mod model;
pub mod seed;
pub mod validate;

pub use loader::{default_project_path, load_and_validate, load_from_path};
pub use model::{ConfigSection, ProjectFile, ProjectSection, RawProjectFile, SeedRelation, SeedTask};
pub use seed::build_project;
