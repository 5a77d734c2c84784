// src/persist/repository.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info, warn};

use super::fs::{FileSystem, RealFileSystem};
use super::record::ProjectRecord;

const RECORD_EXTENSION: &str = "toml";

/// Abstract storage for project records.
pub trait ProjectRepository: Send + Sync {
    fn load(&self, id: &str) -> Result<Option<ProjectRecord>>;
    fn save(&self, record: &ProjectRecord) -> Result<()>;
    /// Ids of every stored project, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// Stores one TOML file per project under `root`.
#[derive(Debug, Clone)]
pub struct FileRepository<F: FileSystem = RealFileSystem> {
    root: PathBuf,
    fs: F,
}

impl FileRepository<RealFileSystem> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_fs(root, RealFileSystem)
    }
}

impl<F: FileSystem> FileRepository<F> {
    pub fn with_fs(root: impl Into<PathBuf>, fs: F) -> Self {
        Self {
            root: root.into(),
            fs,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds the project `id`.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.root
            .join(format!("{}.{RECORD_EXTENSION}", file_stem_for(id)))
    }

    fn read_record(&self, path: &Path) -> Result<ProjectRecord> {
        let text = self.fs.read_to_string(path)?;
        ProjectRecord::from_toml(&text).with_context(|| format!("parsing project file {:?}", path))
    }
}

impl<F: FileSystem> ProjectRepository for FileRepository<F> {
    fn load(&self, id: &str) -> Result<Option<ProjectRecord>> {
        let path = self.path_for(id);
        if !self.fs.exists(&path) {
            debug!(project = id, ?path, "no stored project file");
            return Ok(None);
        }
        let record = self.read_record(&path)?;
        if record.id != id {
            bail!(
                "project file {:?} holds project '{}', expected '{}'",
                path,
                record.id,
                id
            );
        }
        Ok(Some(record))
    }

    /// Write to a temporary sibling, then rename over the target.
    ///
    /// Distinct ids can share a file stem; a target that holds another
    /// project is never overwritten.
    fn save(&self, record: &ProjectRecord) -> Result<()> {
        let path = self.path_for(&record.id);
        if self.fs.exists(&path) {
            let stored = self
                .read_record(&path)
                .with_context(|| format!("refusing to overwrite {:?}", path))?;
            if stored.id != record.id {
                bail!(
                    "project file {:?} already holds project '{}'; not saving '{}' over it",
                    path,
                    stored.id,
                    record.id
                );
            }
        }
        let tmp = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));
        let text = record
            .to_toml()
            .with_context(|| format!("serialising project '{}'", record.id))?;

        self.fs.write(&tmp, text.as_bytes())?;
        self.fs.rename(&tmp, &path)?;
        info!(
            project = %record.id,
            ?path,
            tasks = record.tasks.len(),
            relations = record.relations.len(),
            "project saved"
        );
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.fs.is_dir(&self.root) {
            return Ok(Vec::new());
        }
        let mut ids = Vec::new();
        for path in self.fs.read_dir(&self.root)? {
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match self.read_record(&path) {
                Ok(record) => ids.push(record.id),
                Err(e) => warn!(?path, error = %e, "skipping unreadable project file"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}

/// Keeps records in memory. Used by tests and by the CLI when no output
/// directory is given.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Mutex<BTreeMap<String, ProjectRecord>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProjectRepository for MemoryRepository {
    fn load(&self, id: &str) -> Result<Option<ProjectRecord>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow!("memory repository lock poisoned"))?;
        Ok(records.get(id).cloned())
    }

    fn save(&self, record: &ProjectRecord) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow!("memory repository lock poisoned"))?;
        records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow!("memory repository lock poisoned"))?;
        Ok(records.keys().cloned().collect())
    }
}

/// Lowercase, with every run of other characters collapsed to `_`.
pub fn file_stem_for(id: &str) -> String {
    let stem = id
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .split('_')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        "project".to_string()
    } else {
        stem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::mock::MockFileSystem;

    fn record(id: &str) -> ProjectRecord {
        ProjectRecord {
            id: id.to_string(),
            name: format!("Project {id}"),
            tasks: Vec::new(),
            relations: Vec::new(),
        }
    }

    #[test]
    fn test_file_stem_for() {
        assert_eq!(file_stem_for("My Project"), "my_project");
        assert_eq!(file_stem_for("Bridge-2024/phase 1"), "bridge_2024_phase_1");
        assert_eq!(file_stem_for("../.."), "project");
    }

    #[test]
    fn file_repository_saves_through_a_temp_file() {
        let fs = MockFileSystem::new();
        let repo = FileRepository::with_fs("/store", fs.clone());

        repo.save(&record("Bridge A")).unwrap();

        assert_eq!(fs.paths(), vec![PathBuf::from("/store/bridge_a.toml")]);
        assert_eq!(repo.load("Bridge A").unwrap(), Some(record("Bridge A")));
        assert_eq!(repo.load("missing").unwrap(), None);
        assert_eq!(repo.list().unwrap(), vec!["Bridge A".to_string()]);
    }

    #[test]
    fn file_repository_rejects_colliding_ids() {
        let repo = FileRepository::with_fs("/store", MockFileSystem::new());
        repo.save(&record("bridge a")).unwrap();

        let err = repo.load("Bridge A").unwrap_err();
        assert!(err.to_string().contains("expected 'Bridge A'"), "{err}");
    }

    #[test]
    fn save_refuses_to_replace_another_project_with_the_same_stem() {
        let fs = MockFileSystem::new();
        let repo = FileRepository::with_fs("/store", fs.clone());
        repo.save(&record("bridge a")).unwrap();

        let err = repo.save(&record("Bridge A")).unwrap_err();
        assert!(err.to_string().contains("already holds project 'bridge a'"), "{err}");

        assert_eq!(fs.paths(), vec![PathBuf::from("/store/bridge_a.toml")]);
        assert_eq!(repo.load("bridge a").unwrap(), Some(record("bridge a")));
        assert_eq!(repo.list().unwrap(), vec!["bridge a".to_string()]);

        // Re-saving the owner still replaces its own file.
        let mut renamed = record("bridge a");
        renamed.name = "Renamed".to_string();
        repo.save(&renamed).unwrap();
        assert_eq!(repo.load("bridge a").unwrap(), Some(renamed));
    }

    #[test]
    fn list_skips_foreign_files() {
        let fs = MockFileSystem::new();
        fs.add_file("/store/notes.txt", "hi").unwrap();
        fs.add_file("/store/broken.toml", "not = [valid").unwrap();
        let repo = FileRepository::with_fs("/store", fs);
        repo.save(&record("b")).unwrap();
        repo.save(&record("a")).unwrap();

        assert_eq!(repo.list().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
