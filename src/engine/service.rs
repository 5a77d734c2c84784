// src/engine/service.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::config::{ProjectFile, build_project};
use crate::errors::{ProjectError, TaskError, WbsError};
use crate::ids::ActivityIdAllocator;
use crate::model::{NewTask, Task, TaskRelation};
use crate::persist::{MemoryRepository, ProjectRecord, ProjectRepository};
use crate::types::{ProjectId, RelationId, RelationType, TaskId};
use crate::wbs::WbsCode;

use super::core::Project;
use super::report::{ProjectSummary, RecomputeReport};

type ProjectHandle = Arc<RwLock<Project>>;

/// Async shell around [`Project`] aggregates, keyed by project id.
///
/// Each project sits behind its own `RwLock`: mutations and recompute take
/// the write lock, queries take the read lock. Readers therefore never see
/// a half-committed recompute, and different projects never block each
/// other.
///
/// The activity ID allocator is shared by every project of the service.
/// It is always locked after the project lock.
pub struct ProjectService {
    projects: RwLock<HashMap<ProjectId, ProjectHandle>>,
    ids: Mutex<ActivityIdAllocator>,
    repo: Arc<dyn ProjectRepository>,
}

impl fmt::Debug for ProjectService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProjectService").finish_non_exhaustive()
    }
}

impl ProjectService {
    pub fn new(repo: Arc<dyn ProjectRepository>) -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            ids: Mutex::new(ActivityIdAllocator::new()),
            repo,
        }
    }

    /// Service backed by a [`MemoryRepository`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryRepository::new()))
    }

    async fn project(&self, id: &str) -> Result<ProjectHandle, ProjectError> {
        self.projects
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ProjectError::ProjectNotFound(id.to_string()))
    }

    /// Run a repository call on the blocking pool; file repositories do
    /// synchronous IO.
    async fn with_repo<T, F>(&self, f: F) -> Result<T, ProjectError>
    where
        F: FnOnce(&dyn ProjectRepository) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let repo = Arc::clone(&self.repo);
        let out = tokio::task::spawn_blocking(move || f(repo.as_ref()))
            .await
            .context("repository task failed")?;
        Ok(out?)
    }

    async fn insert(&self, project: Project) -> Result<(), ProjectError> {
        let mut projects = self.projects.write().await;
        if projects.contains_key(project.id()) {
            return Err(ProjectError::ProjectExists(project.id().to_string()));
        }
        info!(project = %project.id(), tasks = project.tasks().len(), "project registered");
        projects.insert(project.id().to_string(), Arc::new(RwLock::new(project)));
        Ok(())
    }

    pub async fn create_project(
        &self,
        id: impl Into<ProjectId>,
        name: impl Into<String>,
    ) -> Result<(), ProjectError> {
        self.insert(Project::new(id, name)).await
    }

    /// Ids of the projects currently held by the service, sorted.
    pub async fn project_ids(&self) -> Vec<ProjectId> {
        let mut ids: Vec<ProjectId> = self.projects.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn create_task(
        &self,
        project_id: &str,
        parent_wbs: Option<&WbsCode>,
        fields: NewTask,
    ) -> Result<Task, ProjectError> {
        let handle = self.project(project_id).await?;
        let mut project = handle.write().await;
        let mut ids = self.ids.lock().await;
        project.create_task(&mut ids, parent_wbs, fields)
    }

    pub async fn create_relation(
        &self,
        project_id: &str,
        predecessor: TaskId,
        successor: TaskId,
        relation_type: RelationType,
        lag: i64,
    ) -> Result<TaskRelation, ProjectError> {
        let handle = self.project(project_id).await?;
        let mut project = handle.write().await;
        project.create_relation(predecessor, successor, relation_type, lag)
    }

    pub async fn delete_relation(
        &self,
        project_id: &str,
        relation: RelationId,
    ) -> Result<TaskRelation, ProjectError> {
        let handle = self.project(project_id).await?;
        let mut project = handle.write().await;
        project.delete_relation(relation)
    }

    pub async fn delete_task(&self, project_id: &str, task: TaskId) -> Result<Task, ProjectError> {
        let handle = self.project(project_id).await?;
        let mut project = handle.write().await;
        project.delete_task(task)
    }

    pub async fn update_cost_fields(
        &self,
        project_id: &str,
        task: TaskId,
        labor: f64,
        material: f64,
        other: f64,
    ) -> Result<Task, ProjectError> {
        let handle = self.project(project_id).await?;
        let mut project = handle.write().await;
        project.update_cost_fields(task, labor, material, other)
    }

    pub async fn update_dates(
        &self,
        project_id: &str,
        task: TaskId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Task, ProjectError> {
        let handle = self.project(project_id).await?;
        let mut project = handle.write().await;
        project.update_dates(task, start, end)
    }

    pub async fn recompute_project(&self, project_id: &str) -> Result<RecomputeReport, ProjectError> {
        let handle = self.project(project_id).await?;
        let mut project = handle.write().await;
        project.recompute()
    }

    pub async fn get_project_summary(&self, project_id: &str) -> Result<ProjectSummary, ProjectError> {
        let handle = self.project(project_id).await?;
        let project = handle.read().await;
        Ok(project.summary())
    }

    pub async fn get_task(&self, project_id: &str, task: TaskId) -> Result<Task, ProjectError> {
        let handle = self.project(project_id).await?;
        let project = handle.read().await;
        project
            .task(task)
            .cloned()
            .ok_or_else(|| TaskError::NotFound(task).into())
    }

    /// Owned copies of `task` and its descendants, pre-order.
    pub async fn subtree(&self, project_id: &str, task: TaskId) -> Result<Vec<Task>, ProjectError> {
        let handle = self.project(project_id).await?;
        let project = handle.read().await;
        Ok(project.subtree(task)?.into_iter().cloned().collect())
    }

    /// Consistent copy of a project, taken under its read lock.
    pub async fn snapshot(&self, project_id: &str) -> Result<ProjectRecord, ProjectError> {
        let handle = self.project(project_id).await?;
        let project = handle.read().await;
        Ok(ProjectRecord::from_project(&project))
    }

    pub async fn save_project(&self, project_id: &str) -> Result<(), ProjectError> {
        let record = self.snapshot(project_id).await?;
        self.with_repo(move |repo| repo.save(&record)).await
    }

    /// Load a stored project into the service. The allocator moves past
    /// every stored activity ID.
    pub async fn load_project(&self, project_id: &str) -> Result<(), ProjectError> {
        if self.projects.read().await.contains_key(project_id) {
            return Err(ProjectError::ProjectExists(project_id.to_string()));
        }
        let id = project_id.to_string();
        let record = self
            .with_repo(move |repo| repo.load(&id))
            .await?
            .ok_or_else(|| ProjectError::ProjectNotFound(project_id.to_string()))?;

        let project = {
            let mut ids = self.ids.lock().await;
            record.into_project(&mut ids)?
        };
        debug!(project = project_id, "project loaded from repository");
        self.insert(project).await
    }

    /// Ids of every project the repository holds.
    pub async fn stored_projects(&self) -> Result<Vec<ProjectId>, ProjectError> {
        self.with_repo(|repo| repo.list()).await
    }

    /// Build a project from a validated seed file and register it.
    pub async fn seed(&self, file: &ProjectFile) -> Result<ProjectId, WbsError> {
        let id = file.project.id.clone();
        if self.projects.read().await.contains_key(&id) {
            return Err(ProjectError::ProjectExists(id).into());
        }
        let project = {
            let mut ids = self.ids.lock().await;
            build_project(file, &mut ids)?
        };
        self.insert(project).await?;
        Ok(id)
    }
}
