// src/store/relations.rs

//! Relation store: the set of precedence edges of one project.
//!
//! The store checks endpoints and duplicates. Acyclicity is the dependency
//! graph's job; the project aggregate asks the graph before calling
//! [`RelationStore::insert`].

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::errors::{RelationError, StructuralError};
use crate::model::TaskRelation;
use crate::store::TaskStore;
use crate::types::{RelationId, RelationType, TaskId};

#[derive(Debug, Clone, Default)]
pub struct RelationStore {
    relations: BTreeMap<RelationId, TaskRelation>,
    next_id: u64,
}

impl RelationStore {
    pub fn new() -> Self {
        Self {
            relations: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Rebuild from persisted relations. Endpoints must exist, and ids and
    /// `(predecessor, successor, type)` triples must be unique.
    ///
    /// Cycles are not checked here; the scheduler refuses to run on a cyclic
    /// graph.
    pub fn from_records(
        tasks: &TaskStore,
        relations: Vec<TaskRelation>,
    ) -> Result<Self, RelationError> {
        let mut store = Self::new();
        for rel in relations {
            if store.relations.contains_key(&rel.id) {
                return Err(StructuralError::DuplicateRelationId(rel.id).into());
            }
            store.check_endpoints(tasks, rel.predecessor_id, rel.successor_id)?;
            store.check_not_duplicate(rel.predecessor_id, rel.successor_id, rel.relation_type)?;
            store.next_id = store.next_id.max(rel.id.0 + 1);
            store.relations.insert(rel.id, rel);
        }
        debug!(relations = store.relations.len(), "relation store restored from records");
        Ok(store)
    }

    /// Both endpoints must exist and differ.
    pub fn check_endpoints(
        &self,
        tasks: &TaskStore,
        predecessor: TaskId,
        successor: TaskId,
    ) -> Result<(), RelationError> {
        for id in [predecessor, successor] {
            if !tasks.contains(id) {
                return Err(RelationError::TaskNotFound(id));
            }
        }
        if predecessor == successor {
            return Err(RelationError::CycleDetected {
                predecessor,
                successor,
            });
        }
        Ok(())
    }

    pub fn check_not_duplicate(
        &self,
        predecessor: TaskId,
        successor: TaskId,
        relation_type: RelationType,
    ) -> Result<(), RelationError> {
        let exists = self.relations.values().any(|r| {
            r.predecessor_id == predecessor
                && r.successor_id == successor
                && r.relation_type == relation_type
        });
        if exists {
            return Err(StructuralError::DuplicateRelation {
                predecessor,
                successor,
                relation_type,
            }
            .into());
        }
        Ok(())
    }

    /// Store a relation that has already passed every check.
    pub fn insert(
        &mut self,
        predecessor: TaskId,
        successor: TaskId,
        relation_type: RelationType,
        lag: i64,
    ) -> TaskRelation {
        let id = RelationId(self.next_id);
        self.next_id += 1;

        let rel = TaskRelation {
            id,
            predecessor_id: predecessor,
            successor_id: successor,
            relation_type,
            lag,
        };
        self.relations.insert(id, rel);
        info!(
            relation = %id,
            %predecessor,
            %successor,
            relation_type = %relation_type,
            lag,
            "relation created"
        );
        rel
    }

    pub fn remove(&mut self, id: RelationId) -> Result<TaskRelation, RelationError> {
        let rel = self
            .relations
            .remove(&id)
            .ok_or(RelationError::NotFound(id))?;
        info!(relation = %id, "relation deleted");
        Ok(rel)
    }

    pub fn get(&self, id: RelationId) -> Option<&TaskRelation> {
        self.relations.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskRelation> {
        self.relations.values()
    }

    /// Relations that have `task` at either end.
    pub fn involving(&self, task: TaskId) -> impl Iterator<Item = &TaskRelation> {
        self.relations.values().filter(move |r| r.involves(task))
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}
