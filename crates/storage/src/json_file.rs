// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference file-backed [`StorageAdapter`]: one JSON file per entity under
//! `{root}/{projects,epics,tasks}/<id>.json`, written via a temp-file-then-
//! rename so a crash never leaves a torn file on disk. Per-id locking keeps
//! concurrent writers from interleaving on the same entity; a lock that is
//! already held surfaces as `busy` rather than blocking the caller.

use crate::adapter::StorageAdapter;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use rdd_core::{AtomicTask, CoreError, Epic, EpicStatus, Project, ProjectStatus, Result, TaskStatus};
use rdd_core::{EpicId, ProjectId, TaskId};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Registry of per-entity-id mutexes. Keyed by `"<kind>:<id>"` so a project
/// and an epic that happen to share a suffix never contend on the same
/// lock.
#[derive(Default)]
struct LockRegistry {
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    fn entry(&self, key: &str) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().get(key) {
            return lock.clone();
        }
        self.locks.write().entry(key.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }
}

pub struct JsonFileStorage {
    root: PathBuf,
    locks: LockRegistry,
}

impl JsonFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        for dir in ["projects", "epics", "tasks"] {
            std::fs::create_dir_all(root.join(dir))
                .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Fatal, format!("creating {dir} dir"), Box::new(e)))?;
        }
        Ok(Self { root, locks: LockRegistry::default() })
    }

    fn path_for(&self, dir: &str, id: &str) -> PathBuf {
        self.root.join(dir).join(format!("{id}.json"))
    }

    fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
        let body = serde_json::to_vec_pretty(value)
            .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Fatal, "serializing entity", Box::new(e)))?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body)
            .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Fatal, "writing temp file", Box::new(e)))?;
        std::fs::rename(&tmp, path)
            .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Fatal, "renaming into place", Box::new(e)))?;
        Ok(())
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match std::fs::read(path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Parse, "decoding entity", Box::new(e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::with_source(rdd_core::ErrorKind::Fatal, "reading entity", Box::new(e))),
        }
    }

    /// Claims the per-id lock for `key`. The returned `Arc` must be kept
    /// alive alongside the guard it produces, since the guard borrows it.
    fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        self.locks.entry(key)
    }

    fn scan_dir<T: serde::de::DeserializeOwned>(&self, dir: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        let read_dir = match std::fs::read_dir(self.root.join(dir)) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(CoreError::with_source(rdd_core::ErrorKind::Fatal, "scanning directory", Box::new(e))),
        };
        for entry in read_dir {
            let entry = entry.map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Fatal, "reading dir entry", Box::new(e)))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(value) = Self::read_json(&path)? {
                out.push(value);
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl StorageAdapter for JsonFileStorage {
    async fn put_project(&self, project: Project) -> Result<()> {
        let lock = self.lock_for(&format!("project:{}", project.id));
        let _guard = lock.try_lock().ok_or_else(|| CoreError::busy(format!("project {} is locked by another writer", project.id)))?;
        Self::write_json(&self.path_for("projects", project.id.as_str()), &project)
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        Self::read_json(&self.path_for("projects", id.as_str()))
    }

    async fn delete_project(&self, id: &ProjectId) -> Result<()> {
        let lock = self.lock_for(&format!("project:{id}"));
        {
            let _guard = lock.try_lock().ok_or_else(|| CoreError::busy(format!("project {id} is locked by another writer")))?;
        }
        let epics: Vec<Epic> = self.scan_dir("epics")?.into_iter().filter(|e: &Epic| &e.project_id == id).collect();
        for epic in epics {
            self.delete_epic(&epic.id).await?;
        }
        let path = self.path_for("projects", id.as_str());
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Fatal, "removing project file", Box::new(e)))?;
        }
        Ok(())
    }

    async fn projects_by_status(&self, status: ProjectStatus) -> Result<Vec<Project>> {
        Ok(self.scan_dir::<Project>("projects")?.into_iter().filter(|p| p.status == status).collect())
    }

    async fn search_projects(&self, query: &str) -> Result<Vec<Project>> {
        let needle = query.to_lowercase();
        Ok(self
            .scan_dir::<Project>("projects")?
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle) || p.description.to_lowercase().contains(&needle))
            .collect())
    }

    async fn put_epic(&self, epic: Epic) -> Result<()> {
        let lock = self.lock_for(&format!("epic:{}", epic.id));
        let _guard = lock.try_lock().ok_or_else(|| CoreError::busy(format!("epic {} is locked by another writer", epic.id)))?;
        Self::write_json(&self.path_for("epics", epic.id.as_str()), &epic)
    }

    async fn get_epic(&self, id: &EpicId) -> Result<Option<Epic>> {
        Self::read_json(&self.path_for("epics", id.as_str()))
    }

    async fn delete_epic(&self, id: &EpicId) -> Result<()> {
        let lock = self.lock_for(&format!("epic:{id}"));
        {
            let _guard = lock.try_lock().ok_or_else(|| CoreError::busy(format!("epic {id} is locked by another writer")))?;
        }
        let tasks: Vec<AtomicTask> = self.scan_dir("tasks")?.into_iter().filter(|t: &AtomicTask| &t.epic_id == id).collect();
        for task in tasks {
            self.delete_task(&task.id).await?;
        }
        let path = self.path_for("epics", id.as_str());
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Fatal, "removing epic file", Box::new(e)))?;
        }
        Ok(())
    }

    async fn epics_by_status(&self, status: EpicStatus) -> Result<Vec<Epic>> {
        Ok(self.scan_dir::<Epic>("epics")?.into_iter().filter(|e| e.status == status).collect())
    }

    async fn put_task(&self, task: AtomicTask) -> Result<()> {
        let lock = self.lock_for(&format!("task:{}", task.id));
        let _guard = lock.try_lock().ok_or_else(|| CoreError::busy(format!("task {} is locked by another writer", task.id)))?;
        Self::write_json(&self.path_for("tasks", task.id.as_str()), &task)
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<AtomicTask>> {
        Self::read_json(&self.path_for("tasks", id.as_str()))
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        let lock = self.lock_for(&format!("task:{id}"));
        let _guard = lock.try_lock().ok_or_else(|| CoreError::busy(format!("task {id} is locked by another writer")))?;
        let path = self.path_for("tasks", id.as_str());
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Fatal, "removing task file", Box::new(e)))?;
        }
        Ok(())
    }

    async fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<AtomicTask>> {
        Ok(self.scan_dir::<AtomicTask>("tasks")?.into_iter().filter(|t| t.status == status).collect())
    }
}

#[cfg(test)]
#[path = "json_file_tests.rs"]
mod tests;
