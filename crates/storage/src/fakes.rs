// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`StorageAdapter`] for engine/server tests that don't need
//! real file I/O.

use crate::adapter::StorageAdapter;
use async_trait::async_trait;
use parking_lot::Mutex;
use rdd_core::{AtomicTask, Epic, EpicStatus, Project, ProjectStatus, Result, TaskStatus};
use rdd_core::{EpicId, ProjectId, TaskId};
use std::collections::HashMap;

#[derive(Default)]
pub struct FakeStorageAdapter {
    projects: Mutex<HashMap<ProjectId, Project>>,
    epics: Mutex<HashMap<EpicId, Epic>>,
    tasks: Mutex<HashMap<TaskId, AtomicTask>>,
}

impl FakeStorageAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StorageAdapter for FakeStorageAdapter {
    async fn put_project(&self, project: Project) -> Result<()> {
        self.projects.lock().insert(project.id, project);
        Ok(())
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        Ok(self.projects.lock().get(id).cloned())
    }

    async fn delete_project(&self, id: &ProjectId) -> Result<()> {
        let epic_ids: Vec<EpicId> =
            self.epics.lock().values().filter(|e| &e.project_id == id).map(|e| e.id).collect();
        for epic_id in epic_ids {
            self.delete_epic(&epic_id).await?;
        }
        self.projects.lock().remove(id);
        Ok(())
    }

    async fn projects_by_status(&self, status: ProjectStatus) -> Result<Vec<Project>> {
        Ok(self.projects.lock().values().filter(|p| p.status == status).cloned().collect())
    }

    async fn search_projects(&self, query: &str) -> Result<Vec<Project>> {
        let needle = query.to_lowercase();
        Ok(self
            .projects
            .lock()
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle) || p.description.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn put_epic(&self, epic: Epic) -> Result<()> {
        self.epics.lock().insert(epic.id, epic);
        Ok(())
    }

    async fn get_epic(&self, id: &EpicId) -> Result<Option<Epic>> {
        Ok(self.epics.lock().get(id).cloned())
    }

    async fn delete_epic(&self, id: &EpicId) -> Result<()> {
        let task_ids: Vec<TaskId> =
            self.tasks.lock().values().filter(|t| &t.epic_id == id).map(|t| t.id).collect();
        for task_id in task_ids {
            self.tasks.lock().remove(&task_id);
        }
        self.epics.lock().remove(id);
        Ok(())
    }

    async fn epics_by_status(&self, status: EpicStatus) -> Result<Vec<Epic>> {
        Ok(self.epics.lock().values().filter(|e| e.status == status).cloned().collect())
    }

    async fn put_task(&self, task: AtomicTask) -> Result<()> {
        self.tasks.lock().insert(task.id, task);
        Ok(())
    }

    async fn get_task(&self, id: &TaskId) -> Result<Option<AtomicTask>> {
        Ok(self.tasks.lock().get(id).cloned())
    }

    async fn delete_task(&self, id: &TaskId) -> Result<()> {
        self.tasks.lock().remove(id);
        Ok(())
    }

    async fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<AtomicTask>> {
        Ok(self.tasks.lock().values().filter(|t| t.status == status).cloned().collect())
    }
}
