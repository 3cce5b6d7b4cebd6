// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The storage port: abstract CRUD for projects, epics, and atomic
//! tasks, pluggable behind [`StorageAdapter`] the same way the engine stays
//! generic over its collaborator ports.

use async_trait::async_trait;
use rdd_core::{AtomicTask, Epic, EpicStatus, Project, ProjectStatus, Result, TaskStatus};
use rdd_core::{EpicId, ProjectId, TaskId};

#[async_trait]
pub trait StorageAdapter: Send + Sync {
    async fn put_project(&self, project: Project) -> Result<()>;
    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>>;
    async fn delete_project(&self, id: &ProjectId) -> Result<()>;
    async fn projects_by_status(&self, status: ProjectStatus) -> Result<Vec<Project>>;
    async fn search_projects(&self, query: &str) -> Result<Vec<Project>>;

    async fn put_epic(&self, epic: Epic) -> Result<()>;
    async fn get_epic(&self, id: &EpicId) -> Result<Option<Epic>>;
    async fn delete_epic(&self, id: &EpicId) -> Result<()>;
    async fn epics_by_status(&self, status: EpicStatus) -> Result<Vec<Epic>>;

    async fn put_task(&self, task: AtomicTask) -> Result<()>;
    async fn get_task(&self, id: &TaskId) -> Result<Option<AtomicTask>>;
    async fn delete_task(&self, id: &TaskId) -> Result<()>;
    async fn tasks_by_status(&self, status: TaskStatus) -> Result<Vec<AtomicTask>>;
}
