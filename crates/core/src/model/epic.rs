// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Epic entity: a cohesive grouping of atomic tasks within one project,
//! labeled by functional area (see [`crate::model::task::FunctionalArea`]).

use crate::error::{CoreError, Result};
use crate::ids::{EpicId, ProjectId, TaskId};
use crate::model::task::AtomicTask;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpicStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
    Failed,
}

crate::simple_display! {
    EpicStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Blocked => "blocked",
        Cancelled => "cancelled",
        Failed => "failed",
    }
}

/// An epic. Exclusively owns its atomic tasks (by id).
///
/// Invariant: every task id in `task_ids` belongs to a task whose
/// `project_id` equals this epic's `project_id`. [`Epic::add_task`] is the
/// only mutator that appends to `task_ids`, and it enforces the invariant
/// at the single point of insertion rather than relying on callers to
/// check it themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Epic {
    pub id: EpicId,
    pub project_id: ProjectId,
    pub title: String,
    pub status: EpicStatus,
    pub task_ids: Vec<TaskId>,
    pub depends_on: Vec<EpicId>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Epic {
    pub fn new(id: EpicId, project_id: ProjectId, title: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id,
            project_id,
            title: title.into(),
            status: EpicStatus::Pending,
            task_ids: Vec::new(),
            depends_on: Vec::new(),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    pub fn add_task(&mut self, task: &AtomicTask, now_ms: u64) -> Result<()> {
        if task.project_id != self.project_id {
            return Err(CoreError::validation(format!(
                "task {} belongs to project {} but epic {} belongs to project {}",
                task.id, task.project_id, self.id, self.project_id
            )));
        }
        if !self.task_ids.contains(&task.id) {
            self.task_ids.push(task.id);
            self.updated_at_ms = now_ms;
        }
        Ok(())
    }

    pub fn remove_task(&mut self, task_id: &TaskId, now_ms: u64) {
        self.task_ids.retain(|id| id != task_id);
        self.updated_at_ms = now_ms;
    }
}

#[cfg(test)]
#[path = "epic_tests.rs"]
mod tests;
