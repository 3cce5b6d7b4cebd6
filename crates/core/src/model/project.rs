// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project entity: the root of the project -> epic -> task ownership tree.

use crate::ids::{EpicId, ProjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
    Failed,
}

crate::simple_display! {
    ProjectStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Blocked => "blocked",
        Cancelled => "cancelled",
        Failed => "failed",
    }
}

/// A project. Exclusively owns its epics (by id); deleting a project
/// cascades to its epics and, transitively, their tasks (enforced by the
/// storage adapter, not this struct).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub epic_ids: Vec<EpicId>,
    pub tech_stack: Vec<String>,
    /// Freeform collaborator-specific config; the engine never inspects
    /// this beyond passing it through to the LLM prompt context.
    pub config: serde_json::Value,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            status: ProjectStatus::Pending,
            epic_ids: Vec::new(),
            tech_stack: Vec::new(),
            config: serde_json::Value::Null,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    pub fn add_epic(&mut self, epic_id: EpicId, now_ms: u64) {
        if !self.epic_ids.contains(&epic_id) {
            self.epic_ids.push(epic_id);
            self.updated_at_ms = now_ms;
        }
    }

    pub fn remove_epic(&mut self, epic_id: &EpicId, now_ms: u64) {
        self.epic_ids.retain(|id| id != epic_id);
        self.updated_at_ms = now_ms;
    }
}

#[cfg(test)]
#[path = "project_tests.rs"]
mod tests;
