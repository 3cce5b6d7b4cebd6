// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decomposition session entity: one run of the RDD engine.

use crate::ids::{ProjectId, SessionId, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    SessionStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed | SessionStatus::Cancelled)
    }
}

/// Outcome recorded for a single node visited by the decomposition
/// algorithm, regardless of whether it turned out atomic or was expanded
/// further.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    pub task_id: TaskId,
    pub depth: u32,
    pub was_atomic: bool,
    pub research_triggered: bool,
}

/// Default time-to-live for a terminal session before it becomes evictable.
pub const DEFAULT_SESSION_TTL_MS: u64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecompositionSession {
    pub id: SessionId,
    pub project_id: ProjectId,
    pub root_task_id: TaskId,
    pub status: SessionStatus,
    pub current_depth: u32,
    pub total_tasks: u32,
    pub processed_tasks: u32,
    pub node_results: Vec<NodeResult>,
    pub persisted_task_ids: Vec<TaskId>,
    /// Set when the tree-size or wall-clock cap was hit.
    pub partial: bool,
    pub error: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub ttl_ms: u64,
}

impl DecompositionSession {
    pub fn new(id: SessionId, project_id: ProjectId, root_task_id: TaskId, now_ms: u64) -> Self {
        Self {
            id,
            project_id,
            root_task_id,
            status: SessionStatus::Pending,
            current_depth: 0,
            total_tasks: 0,
            processed_tasks: 0,
            node_results: Vec::new(),
            persisted_task_ids: Vec::new(),
            partial: false,
            error: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            ttl_ms: DEFAULT_SESSION_TTL_MS,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `totalTasks >= processedTasks >= 0` always; terminal implies
    /// `processed == total`.
    pub fn invariants_hold(&self) -> bool {
        let counters_ok = self.total_tasks >= self.processed_tasks;
        let terminal_ok = !self.is_terminal() || self.processed_tasks == self.total_tasks;
        counters_ok && terminal_ok
    }

    pub fn is_evictable(&self, now_ms: u64) -> bool {
        self.is_terminal() && now_ms.saturating_sub(self.updated_at_ms) >= self.ttl_ms
    }

    pub fn cancel(&mut self, now_ms: u64) {
        self.status = SessionStatus::Cancelled;
        self.error = Some("Cancelled by user".to_string());
        self.updated_at_ms = now_ms;
    }

    pub fn complete(&mut self, partial: bool, now_ms: u64) {
        self.status = SessionStatus::Completed;
        self.partial = partial;
        self.updated_at_ms = now_ms;
    }

    pub fn fail(&mut self, error: impl Into<String>, now_ms: u64) {
        self.status = SessionStatus::Failed;
        self.error = Some(error.into());
        self.updated_at_ms = now_ms;
    }

    pub fn record_node(&mut self, result: NodeResult, now_ms: u64) {
        self.processed_tasks += 1;
        self.current_depth = self.current_depth.max(result.depth);
        self.node_results.push(result);
        self.updated_at_ms = now_ms;
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
