// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background job entity tracked by the job manager.

use crate::ids::JobId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    JobStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }
}

/// A unit of asynchronous work (decomposition session, research fetch,
/// execution run) exposed to clients for progress polling. The job manager
/// is the sole mutator of `status`; [`Job::transition`] performs the
/// compare-and-swap so two pollers racing an update can't clobber each
/// other's terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: String,
    pub status: JobStatus,
    pub progress: f32,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Job {
    pub fn new(id: JobId, kind: impl Into<String>, now_ms: u64) -> Self {
        Self {
            id,
            kind: kind.into(),
            status: JobStatus::Queued,
            progress: 0.0,
            result: None,
            error: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Moves the job to `next` unless it is already in a terminal state.
    /// Returns `false` (no-op) when called on a terminal job, which is how
    /// the job manager avoids racing a late "running" update against an
    /// already-delivered "cancelled".
    pub fn transition(&mut self, next: JobStatus, now_ms: u64) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = next;
        self.updated_at_ms = now_ms;
        true
    }

    pub fn set_progress(&mut self, progress: f32, now_ms: u64) {
        self.progress = progress.clamp(0.0, 1.0);
        self.updated_at_ms = now_ms;
    }

    pub fn succeed(&mut self, result: serde_json::Value, now_ms: u64) -> bool {
        if !self.transition(JobStatus::Completed, now_ms) {
            return false;
        }
        self.progress = 1.0;
        self.result = Some(result);
        true
    }

    pub fn fail(&mut self, error: impl Into<String>, now_ms: u64) -> bool {
        if !self.transition(JobStatus::Failed, now_ms) {
            return false;
        }
        self.error = Some(error.into());
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
