// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution entity: a single attempt to run an atomic task on an agent.

use crate::ids::{AgentId, ExecutionId, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Submitted, waiting for an agent match ("queued" in the wire
    /// vocabulary; named `Scheduled` here to match the field it fills on
    /// the struct below).
    Scheduled,
    Dispatched,
    Running,
    AwaitingHelp,
    Completed,
    Blocked,
    Failed,
    TimedOut,
    Cancelled,
}

crate::simple_display! {
    ExecutionStatus {
        Scheduled => "scheduled",
        Dispatched => "dispatched",
        Running => "running",
        AwaitingHelp => "awaiting_help",
        Completed => "completed",
        Blocked => "blocked",
        Failed => "failed",
        TimedOut => "timed_out",
        Cancelled => "cancelled",
    }
}

impl ExecutionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Completed
                | ExecutionStatus::Blocked
                | ExecutionStatus::Failed
                | ExecutionStatus::TimedOut
                | ExecutionStatus::Cancelled
        )
    }
}

/// A help request raised by an agent mid-execution (Sentinel `needs_help`
/// reply), recorded so the feedback processor can escalate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelpRequest {
    pub question: String,
    pub context: Option<String>,
    pub raised_at_ms: u64,
}

/// One attempt to execute a task on an agent. A task may accumulate several
/// executions across retries; [`Execution::id`] identifies the attempt, not
/// the task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub task_id: TaskId,
    pub agent_id: AgentId,
    pub status: ExecutionStatus,
    pub attempt: u32,
    pub help_requests: Vec<HelpRequest>,
    pub blocker: Option<String>,
    pub error: Option<String>,
    pub started_at_ms: u64,
    pub dispatched_at_ms: Option<u64>,
    pub updated_at_ms: u64,
    pub completed_at_ms: Option<u64>,
}

impl Execution {
    pub fn new(id: ExecutionId, task_id: TaskId, agent_id: AgentId, attempt: u32, now_ms: u64) -> Self {
        Self {
            id,
            task_id,
            agent_id,
            status: ExecutionStatus::Scheduled,
            attempt,
            help_requests: Vec::new(),
            blocker: None,
            error: None,
            started_at_ms: now_ms,
            dispatched_at_ms: None,
            updated_at_ms: now_ms,
            completed_at_ms: None,
        }
    }

    /// `queued -> dispatched`: an agent has been matched and the task
    /// wire-sent, but the agent hasn't yet acknowledged it is running.
    pub fn dispatch(&mut self, now_ms: u64) {
        self.status = ExecutionStatus::Dispatched;
        self.dispatched_at_ms = Some(now_ms);
        self.updated_at_ms = now_ms;
    }

    /// `dispatched -> running` (also tolerates being called directly from
    /// `scheduled`, for callers that skip the explicit dispatch step).
    pub fn start(&mut self, now_ms: u64) {
        self.status = ExecutionStatus::Running;
        self.updated_at_ms = now_ms;
    }

    /// The watchdog's timeout transition: `dispatched|running -> timed_out`.
    pub fn time_out(&mut self, now_ms: u64) {
        self.status = ExecutionStatus::TimedOut;
        self.completed_at_ms = Some(now_ms);
        self.updated_at_ms = now_ms;
    }

    /// Cancellation is legal from any non-terminal state.
    pub fn cancel(&mut self, now_ms: u64) {
        self.status = ExecutionStatus::Cancelled;
        self.completed_at_ms = Some(now_ms);
        self.updated_at_ms = now_ms;
    }

    pub fn request_help(&mut self, question: impl Into<String>, context: Option<String>, now_ms: u64) {
        self.status = ExecutionStatus::AwaitingHelp;
        self.help_requests.push(HelpRequest { question: question.into(), context, raised_at_ms: now_ms });
        self.updated_at_ms = now_ms;
    }

    pub fn resume(&mut self, now_ms: u64) {
        if self.status == ExecutionStatus::AwaitingHelp {
            self.status = ExecutionStatus::Running;
            self.updated_at_ms = now_ms;
        }
    }

    pub fn complete(&mut self, now_ms: u64) {
        self.status = ExecutionStatus::Completed;
        self.completed_at_ms = Some(now_ms);
        self.updated_at_ms = now_ms;
    }

    pub fn block(&mut self, reason: impl Into<String>, now_ms: u64) {
        self.status = ExecutionStatus::Blocked;
        self.blocker = Some(reason.into());
        self.completed_at_ms = Some(now_ms);
        self.updated_at_ms = now_ms;
    }

    pub fn fail(&mut self, error: impl Into<String>, now_ms: u64) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.completed_at_ms = Some(now_ms);
        self.updated_at_ms = now_ms;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
