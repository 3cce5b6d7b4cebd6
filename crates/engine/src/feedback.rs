// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Feedback processor: turns parsed agent replies into execution-engine
//! commands and job-visible outcomes.
//!
//! Depends only on the `Feedback` port, never on `rdd-server` directly, so
//! the dependency points one way: `rdd-engine` defines the seam,
//! `rdd-server` implements it and wires the concrete job manager in.

use crate::execution::{ExecutionEngineHandle, ExecutionResult, SubmittedTask};
use async_trait::async_trait;
use rdd_core::{AgentId, Clock, CoreError, Result, TaskId};
use rdd_wire::sentinel::{BlockerImpact, BlockerType, SentinelReply};
use parking_lot::Mutex;
use rdd_core::ExecutionId;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};

/// Job-visible side effects the feedback processor drives into whatever
/// owns job/session bookkeeping, in `rdd-server`.
#[async_trait]
pub trait Feedback: Send + Sync {
    async fn on_task_completed(&self, task_id: TaskId, agent_id: AgentId);
    async fn on_help_requested(&self, task_id: TaskId, agent_id: AgentId, issue: String);
    async fn on_blocked(&self, task_id: TaskId, agent_id: AgentId, impact: BlockerImpact, description: String);
    async fn on_task_failed(&self, task_id: TaskId, agent_id: AgentId, message: Option<String>);
    /// An agent has accumulated more than `max_help_requests` open help
    /// requests, or a high/critical blocker has sat unresolved past its
    /// escalation delay.
    async fn on_escalation(&self, task_id: TaskId, agent_id: AgentId, reason: String);
}

#[derive(Debug, Clone)]
pub struct FeedbackSettings {
    pub help_request_ttl: Duration,
    pub max_help_requests: u32,
    pub blocker_escalation_delay: Duration,
    pub auto_retry_failed_tasks: bool,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            help_request_ttl: Duration::from_secs(60 * 60),
            max_help_requests: 3,
            blocker_escalation_delay: Duration::from_secs(30 * 60),
            auto_retry_failed_tasks: true,
        }
    }
}

#[derive(Debug, Clone)]
struct HelpRecord {
    raised_at_ms: u64,
    expires_at_ms: u64,
}

#[derive(Debug, Clone)]
struct BlockerRecord {
    impact: BlockerImpact,
    blocker_type: BlockerType,
    escalate_at_ms: Option<u64>,
    escalated: bool,
}

#[derive(Debug, Clone, Default)]
struct AgentStats {
    completed: u64,
    failed: u64,
    help_requests: Vec<HelpRecord>,
    blockers: Vec<BlockerRecord>,
}

/// Tracks per-agent formula inputs independently of [`Agent::score`]
/// (the EMA the execution engine uses internally for scheduling
/// tie-breaks). This is a richer formula surfaced for reporting.
fn performance_score(stats: &AgentStats) -> f64 {
    let total = stats.completed + stats.failed;
    let success_rate = if total == 0 { 1.0 } else { stats.completed as f64 / total as f64 };
    let throughput = if total == 0 { 0.0 } else { (total as f64 / 10.0).min(1.0) };
    let help_rate = if total == 0 { 0.0 } else { (stats.help_requests.len() as f64 / total as f64).min(1.0) };
    let blocker_rate = if total == 0 { 0.0 } else { (stats.blockers.len() as f64 / total as f64).min(1.0) };
    0.4 * success_rate + 0.3 * throughput + 0.2 * (1.0 - help_rate) + 0.1 * (1.0 - blocker_rate)
}

pub struct FeedbackProcessor<C: Clock, F: Feedback> {
    execution: ExecutionEngineHandle,
    feedback: F,
    clock: C,
    settings: FeedbackSettings,
    stats: Mutex<HashMap<AgentId, AgentStats>>,
    retried: Mutex<HashMap<TaskId, bool>>,
}

impl<C: Clock, F: Feedback> FeedbackProcessor<C, F> {
    pub fn new(execution: ExecutionEngineHandle, feedback: F, clock: C, settings: FeedbackSettings) -> Self {
        Self { execution, feedback, clock, settings, stats: Mutex::new(HashMap::new()), retried: Mutex::new(HashMap::new()) }
    }

    /// Consumes one parsed Sentinel reply for the given execution attempt.
    /// `retry_task` supplies the resubmission shape for a `failed` reply;
    /// it is ignored for every other reply kind.
    pub async fn process(&self, execution_id: ExecutionId, reply: SentinelReply, retry_task: Option<SubmittedTask>) -> Result<()> {
        match reply {
            SentinelReply::Completed { task_id, agent_id, .. } => {
                self.execution.complete_execution(execution_id, ExecutionResult { success: true }).await?;
                self.record_outcome(agent_id, true);
                self.feedback.on_task_completed(task_id, agent_id).await;
            }
            SentinelReply::NeedsHelp { task_id, agent_id, issue_description, .. } => {
                self.execution.request_help(execution_id, issue_description.clone()).await?;
                let escalate = self.record_help_request(agent_id);
                self.feedback.on_help_requested(task_id, agent_id, issue_description).await;
                if escalate {
                    self.feedback.on_escalation(task_id, agent_id, "agent exceeded max_help_requests".to_string()).await;
                }
            }
            SentinelReply::Blocked { task_id, agent_id, blocker_type, impact, description, .. } => {
                self.record_blocker(agent_id, blocker_type, impact);
                self.feedback.on_blocked(task_id, agent_id, impact, description).await;
            }
            SentinelReply::Failed { task_id, agent_id, message } => {
                self.execution.complete_execution(execution_id, ExecutionResult { success: false }).await?;
                self.record_outcome(agent_id, false);
                self.feedback.on_task_failed(task_id, agent_id, message.clone()).await;
                if self.settings.auto_retry_failed_tasks {
                    self.maybe_retry(task_id, retry_task).await?;
                }
            }
        }
        Ok(())
    }

    fn record_outcome(&self, agent_id: AgentId, succeeded: bool) {
        let mut stats = self.stats.lock();
        let entry = stats.entry(agent_id).or_default();
        if succeeded {
            entry.completed += 1;
        } else {
            entry.failed += 1;
        }
    }

    /// Returns `true` when this help request pushed the agent over
    /// `max_help_requests` open (non-expired) requests.
    fn record_help_request(&self, agent_id: AgentId) -> bool {
        let now_ms = self.clock.epoch_ms();
        let mut stats = self.stats.lock();
        let entry = stats.entry(agent_id).or_default();
        entry.help_requests.retain(|h| h.expires_at_ms > now_ms);
        entry.help_requests.push(HelpRecord { raised_at_ms: now_ms, expires_at_ms: now_ms + self.settings.help_request_ttl.as_millis() as u64 });
        entry.help_requests.len() as u32 > self.settings.max_help_requests
    }

    fn record_blocker(&self, agent_id: AgentId, blocker_type: BlockerType, impact: BlockerImpact) {
        let now_ms = self.clock.epoch_ms();
        let escalate_at_ms = matches!(impact, BlockerImpact::High | BlockerImpact::Critical)
            .then(|| now_ms + self.settings.blocker_escalation_delay.as_millis() as u64);
        let mut stats = self.stats.lock();
        let entry = stats.entry(agent_id).or_default();
        entry.blockers.push(BlockerRecord { impact, blocker_type, escalate_at_ms, escalated: false });
    }

    async fn maybe_retry(&self, task_id: TaskId, retry_task: Option<SubmittedTask>) -> Result<()> {
        let mut retried = self.retried.lock();
        if *retried.get(&task_id).unwrap_or(&false) {
            return Ok(());
        }
        let Some(task) = retry_task else {
            warn!(%task_id, "auto_retry_failed_tasks is set but no retry task shape was supplied");
            return Ok(());
        };
        retried.insert(task_id, true);
        drop(retried);
        let new_execution = self.execution.submit_task(task).await?;
        info!(%task_id, %new_execution, "failed task auto-retried");
        Ok(())
    }

    /// Walks pending blockers looking for ones whose escalation deadline
    /// has passed and haven't escalated yet, marking them escalated.
    /// Pull-model counterpart to the execution engine's watchdog: the
    /// caller (the runtime's background ticker) drives this with its own
    /// clock reading rather than the processor polling internally.
    pub fn check_blocker_escalations(&self, now_ms: u64) -> Vec<AgentId> {
        let mut escalated = Vec::new();
        let mut stats = self.stats.lock();
        for (agent_id, entry) in stats.iter_mut() {
            for blocker in entry.blockers.iter_mut() {
                if blocker.escalated {
                    continue;
                }
                if let Some(deadline) = blocker.escalate_at_ms {
                    if now_ms >= deadline {
                        blocker.escalated = true;
                        escalated.push(*agent_id);
                    }
                }
            }
        }
        escalated
    }

    pub fn performance_score(&self, agent_id: AgentId) -> f64 {
        let stats = self.stats.lock();
        match stats.get(&agent_id) {
            Some(entry) => performance_score(entry),
            None => 1.0,
        }
    }
}

/// Rejects a reply targeting an execution id the caller has already
/// resolved to a terminal state: a reply to an already-terminal execution
/// is rejected with `invalid_state_transition` and agent metrics are left
/// unchanged. The execution engine itself already enforces this
/// (`complete_execution` on a terminal execution errors before
/// `record_outcome` runs); this helper exists for callers that want
/// to short-circuit before even calling `process`.
pub fn reject_if_terminal(status_is_terminal: bool) -> Result<()> {
    if status_is_terminal {
        return Err(CoreError::invalid_state_transition("execution is already terminal"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "feedback_tests.rs"]
mod tests;
