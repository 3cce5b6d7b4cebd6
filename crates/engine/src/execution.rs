// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution engine: the branded-id scheduler/dispatcher that matches
//! queued task executions to registered agents, runs the watchdog, and
//! emits lifecycle events.
//!
//! State (`agents`, `executions`) is owned exclusively by a single loop
//! task; every external call is an [`EngineCommand`] sent over an
//! `mpsc` channel and drained by that loop, so mutation is serialized by
//! construction rather than by locking. [`ExecutionEngineHandle`] is the
//! cheap, cloneable front the rest of the workspace talks to.

use rdd_core::{Agent, AgentId, AgentStatus, Clock, CoreError, Execution, ExecutionId, ExecutionStatus, FunctionalArea, Result, TaskId, TaskPriority, UsageDelta};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Multiplier applied to `max_concurrent_executions` to derive the hard
/// cap on queued + dispatched + running executions.
const QUEUE_FULL_MULTIPLIER: usize = 10;
/// Default watchdog tick interval.
pub const DEFAULT_WATCHDOG_INTERVAL: Duration = Duration::from_secs(6);
/// Default per-execution timeout applied when the task doesn't override it.
pub const DEFAULT_EXECUTION_TIMEOUT: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulingPolicy {
    HybridOptimal,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        SchedulingPolicy::HybridOptimal
    }
}

#[derive(Debug, Clone)]
pub struct AgentRegistration {
    pub id: AgentId,
    pub name: String,
    pub capabilities: Vec<FunctionalArea>,
    pub max_concurrent: u32,
}

#[derive(Debug, Clone)]
pub struct SubmittedTask {
    pub task_id: TaskId,
    pub functional_area: FunctionalArea,
    pub priority: TaskPriority,
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionStatistics {
    pub total: usize,
    pub queued: usize,
    pub dispatched: usize,
    pub running: usize,
    pub completed: usize,
    pub timed_out: usize,
    pub failed: usize,
    pub cancelled: usize,
}

/// Outcome reported back by an agent (or the feedback processor on its
/// behalf) for a dispatched execution.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionResult {
    pub success: bool,
}

pub enum EngineCommand {
    RegisterAgent { agent: AgentRegistration, reply: oneshot::Sender<Result<()>> },
    UnregisterAgent { id: AgentId, reply: oneshot::Sender<Result<()>> },
    UpdateAgentStatus { id: AgentId, status: AgentStatus, usage_delta: Option<UsageDelta>, reply: oneshot::Sender<Result<()>> },
    SubmitTask { task: SubmittedTask, reply: oneshot::Sender<Result<ExecutionId>> },
    CancelExecution { id: ExecutionId, reply: oneshot::Sender<Result<()>> },
    CompleteExecution { id: ExecutionId, result: ExecutionResult, reply: oneshot::Sender<Result<()>> },
    RequestHelp { id: ExecutionId, question: String, reply: oneshot::Sender<Result<()>> },
    ResumeExecution { id: ExecutionId, reply: oneshot::Sender<Result<()>> },
    GetExecution { id: ExecutionId, reply: oneshot::Sender<Option<Execution>> },
    GetExecutionsByStatus { status: ExecutionStatus, reply: oneshot::Sender<Vec<Execution>> },
    GetAgent { id: AgentId, reply: oneshot::Sender<Option<Agent>> },
    GetStatistics { reply: oneshot::Sender<ExecutionStatistics> },
    WatchdogTick { now_ms: u64, reply: oneshot::Sender<Vec<ExecutionId>> },
    Dispose { reply: oneshot::Sender<()> },
}

struct Record {
    execution: Execution,
    priority: TaskPriority,
    functional_area: FunctionalArea,
    timeout: Duration,
    requeued: bool,
}

struct EngineState<C: Clock> {
    clock: C,
    agents: HashMap<AgentId, Agent>,
    executions: HashMap<ExecutionId, Record>,
    /// Queued execution ids, kept sorted by priority (desc) then
    /// submission order — a fresh insertion-stable sort on every enqueue
    /// is adequate at this scale and keeps the preemption rule
    /// (higher-priority tasks always preempt lower-priority queued tasks)
    /// trivially correct.
    queue: Vec<ExecutionId>,
    max_concurrent_executions: usize,
    requeue_on_timeout: bool,
}

impl<C: Clock> EngineState<C> {
    fn queue_capacity(&self) -> usize {
        self.max_concurrent_executions * QUEUE_FULL_MULTIPLIER
    }

    fn in_flight_count(&self) -> usize {
        self.executions
            .values()
            .filter(|r| !r.execution.is_terminal())
            .count()
    }

    fn register_agent(&mut self, reg: AgentRegistration) -> Result<()> {
        let now_ms = self.clock.epoch_ms();
        let mut agent = Agent::new(reg.id, reg.name, reg.max_concurrent.max(1), now_ms);
        agent.capabilities = reg.capabilities;
        self.agents.insert(agent.id, agent);
        info!(agent_id = %reg.id, "agent registered");
        Ok(())
    }

    fn unregister_agent(&mut self, id: &AgentId) -> Result<()> {
        self.agents.remove(id).ok_or_else(|| CoreError::validation(format!("unknown agent {id}")))?;
        info!(agent_id = %id, "agent unregistered");
        Ok(())
    }

    fn update_agent_status(&mut self, id: &AgentId, status: AgentStatus, usage_delta: Option<UsageDelta>) -> Result<()> {
        let now_ms = self.clock.epoch_ms();
        let agent = self.agents.get_mut(id).ok_or_else(|| CoreError::validation(format!("unknown agent {id}")))?;
        agent.status = status;
        agent.updated_at_ms = now_ms;
        if let Some(delta) = usage_delta {
            agent.apply_usage_delta(delta, now_ms);
        }
        Ok(())
    }

    fn submit_task(&mut self, task: SubmittedTask) -> Result<ExecutionId> {
        if self.in_flight_count() >= self.queue_capacity() {
            return Err(CoreError::busy("queue_full"));
        }
        let now_ms = self.clock.epoch_ms();
        let id = ExecutionId::new();
        let execution = Execution::new(id, task.task_id, AgentId::from_string(""), 1, now_ms);
        let timeout = task.timeout.unwrap_or(DEFAULT_EXECUTION_TIMEOUT);
        self.executions.insert(
            id,
            Record { execution, priority: task.priority, functional_area: task.functional_area, timeout, requeued: false },
        );
        self.enqueue(id);
        info!(execution_id = %id, priority = %task.priority, "task submitted");
        Ok(id)
    }

    fn enqueue(&mut self, id: ExecutionId) {
        let priority = self.executions.get(&id).map(|r| r.priority).unwrap_or(TaskPriority::Low);
        let pos = self.queue.iter().position(|q| {
            self.executions.get(q).map(|r| r.priority).unwrap_or(TaskPriority::Low) < priority
        });
        match pos {
            Some(idx) => self.queue.insert(idx, id),
            None => self.queue.push(id),
        }
    }

    fn cancel_execution(&mut self, id: &ExecutionId) -> Result<()> {
        let now_ms = self.clock.epoch_ms();
        let record = self.executions.get_mut(id).ok_or_else(|| CoreError::unknown_task(format!("unknown execution {id}")))?;
        if record.execution.is_terminal() {
            return Ok(());
        }
        let was_dispatched = !matches!(record.execution.status, ExecutionStatus::Scheduled);
        let agent_id = record.execution.agent_id;
        record.execution.cancel(now_ms);
        self.queue.retain(|q| q != id);
        if was_dispatched {
            if let Some(agent) = self.agents.get_mut(&agent_id) {
                agent.release_slot(now_ms);
            }
        }
        Ok(())
    }

    fn complete_execution(&mut self, id: &ExecutionId, result: ExecutionResult) -> Result<()> {
        let now_ms = self.clock.epoch_ms();
        let record = self.executions.get_mut(id).ok_or_else(|| CoreError::unknown_task(format!("unknown execution {id}")))?;
        if record.execution.is_terminal() {
            return Err(CoreError::invalid_state_transition(format!("execution {id} is already terminal")));
        }
        let agent_id = record.execution.agent_id;
        let duration_ms = record.execution.dispatched_at_ms.map(|d| now_ms.saturating_sub(d) as f64).unwrap_or(0.0);
        if result.success {
            record.execution.complete(now_ms);
        } else {
            record.execution.fail("agent reported failure", now_ms);
        }
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            agent.release_slot(now_ms);
            agent.record_outcome(result.success, duration_ms, now_ms);
        }
        Ok(())
    }

    /// Records a `needs_help` reply: the execution moves to
    /// `awaiting_help` but keeps its agent slot reserved, since the agent
    /// is still occupied waiting on an answer rather than free to pick up
    /// other work.
    fn request_help(&mut self, id: &ExecutionId, question: String) -> Result<()> {
        let now_ms = self.clock.epoch_ms();
        let record = self.executions.get_mut(id).ok_or_else(|| CoreError::unknown_task(format!("unknown execution {id}")))?;
        if record.execution.is_terminal() {
            return Err(CoreError::invalid_state_transition(format!("execution {id} is already terminal")));
        }
        record.execution.request_help(question, None, now_ms);
        Ok(())
    }

    fn resume_execution(&mut self, id: &ExecutionId) -> Result<()> {
        let now_ms = self.clock.epoch_ms();
        let record = self.executions.get_mut(id).ok_or_else(|| CoreError::unknown_task(format!("unknown execution {id}")))?;
        record.execution.resume(now_ms);
        Ok(())
    }

    /// Runs one scheduling pass: pops eligible queued executions in
    /// priority order and matches each against the agent-selection
    /// criteria list.
    fn schedule(&mut self) {
        let mut remaining = Vec::new();
        let candidates = std::mem::take(&mut self.queue);
        for id in candidates {
            let area = match self.executions.get(&id) {
                Some(r) => r.functional_area,
                None => continue,
            };
            match self.pick_agent(area) {
                Some(agent_id) => self.dispatch(id, agent_id),
                None => remaining.push(id),
            }
        }
        self.queue = remaining;
    }

    /// Agent-selection criteria, first-satisfying-wins.
    fn pick_agent(&self, area: FunctionalArea) -> Option<AgentId> {
        let idle_capable = self.best_candidate(|a| a.status == AgentStatus::Available && a.can_handle(area));
        if idle_capable.is_some() {
            return idle_capable;
        }
        let idle_any = self.best_candidate(|a| a.status == AgentStatus::Available);
        if idle_any.is_some() {
            return idle_any;
        }
        self.best_candidate(|a| a.status == AgentStatus::Busy && a.active_executions < a.max_concurrent)
    }

    /// Among agents satisfying `pred`, picks the one with the fewest
    /// active executions, breaking ties by highest score then by oldest
    /// `updated_at_ms` (round-robin fairness among equals).
    fn best_candidate(&self, pred: impl Fn(&Agent) -> bool) -> Option<AgentId> {
        self.agents
            .values()
            .filter(|a| pred(a))
            .min_by(|a, b| {
                a.active_executions
                    .cmp(&b.active_executions)
                    .then(b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal))
                    .then(a.updated_at_ms.cmp(&b.updated_at_ms))
            })
            .map(|a| a.id)
    }

    fn dispatch(&mut self, id: ExecutionId, agent_id: AgentId) {
        let now_ms = self.clock.epoch_ms();
        let Some(agent) = self.agents.get_mut(&agent_id) else { return };
        if !agent.try_reserve_slot(now_ms) {
            self.queue.push(id);
            return;
        }
        if let Some(record) = self.executions.get_mut(&id) {
            record.execution.agent_id = agent_id;
            record.execution.dispatch(now_ms);
            info!(execution_id = %id, agent_id = %agent_id, "execution dispatched");
        }
    }

    /// Walks every dispatched/running execution; any whose dispatch time
    /// exceeds its timeout is moved to `timed_out`, its agent slot is
    /// freed, and — if `requeue_on_timeout` is set and it hasn't already
    /// been requeued once — a fresh queued execution is created for the
    /// same task.
    fn watchdog_tick(&mut self, now_ms: u64) -> Vec<ExecutionId> {
        let mut timed_out = Vec::new();
        let mut to_requeue = Vec::new();
        for (id, record) in self.executions.iter_mut() {
            if !matches!(record.execution.status, ExecutionStatus::Dispatched | ExecutionStatus::Running) {
                continue;
            }
            let dispatched_at = match record.execution.dispatched_at_ms {
                Some(t) => t,
                None => continue,
            };
            if now_ms.saturating_sub(dispatched_at) <= record.timeout.as_millis() as u64 {
                continue;
            }
            record.execution.time_out(now_ms);
            timed_out.push(*id);
            if let Some(agent) = self.agents.get_mut(&record.execution.agent_id) {
                agent.release_slot(now_ms);
            }
            if self.requeue_on_timeout && !record.requeued {
                to_requeue.push((record.execution.task_id, record.priority, record.functional_area, record.timeout));
            }
        }
        for id in &timed_out {
            warn!(execution_id = %id, "execution timed out");
        }
        for (task_id, priority, functional_area, timeout) in to_requeue {
            let new_id = ExecutionId::new();
            let execution = Execution::new(new_id, task_id, AgentId::from_string(""), 2, now_ms);
            self.executions.insert(new_id, Record { execution, priority, functional_area, timeout, requeued: true });
            self.enqueue(new_id);
        }
        timed_out
    }

    fn statistics(&self) -> ExecutionStatistics {
        let mut stats = ExecutionStatistics { total: self.executions.len(), ..Default::default() };
        for record in self.executions.values() {
            match record.execution.status {
                ExecutionStatus::Scheduled => stats.queued += 1,
                ExecutionStatus::Dispatched => stats.dispatched += 1,
                ExecutionStatus::Running | ExecutionStatus::AwaitingHelp => stats.running += 1,
                ExecutionStatus::Completed => stats.completed += 1,
                ExecutionStatus::TimedOut => stats.timed_out += 1,
                ExecutionStatus::Failed | ExecutionStatus::Blocked => stats.failed += 1,
                ExecutionStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    fn dispose(&mut self) {
        let now_ms = self.clock.epoch_ms();
        let ids: Vec<ExecutionId> = self
            .executions
            .iter()
            .filter(|(_, r)| !r.execution.is_terminal())
            .map(|(id, _)| *id)
            .collect();
        for id in ids {
            let _ = self.cancel_execution(&id);
        }
        let _ = now_ms;
    }
}

/// Construction parameters for [`ExecutionEngine::spawn`].
#[derive(Debug, Clone)]
pub struct ExecutionEngineConfig {
    pub max_concurrent_executions: usize,
    pub requeue_on_timeout: bool,
    pub policy: SchedulingPolicy,
}

impl Default for ExecutionEngineConfig {
    fn default() -> Self {
        Self { max_concurrent_executions: 10, requeue_on_timeout: true, policy: SchedulingPolicy::HybridOptimal }
    }
}

/// Cheap, cloneable handle to a running execution engine loop.
#[derive(Clone)]
pub struct ExecutionEngineHandle {
    tx: mpsc::Sender<EngineCommand>,
}

pub struct ExecutionEngine;

impl ExecutionEngine {
    /// Spawns the single-loop scheduler task and returns a handle to it.
    /// The loop runs until every handle clone is dropped or `dispose` is
    /// called.
    pub fn spawn<C: Clock>(clock: C, config: ExecutionEngineConfig) -> ExecutionEngineHandle {
        let (tx, mut rx) = mpsc::channel::<EngineCommand>(1024);
        let mut state = EngineState::<C> {
            clock,
            agents: HashMap::new(),
            executions: HashMap::new(),
            queue: Vec::new(),
            max_concurrent_executions: config.max_concurrent_executions,
            requeue_on_timeout: config.requeue_on_timeout,
        };
        let _ = config.policy;

        tokio::spawn(async move {
            while let Some(cmd) = rx.recv().await {
                match cmd {
                    EngineCommand::RegisterAgent { agent, reply } => {
                        let res = state.register_agent(agent);
                        state.schedule();
                        let _ = reply.send(res);
                    }
                    EngineCommand::UnregisterAgent { id, reply } => {
                        let _ = reply.send(state.unregister_agent(&id));
                    }
                    EngineCommand::UpdateAgentStatus { id, status, usage_delta, reply } => {
                        let res = state.update_agent_status(&id, status, usage_delta);
                        state.schedule();
                        let _ = reply.send(res);
                    }
                    EngineCommand::SubmitTask { task, reply } => {
                        let res = state.submit_task(task);
                        state.schedule();
                        let _ = reply.send(res);
                    }
                    EngineCommand::CancelExecution { id, reply } => {
                        let _ = reply.send(state.cancel_execution(&id));
                    }
                    EngineCommand::CompleteExecution { id, result, reply } => {
                        let res = state.complete_execution(&id, result);
                        state.schedule();
                        let _ = reply.send(res);
                    }
                    EngineCommand::RequestHelp { id, question, reply } => {
                        let _ = reply.send(state.request_help(&id, question));
                    }
                    EngineCommand::ResumeExecution { id, reply } => {
                        let _ = reply.send(state.resume_execution(&id));
                    }
                    EngineCommand::GetExecution { id, reply } => {
                        let _ = reply.send(state.executions.get(&id).map(|r| r.execution.clone()));
                    }
                    EngineCommand::GetExecutionsByStatus { status, reply } => {
                        let out = state.executions.values().filter(|r| r.execution.status == status).map(|r| r.execution.clone()).collect();
                        let _ = reply.send(out);
                    }
                    EngineCommand::GetAgent { id, reply } => {
                        let _ = reply.send(state.agents.get(&id).cloned());
                    }
                    EngineCommand::GetStatistics { reply } => {
                        let _ = reply.send(state.statistics());
                    }
                    EngineCommand::WatchdogTick { now_ms, reply } => {
                        let timed_out = state.watchdog_tick(now_ms);
                        state.schedule();
                        let _ = reply.send(timed_out);
                    }
                    EngineCommand::Dispose { reply } => {
                        state.dispose();
                        let _ = reply.send(());
                        break;
                    }
                }
            }
        });

        ExecutionEngineHandle { tx }
    }
}

impl ExecutionEngineHandle {
    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> EngineCommand) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(build(tx)).await.map_err(|_| CoreError::fatal("execution engine loop has shut down"))?;
        rx.await.map_err(|_| CoreError::fatal("execution engine loop dropped the reply channel"))
    }

    pub async fn register_agent(&self, agent: AgentRegistration) -> Result<()> {
        self.call(|reply| EngineCommand::RegisterAgent { agent, reply }).await?
    }

    pub async fn unregister_agent(&self, id: AgentId) -> Result<()> {
        self.call(|reply| EngineCommand::UnregisterAgent { id, reply }).await?
    }

    pub async fn update_agent_status(&self, id: AgentId, status: AgentStatus, usage_delta: Option<UsageDelta>) -> Result<()> {
        self.call(|reply| EngineCommand::UpdateAgentStatus { id, status, usage_delta, reply }).await?
    }

    pub async fn submit_task(&self, task: SubmittedTask) -> Result<ExecutionId> {
        self.call(|reply| EngineCommand::SubmitTask { task, reply }).await?
    }

    pub async fn cancel_execution(&self, id: ExecutionId) -> Result<()> {
        self.call(|reply| EngineCommand::CancelExecution { id, reply }).await?
    }

    pub async fn complete_execution(&self, id: ExecutionId, result: ExecutionResult) -> Result<()> {
        self.call(|reply| EngineCommand::CompleteExecution { id, result, reply }).await?
    }

    pub async fn request_help(&self, id: ExecutionId, question: impl Into<String>) -> Result<()> {
        let question = question.into();
        self.call(|reply| EngineCommand::RequestHelp { id, question, reply }).await?
    }

    pub async fn resume_execution(&self, id: ExecutionId) -> Result<()> {
        self.call(|reply| EngineCommand::ResumeExecution { id, reply }).await?
    }

    pub async fn get_execution(&self, id: ExecutionId) -> Result<Option<Execution>> {
        self.call(|reply| EngineCommand::GetExecution { id, reply }).await
    }

    pub async fn get_executions_by_status(&self, status: ExecutionStatus) -> Result<Vec<Execution>> {
        self.call(|reply| EngineCommand::GetExecutionsByStatus { status, reply }).await
    }

    pub async fn get_agent(&self, id: AgentId) -> Result<Option<Agent>> {
        self.call(|reply| EngineCommand::GetAgent { id, reply }).await
    }

    pub async fn get_statistics(&self) -> Result<ExecutionStatistics> {
        self.call(|reply| EngineCommand::GetStatistics { reply }).await
    }

    /// Drives one watchdog pass at the given logical time. The caller
    /// (typically a `tokio::time::interval` loop in `rdd-server`'s
    /// runtime) supplies `now_ms` so the engine never reads the clock
    /// itself outside its own loop task.
    pub async fn tick_watchdog(&self, now_ms: u64) -> Result<Vec<ExecutionId>> {
        self.call(|reply| EngineCommand::WatchdogTick { now_ms, reply }).await
    }

    /// Cancels every non-terminal execution and stops the loop. Further
    /// calls on this (or any cloned) handle fail with `fatal`.
    pub async fn dispose(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.tx.send(EngineCommand::Dispose { reply: tx }).await.map_err(|_| CoreError::fatal("execution engine loop already shut down"))?;
        rx.await.map_err(|_| CoreError::fatal("execution engine loop dropped the reply channel"))
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
