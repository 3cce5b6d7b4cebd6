// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The runtime root: the single explicitly-constructed owner of every
//! subsystem. No singletons — the roots are constructed once in the
//! process entry point and passed by reference, with lifecycle bounded
//! by `start`/`shutdown`.

use crate::config::RuntimeConfig;
use crate::events::{EventKind, EventNotifier};
use crate::jobs::{JobManager, DEFAULT_MAX_JOBS};
use async_trait::async_trait;
use parking_lot::Mutex;
use rdd_core::{AgentId, Clock, JobId, LlmClient, Result, ResearchProvider, SessionId, TaskId};
use rdd_core::model::TransportKind;
use rdd_engine::{
    DecompositionService, ExecutionEngine, ExecutionEngineConfig, ExecutionEngineHandle, Feedback, FeedbackProcessor, FeedbackSettings,
    RddEngine,
};
use rdd_storage::StorageAdapter;
use rdd_transport::{HttpTransport, SseTransport, StdioTransport, TransportManager, TransportSpec, WebSocketTransport};
use rdd_wire::sentinel::BlockerImpact;
use std::collections::HashMap;
use std::sync::Arc;

/// Links a submitted task back to the job and session it's reported
/// through, since a Sentinel reply only carries `task_id`/`agent_id`.
#[derive(Debug, Clone, Copy)]
struct TaskJobLink {
    session_id: SessionId,
    job_id: JobId,
}

/// Bridges the feedback processor's reply callbacks into job-visible
/// state and the event stream.
struct JobFeedbackSink<C: Clock> {
    jobs: Arc<JobManager<C>>,
    events: Arc<EventNotifier>,
    links: Mutex<HashMap<TaskId, TaskJobLink>>,
}

impl<C: Clock> JobFeedbackSink<C> {
    fn new(jobs: Arc<JobManager<C>>, events: Arc<EventNotifier>) -> Self {
        Self { jobs, events, links: Mutex::new(HashMap::new()) }
    }

    fn link_task(&self, task_id: TaskId, session_id: SessionId, job_id: JobId) {
        self.links.lock().insert(task_id, TaskJobLink { session_id, job_id });
    }

    fn lookup(&self, task_id: &TaskId) -> Option<TaskJobLink> {
        self.links.lock().get(task_id).copied()
    }
}

#[async_trait]
impl<C: Clock> Feedback for JobFeedbackSink<C> {
    async fn on_task_completed(&self, task_id: TaskId, agent_id: AgentId) {
        let Some(link) = self.lookup(&task_id) else { return };
        let _ = self.jobs.set_result(&link.job_id, serde_json::json!({"agent_id": agent_id.to_string()}), true);
        self.events.publish(link.session_id, link.job_id, EventKind::Terminal, serde_json::json!({"status": "completed"}));
    }

    async fn on_help_requested(&self, task_id: TaskId, agent_id: AgentId, issue: String) {
        let Some(link) = self.lookup(&task_id) else { return };
        self.events.publish(
            link.session_id,
            link.job_id,
            EventKind::Status,
            serde_json::json!({"status": "needs_help", "agent_id": agent_id.to_string(), "issue": issue}),
        );
    }

    async fn on_blocked(&self, task_id: TaskId, agent_id: AgentId, impact: BlockerImpact, description: String) {
        let Some(link) = self.lookup(&task_id) else { return };
        self.events.publish(
            link.session_id,
            link.job_id,
            EventKind::Status,
            serde_json::json!({"status": "blocked", "agent_id": agent_id.to_string(), "impact": impact.to_string(), "description": description}),
        );
    }

    async fn on_task_failed(&self, task_id: TaskId, _agent_id: AgentId, message: Option<String>) {
        let Some(link) = self.lookup(&task_id) else { return };
        let _ = self.jobs.set_result(&link.job_id, serde_json::json!({"error": message}), false);
        self.events.publish(link.session_id, link.job_id, EventKind::Terminal, serde_json::json!({"status": "failed"}));
    }

    async fn on_escalation(&self, task_id: TaskId, agent_id: AgentId, reason: String) {
        let Some(link) = self.lookup(&task_id) else { return };
        self.events.publish(
            link.session_id,
            link.job_id,
            EventKind::Log,
            serde_json::json!({"status": "escalated", "agent_id": agent_id.to_string(), "reason": reason}),
        );
    }
}

/// Owns every subsystem for the lifetime of the process. Built once at
/// startup via [`Runtime::start`], torn down once via
/// [`Runtime::shutdown`].
pub struct Runtime<C: Clock> {
    pub jobs: Arc<JobManager<C>>,
    pub events: Arc<EventNotifier>,
    pub transport: Arc<TransportManager<C>>,
    pub decomposition: Arc<DecompositionService<C>>,
    pub execution: ExecutionEngineHandle,
    pub storage: Arc<dyn StorageAdapter>,
    feedback_sink: Arc<JobFeedbackSink<C>>,
    feedback: Arc<FeedbackProcessor<C, SinkHandle<C>>>,
    config: RuntimeConfig,
}

/// Newtype wrapper so `Feedback` (foreign to this crate) can be
/// implemented for a handle wrapping `Arc<JobFeedbackSink<C>>` (also
/// foreign, via `Arc`) without violating the orphan rules.
pub struct SinkHandle<C: Clock>(Arc<JobFeedbackSink<C>>);

impl<C: Clock> Clone for SinkHandle<C> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[async_trait]
impl<C: Clock> Feedback for SinkHandle<C> {
    async fn on_task_completed(&self, task_id: TaskId, agent_id: AgentId) {
        JobFeedbackSink::on_task_completed(&self.0, task_id, agent_id).await
    }
    async fn on_help_requested(&self, task_id: TaskId, agent_id: AgentId, issue: String) {
        JobFeedbackSink::on_help_requested(&self.0, task_id, agent_id, issue).await
    }
    async fn on_blocked(&self, task_id: TaskId, agent_id: AgentId, impact: BlockerImpact, description: String) {
        JobFeedbackSink::on_blocked(&self.0, task_id, agent_id, impact, description).await
    }
    async fn on_task_failed(&self, task_id: TaskId, agent_id: AgentId, message: Option<String>) {
        JobFeedbackSink::on_task_failed(&self.0, task_id, agent_id, message).await
    }
    async fn on_escalation(&self, task_id: TaskId, agent_id: AgentId, reason: String) {
        JobFeedbackSink::on_escalation(&self.0, task_id, agent_id, reason).await
    }
}

impl<C: Clock> Runtime<C> {
    pub fn new(
        clock: C,
        config: RuntimeConfig,
        llm: Arc<dyn LlmClient>,
        research: Option<Arc<dyn ResearchProvider>>,
        storage: Arc<dyn StorageAdapter>,
    ) -> Self {
        let jobs = Arc::new(JobManager::new(clock.clone(), DEFAULT_MAX_JOBS));
        let events = Arc::new(EventNotifier::new(crate::events::DEFAULT_HIGH_WATERMARK));

        let rdd_engine = Arc::new(RddEngine::new(clock.clone(), llm, research, Default::default()));
        let decomposition = Arc::new(DecompositionService::new(rdd_engine, clock.clone()));

        let execution = ExecutionEngine::spawn(
            clock.clone(),
            ExecutionEngineConfig { max_concurrent_executions: config.max_concurrent_tasks as usize, ..Default::default() },
        );

        let feedback_sink = Arc::new(JobFeedbackSink::new(jobs.clone(), events.clone()));
        let feedback =
            Arc::new(FeedbackProcessor::new(execution.clone(), SinkHandle(feedback_sink.clone()), clock.clone(), FeedbackSettings::default()));

        let specs = vec![
            TransportSpec { enabled: true, transport: Arc::new(StdioTransport), port_config: None },
            TransportSpec {
                enabled: true,
                transport: Arc::new(WebSocketTransport::default()),
                port_config: Some(port_selection(&config.websocket_port, 0)),
            },
            TransportSpec {
                enabled: true,
                transport: Arc::new(HttpTransport::default()),
                port_config: Some(port_selection(&config.http_agent_port, 0)),
            },
            TransportSpec {
                enabled: true,
                transport: Arc::new(SseTransport::default()),
                port_config: Some(port_selection(&config.sse_port, 0)),
            },
        ];
        let transport = Arc::new(TransportManager::new(clock.clone(), "127.0.0.1", specs));

        Self { jobs, events, transport, decomposition, execution, storage, feedback_sink, feedback, config }
    }

    /// Registers the (task, session, job) link the feedback sink needs to
    /// translate an agent reply back into job/event updates. Callers (the
    /// MCP tool surface) call this right after `create_job` + submitting
    /// the task to the execution engine.
    pub fn link_task_to_job(&self, task_id: TaskId, session_id: SessionId, job_id: JobId) {
        self.feedback_sink.link_task(task_id, session_id, job_id);
    }

    pub fn feedback(&self) -> &Arc<FeedbackProcessor<C, SinkHandle<C>>> {
        &self.feedback
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Starts every configured transport. Individual transport failures
    /// degrade gracefully; only an unrecoverable setup error here is
    /// surfaced.
    pub async fn start(&self) -> Result<()> {
        self.transport.start_all().await
    }

    /// Stops transports and cancels every in-flight execution. Idempotent
    /// with respect to the execution engine (`dispose` on an already-
    /// disposed handle returns `fatal`, which callers should log and
    /// ignore during shutdown).
    pub async fn shutdown(&self) -> Result<()> {
        self.transport.stop_all().await?;
        let _ = self.execution.dispose().await;
        Ok(())
    }

    pub fn started_transports(&self) -> Vec<TransportKind> {
        self.transport.started_kinds()
    }
}

fn port_selection(cfg: &rdd_transport::PortSelectionConfig, preferred: u16) -> rdd_transport::PortSelectionConfig {
    rdd_transport::PortSelectionConfig { preferred, ..cfg.clone() }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
