// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::execution::{AgentRegistration, ExecutionEngine, ExecutionEngineConfig};
use rdd_core::{ErrorKind, FakeClock, FunctionalArea, TaskPriority};
use std::sync::Arc;

#[derive(Default)]
struct RecordingFeedback {
    events: Mutex<Vec<String>>,
}

#[async_trait]
impl Feedback for Arc<RecordingFeedback> {
    async fn on_task_completed(&self, task_id: TaskId, _agent_id: AgentId) {
        self.events.lock().push(format!("completed:{task_id}"));
    }
    async fn on_help_requested(&self, task_id: TaskId, _agent_id: AgentId, _issue: String) {
        self.events.lock().push(format!("help:{task_id}"));
    }
    async fn on_blocked(&self, task_id: TaskId, _agent_id: AgentId, impact: BlockerImpact, _description: String) {
        self.events.lock().push(format!("blocked:{task_id}:{impact}"));
    }
    async fn on_task_failed(&self, task_id: TaskId, _agent_id: AgentId, _message: Option<String>) {
        self.events.lock().push(format!("failed:{task_id}"));
    }
    async fn on_escalation(&self, task_id: TaskId, _agent_id: AgentId, reason: String) {
        self.events.lock().push(format!("escalated:{task_id}:{reason}"));
    }
}

async fn harness() -> (ExecutionEngineHandle, Arc<RecordingFeedback>, FakeClock, AgentId) {
    let clock = FakeClock::new();
    let engine = ExecutionEngine::spawn(clock.clone(), ExecutionEngineConfig::default());
    let agent_id = AgentId::new();
    engine
        .register_agent(AgentRegistration { id: agent_id, name: "a".into(), capabilities: vec![], max_concurrent: 5 })
        .await
        .unwrap();
    let feedback = Arc::new(RecordingFeedback::default());
    (engine, feedback, clock, agent_id)
}

fn submitted(task_id: TaskId) -> SubmittedTask {
    SubmittedTask { task_id, functional_area: FunctionalArea::Integration, priority: TaskPriority::Medium, timeout: None }
}

#[tokio::test]
async fn completed_reply_completes_the_execution_and_notifies_feedback() {
    let (engine, feedback, clock, agent_id) = harness().await;
    let processor = FeedbackProcessor::new(engine.clone(), feedback.clone(), clock, FeedbackSettings::default());

    let task_id = TaskId::new();
    let execution_id = engine.submit_task(submitted(task_id)).await.unwrap();
    let reply = SentinelReply::Completed { task_id, agent_id, message: None, completion_details: None };

    processor.process(execution_id, reply, None).await.unwrap();

    assert_eq!(engine.get_execution(execution_id).await.unwrap().unwrap().status, rdd_core::ExecutionStatus::Completed);
    assert_eq!(feedback.events.lock().as_slice(), &[format!("completed:{task_id}")]);
    assert_eq!(processor.performance_score(agent_id), 1.0);
}

#[tokio::test]
async fn fourth_open_help_request_triggers_escalation() {
    let (engine, feedback, clock, agent_id) = harness().await;
    let processor = FeedbackProcessor::new(engine.clone(), feedback.clone(), clock, FeedbackSettings::default());

    for _ in 0..4 {
        let task_id = TaskId::new();
        let execution_id = engine.submit_task(submitted(task_id)).await.unwrap();
        let reply = SentinelReply::NeedsHelp {
            task_id,
            agent_id,
            issue_description: "stuck".into(),
            attempted_solutions: vec![],
            specific_questions: vec![],
        };
        processor.process(execution_id, reply, None).await.unwrap();
    }

    let escalations = feedback.events.lock().iter().filter(|e| e.starts_with("escalated:")).count();
    assert_eq!(escalations, 1);
}

#[tokio::test]
async fn critical_blocker_escalates_after_the_configured_delay() {
    let (engine, feedback, clock, agent_id) = harness().await;
    let settings = FeedbackSettings { blocker_escalation_delay: Duration::from_secs(60), ..FeedbackSettings::default() };
    let processor = FeedbackProcessor::new(engine.clone(), feedback.clone(), clock.clone(), settings);

    let task_id = TaskId::new();
    let execution_id = engine.submit_task(submitted(task_id)).await.unwrap();
    let reply = SentinelReply::Blocked {
        task_id,
        agent_id,
        blocker_type: BlockerType::Technical,
        impact: BlockerImpact::Critical,
        description: "critical failure in dependency".into(),
        suggested_resolution: None,
    };
    processor.process(execution_id, reply, None).await.unwrap();

    let now_ms = clock.epoch_ms();
    assert!(processor.check_blocker_escalations(now_ms).is_empty());
    assert!(processor.check_blocker_escalations(now_ms + 61_000).contains(&agent_id));
    // A second check after the same deadline doesn't re-escalate.
    assert!(processor.check_blocker_escalations(now_ms + 61_000).is_empty());
}

#[tokio::test]
async fn failed_reply_auto_retries_exactly_once() {
    let (engine, feedback, clock, agent_id) = harness().await;
    let processor = FeedbackProcessor::new(engine.clone(), feedback.clone(), clock, FeedbackSettings::default());

    let task_id = TaskId::new();
    let execution_id = engine.submit_task(submitted(task_id)).await.unwrap();
    let reply = SentinelReply::Failed { task_id, agent_id, message: Some("panic".into()) };
    processor.process(execution_id, reply.clone(), Some(submitted(task_id))).await.unwrap();

    let executions = engine.get_executions_by_status(rdd_core::ExecutionStatus::Dispatched).await.unwrap();
    assert_eq!(executions.iter().filter(|e| e.task_id == task_id).count(), 1);

    // A second failed reply for the same task must not retry again.
    let retried_execution = executions.iter().find(|e| e.task_id == task_id).unwrap().id;
    processor.process(retried_execution, reply, Some(submitted(task_id))).await.unwrap();
    let executions_after = engine.get_executions_by_status(rdd_core::ExecutionStatus::Dispatched).await.unwrap();
    assert_eq!(executions_after.iter().filter(|e| e.task_id == task_id).count(), 0);
}

#[tokio::test]
async fn reply_to_a_terminal_execution_is_rejected_and_leaves_metrics_untouched() {
    let (engine, feedback, clock, agent_id) = harness().await;
    let processor = FeedbackProcessor::new(engine.clone(), feedback.clone(), clock, FeedbackSettings::default());

    let task_id = TaskId::new();
    let execution_id = engine.submit_task(submitted(task_id)).await.unwrap();
    let reply = SentinelReply::Completed { task_id, agent_id, message: None, completion_details: None };
    processor.process(execution_id, reply.clone(), None).await.unwrap();

    let err = processor.process(execution_id, reply, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidStateTransition);
    assert_eq!(feedback.events.lock().iter().filter(|e| e.starts_with("completed:")).count(), 1);
}
