// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Decomposition service: session lifecycle around the RDD engine. Owns
//! the session table behind the same reader-writer discipline the job
//! manager uses, and issues the cooperative-cancel flag each running
//! session's `RddEngine::decompose` call polls.

use crate::project_context::ProjectContext;
use crate::rdd::{DecompositionOutcome, DraftNode, RddEngine};
use parking_lot::RwLock;
use rdd_core::{Clock, CoreError, DecompositionSession, ProjectId, Result, SessionId, SessionStatus, TaskId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct DecompositionRequest {
    pub project_id: ProjectId,
    pub root: DraftNode,
    pub context: ProjectContext,
}

struct SessionEntry {
    session: DecompositionSession,
    cancel: Arc<AtomicBool>,
    outcome: Option<DecompositionOutcome>,
}

pub struct DecompositionService<C: Clock> {
    engine: Arc<RddEngine<C>>,
    clock: C,
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl<C: Clock> DecompositionService<C> {
    pub fn new(engine: Arc<RddEngine<C>>, clock: C) -> Self {
        Self { engine, clock, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Registers a new session and spawns the decomposition run in the
    /// background; returns immediately with the session id so callers can
    /// poll `get_session` for progress, matching the job-manager pattern
    /// (long-running work tracked by id, not awaited end to end).
    pub fn start_decomposition(&self, request: DecompositionRequest) -> SessionId {
        let now_ms = self.clock.epoch_ms();
        let session_id = SessionId::new();
        let root_task_id = TaskId::new();
        let mut session = DecompositionSession::new(session_id, request.project_id.clone(), root_task_id, now_ms);
        session.status = SessionStatus::InProgress;
        let cancel = Arc::new(AtomicBool::new(false));
        self.sessions.write().insert(session_id, SessionEntry { session, cancel: cancel.clone(), outcome: None });

        let engine = self.engine.clone();
        let clock = self.clock.clone();
        let sessions = self.sessions.clone();
        let DecompositionRequest { project_id, root, mut context } = request;

        tokio::spawn(async move {
            let result = engine.decompose(root, &project_id, &mut context, &cancel).await;
            let now_ms = clock.epoch_ms();
            let mut sessions = sessions.write();
            let Some(entry) = sessions.get_mut(&session_id) else { return };
            match result {
                Ok(outcome) => {
                    for node_result in outcome.node_results.clone() {
                        entry.session.record_node(node_result, now_ms);
                    }
                    entry.session.total_tasks = outcome.tasks.len() as u32;
                    entry.session.persisted_task_ids = outcome.tasks.iter().map(|t| t.id).collect();
                    if cancel.load(Ordering::Relaxed) {
                        entry.session.cancel(now_ms);
                    } else if let Some(err) = outcome.error.clone() {
                        entry.session.fail(err, now_ms);
                    } else {
                        entry.session.complete(outcome.partial, now_ms);
                    }
                    entry.outcome = Some(outcome);
                }
                Err(e) => entry.session.fail(e.to_string(), now_ms),
            }
        });

        session_id
    }

    pub fn get_session(&self, id: &SessionId) -> Option<DecompositionSession> {
        self.sessions.read().get(id).map(|e| e.session.clone())
    }

    /// Flips the cooperative-cancel flag for a running session. A no-op
    /// on an already-terminal session; the session's own terminal status
    /// from completion or failure is never overwritten by a late cancel.
    pub fn cancel_session(&self, id: &SessionId) -> Result<()> {
        let sessions = self.sessions.read();
        let entry = sessions.get(id).ok_or_else(|| CoreError::unknown_session(format!("unknown session {id}")))?;
        if !entry.session.is_terminal() {
            entry.cancel.store(true, Ordering::Relaxed);
        }
        Ok(())
    }

    /// Returns the finished outcome, or `None` while still in progress.
    pub fn get_results(&self, id: &SessionId) -> Option<DecompositionOutcome> {
        self.sessions.read().get(id).and_then(|e| e.outcome.clone())
    }

    /// Serializes the session plus its outcome (if any) for external
    /// export, e.g. handing a completed decomposition tree to a caller
    /// that wants the raw JSON rather than polling the live API.
    pub fn export_session(&self, id: &SessionId) -> Result<serde_json::Value> {
        let sessions = self.sessions.read();
        let entry = sessions.get(id).ok_or_else(|| CoreError::unknown_session(format!("unknown session {id}")))?;
        Ok(serde_json::json!({
            "session": entry.session,
            "tasks": entry.outcome.as_ref().map(|o| &o.tasks),
            "epics": entry.outcome.as_ref().map(|o| &o.epics),
        }))
    }

    /// Evicts terminal sessions past their TTL; returns how many were
    /// removed.
    pub fn cleanup_sessions(&self) -> usize {
        let now_ms = self.clock.epoch_ms();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.session.is_evictable(now_ms));
        before - sessions.len()
    }
}

#[cfg(test)]
#[path = "decomposition_service_tests.rs"]
mod tests;
