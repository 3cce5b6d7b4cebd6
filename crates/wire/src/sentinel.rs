// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Sentinel agent reply protocol: the structured message an agent
//! sends back after it has consumed a task.
//!
//! The wire shape is intentionally permissive (every payload field is
//! optional on the raw struct) so [`SentinelReply::parse`] can report a
//! precise `protocol_error` instead of a generic JSON decode failure when a
//! required nested payload is missing for the declared `kind`.

use rdd_core::{AgentId, CoreError, ErrorKind, Result, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerType {
    Dependency,
    Resource,
    Technical,
    Clarification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockerImpact {
    Low,
    Medium,
    High,
    Critical,
}

rdd_core::simple_display! {
    BlockerImpact {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

/// Classifies a blocker description into an impact level from keyword
/// cues: "critical"/"urgent" escalate immediately to `critical`.
pub fn infer_blocker_impact(description: &str) -> BlockerImpact {
    let lowered = description.to_lowercase();
    if lowered.contains("critical") || lowered.contains("urgent") {
        BlockerImpact::Critical
    } else if lowered.contains("blocking") || lowered.contains("severe") {
        BlockerImpact::High
    } else if lowered.contains("minor") {
        BlockerImpact::Low
    } else {
        BlockerImpact::Medium
    }
}

#[derive(Debug, Clone, Deserialize)]
struct HelpRequestPayload {
    issue_description: String,
    #[serde(default)]
    attempted_solutions: Vec<String>,
    #[serde(default)]
    specific_questions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct BlockerDetailsPayload {
    blocker_type: BlockerType,
    description: String,
    #[serde(default)]
    suggested_resolution: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawKind {
    Completed,
    NeedsHelp,
    Blocked,
    Failed,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSentinelReply {
    kind: RawKind,
    #[serde(rename = "taskId")]
    task_id: String,
    #[serde(rename = "agentId")]
    agent_id: String,
    message: Option<String>,
    completion_details: Option<serde_json::Value>,
    help_request: Option<HelpRequestPayload>,
    blocker_details: Option<BlockerDetailsPayload>,
}

/// A parsed, validated agent reply.
#[derive(Debug, Clone)]
pub enum SentinelReply {
    Completed { task_id: TaskId, agent_id: AgentId, message: Option<String>, completion_details: Option<serde_json::Value> },
    NeedsHelp { task_id: TaskId, agent_id: AgentId, issue_description: String, attempted_solutions: Vec<String>, specific_questions: Vec<String> },
    Blocked { task_id: TaskId, agent_id: AgentId, blocker_type: BlockerType, impact: BlockerImpact, description: String, suggested_resolution: Option<String> },
    Failed { task_id: TaskId, agent_id: AgentId, message: Option<String> },
}

impl SentinelReply {
    pub fn task_id(&self) -> &TaskId {
        match self {
            SentinelReply::Completed { task_id, .. }
            | SentinelReply::NeedsHelp { task_id, .. }
            | SentinelReply::Blocked { task_id, .. }
            | SentinelReply::Failed { task_id, .. } => task_id,
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        match self {
            SentinelReply::Completed { agent_id, .. }
            | SentinelReply::NeedsHelp { agent_id, .. }
            | SentinelReply::Blocked { agent_id, .. }
            | SentinelReply::Failed { agent_id, .. } => agent_id,
        }
    }

    /// Decodes and validates a raw JSON reply. Any shape violation —
    /// invalid JSON, an unknown `kind`, a missing required nested payload,
    /// or an empty `taskId`/`agentId` — is reported as `protocol_error`.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let raw: RawSentinelReply = serde_json::from_slice(bytes)
            .map_err(|e| CoreError::with_source(ErrorKind::Protocol, "malformed sentinel reply", Box::new(e)))?;

        let task_id = TaskId::try_from_string(&raw.task_id).map_err(|_| protocol_err("taskId must not be empty"))?;
        let agent_id = AgentId::try_from_string(&raw.agent_id).map_err(|_| protocol_err("agentId must not be empty"))?;

        match raw.kind {
            RawKind::Completed => Ok(SentinelReply::Completed {
                task_id,
                agent_id,
                message: raw.message,
                completion_details: raw.completion_details,
            }),
            RawKind::NeedsHelp => {
                let payload = raw.help_request.ok_or_else(|| protocol_err("needs_help reply missing help_request"))?;
                Ok(SentinelReply::NeedsHelp {
                    task_id,
                    agent_id,
                    issue_description: payload.issue_description,
                    attempted_solutions: payload.attempted_solutions,
                    specific_questions: payload.specific_questions,
                })
            }
            RawKind::Blocked => {
                let payload = raw.blocker_details.ok_or_else(|| protocol_err("blocked reply missing blocker_details"))?;
                let impact = infer_blocker_impact(&payload.description);
                Ok(SentinelReply::Blocked {
                    task_id,
                    agent_id,
                    blocker_type: payload.blocker_type,
                    impact,
                    description: payload.description,
                    suggested_resolution: payload.suggested_resolution,
                })
            }
            RawKind::Failed => Ok(SentinelReply::Failed { task_id, agent_id, message: raw.message }),
        }
    }
}

fn protocol_err(message: &str) -> CoreError {
    CoreError::protocol(message)
}

#[cfg(test)]
#[path = "sentinel_tests.rs"]
mod tests;
