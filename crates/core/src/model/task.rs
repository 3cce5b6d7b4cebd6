// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomic task entity and the types that encode its atomicity invariants.

use crate::error::{CoreError, Result};
use crate::ids::{AgentId, EpicId, ProjectId, TaskId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Development,
    Testing,
    Documentation,
    Research,
    Deployment,
    Review,
}

crate::simple_display! {
    TaskType {
        Development => "development",
        Testing => "testing",
        Documentation => "documentation",
        Research => "research",
        Deployment => "deployment",
        Review => "review",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

crate::simple_display! {
    TaskPriority {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
    Failed,
}

crate::simple_display! {
    TaskStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Completed => "completed",
        Blocked => "blocked",
        Cancelled => "cancelled",
        Failed => "failed",
    }
}

/// Closed vocabulary for functional-area tags. The RDD engine must never
/// invent a tag outside this set, which is what keeps epics meaningful
/// groupings instead of generic scaffolding buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FunctionalArea {
    Authentication,
    UserManagement,
    ContentManagement,
    DataManagement,
    Integration,
    Admin,
    UiComponents,
    Performance,
    Observability,
    Other,
}

crate::simple_display! {
    FunctionalArea {
        Authentication => "authentication",
        UserManagement => "user-management",
        ContentManagement => "content-management",
        DataManagement => "data-management",
        Integration => "integration",
        Admin => "admin",
        UiComponents => "ui-components",
        Performance => "performance",
        Observability => "observability",
        Other => "other",
    }
}

impl FunctionalArea {
    pub const ALL: &'static [FunctionalArea] = &[
        FunctionalArea::Authentication,
        FunctionalArea::UserManagement,
        FunctionalArea::ContentManagement,
        FunctionalArea::DataManagement,
        FunctionalArea::Integration,
        FunctionalArea::Admin,
        FunctionalArea::UiComponents,
        FunctionalArea::Performance,
        FunctionalArea::Observability,
        FunctionalArea::Other,
    ];
}

/// Estimated effort in hours. Validated positive at construction; the
/// narrower atomic range `(0, 0.17]` is a separate runtime check
/// ([`EstimatedHours::is_atomic_range`]) applied by the atomicity detector,
/// not baked into the type, because non-leaf nodes in the decomposition
/// tree legitimately carry larger estimates before they are broken down.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct EstimatedHours(f64);

impl EstimatedHours {
    pub fn new(hours: f64) -> Result<Self> {
        if !(hours > 0.0) || !hours.is_finite() {
            return Err(CoreError::validation(format!(
                "estimated hours must be positive and finite, got {hours}"
            )));
        }
        Ok(Self(hours))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// True when the estimate falls in the atomic range `(0, 0.17]`
    /// (roughly 5-10 minutes).
    pub fn is_atomic_range(&self) -> bool {
        self.0 > 0.0 && self.0 <= 0.17
    }
}

/// A single acceptance criterion. A true atom carries exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceCriterion(pub String);

const COMPOUND_CONNECTIVES: [&str; 3] = ["and", "or", "then"];

/// Returns true if `title` contains a compound connective as a standalone
/// word (case-insensitive). Matches on word boundaries so "android" or
/// "orchestrate" are not false positives.
pub fn has_compound_connective(title: &str) -> bool {
    title
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| COMPOUND_CONNECTIVES.contains(&word.to_lowercase().as_str()))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskCriteria {
    pub test_criteria: Vec<String>,
    pub performance_criteria: Vec<String>,
    pub quality_criteria: Vec<String>,
}

/// A leaf (or candidate-leaf, pre-atomicity-check) node in the
/// decomposition tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicTask {
    pub id: TaskId,
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub estimated_hours: EstimatedHours,
    pub functional_area: FunctionalArea,
    pub epic_id: EpicId,
    pub project_id: ProjectId,
    pub file_paths: Vec<String>,
    pub acceptance_criteria: Vec<AcceptanceCriterion>,
    pub dependency_ids: Vec<TaskId>,
    pub criteria: TaskCriteria,
    pub assigned_agent: Option<AgentId>,
    pub execution_context: Option<serde_json::Value>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
    pub completed_at_ms: Option<u64>,
    pub actual_hours: Option<f64>,
}

impl AtomicTask {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TaskId,
        title: impl Into<String>,
        task_type: TaskType,
        priority: TaskPriority,
        estimated_hours: EstimatedHours,
        functional_area: FunctionalArea,
        epic_id: EpicId,
        project_id: ProjectId,
        now_ms: u64,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            task_type,
            priority,
            status: TaskStatus::Pending,
            estimated_hours,
            functional_area,
            epic_id,
            project_id,
            file_paths: Vec::new(),
            acceptance_criteria: Vec::new(),
            dependency_ids: Vec::new(),
            criteria: TaskCriteria::default(),
            assigned_agent: None,
            execution_context: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            completed_at_ms: None,
            actual_hours: None,
        }
    }

    /// True iff the task satisfies every structural condition of a true
    /// atom: estimate in range, exactly one acceptance criterion, no
    /// compound connective in the title, functional area from the closed
    /// vocabulary (always true by construction), and no forbidden
    /// scaffolding epic id.
    pub fn satisfies_atomic_invariants(&self, forbidden_epic_ids: &[&str]) -> bool {
        self.estimated_hours.is_atomic_range()
            && self.acceptance_criteria.len() == 1
            && !has_compound_connective(&self.title)
            && !forbidden_epic_ids.contains(&self.epic_id.as_str())
    }

    /// The only path to `Completed`. Enforces invariant: `status=completed
    /// => completedAt != null && actualHours >= 0`.
    pub fn complete(&mut self, actual_hours: f64, now_ms: u64) -> Result<()> {
        if actual_hours < 0.0 {
            return Err(CoreError::validation(format!(
                "actual hours must be non-negative, got {actual_hours}"
            )));
        }
        self.status = TaskStatus::Completed;
        self.completed_at_ms = Some(now_ms);
        self.actual_hours = Some(actual_hours);
        self.updated_at_ms = now_ms;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled | TaskStatus::Failed)
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
