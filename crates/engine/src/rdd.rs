// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RDD engine: the recursive decomposition algorithm. Breaks a root
//! task down into atomic leaves, calling the atomicity detector at
//! every candidate node and the auto-research detector before each
//! LLM-backed expansion.

use crate::atomicity::AtomicityDetector;
use crate::epics::assign_epic;
use crate::project_context::ProjectContext;
use crate::research::AutoResearchDetector;
use indexmap::IndexMap;
use rdd_core::ports::{LlmClient, ResearchProvider};
use rdd_core::{
    AcceptanceCriterion, AtomicTask, Clock, CoreError, Epic, EpicId, EstimatedHours, FunctionalArea,
    NodeResult, ProjectId, Result, TaskCriteria, TaskId, TaskPriority, TaskType,
};
use std::sync::Arc;
use std::time::Duration;

/// Hard ceiling on recursion depth; a node still not atomic at this depth
/// is forced into a leaf rather than recursing forever.
const DEFAULT_MAX_DEPTH: u32 = 6;
/// Default tree-size cap: decomposition returns partial once the leaf
/// count reaches this many tasks.
const DEFAULT_MAX_TREE_SIZE: usize = 500;
/// Default wall-clock budget for one decomposition run.
const DEFAULT_WALL_CLOCK_BUDGET: Duration = Duration::from_secs(120);
/// LLM retry policy: exponential backoff starting at 1s, doubling, capped
/// at 30s, 3 attempts total.
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_INITIAL: Duration = Duration::from_secs(1);
const DEFAULT_RETRY_CAP: Duration = Duration::from_secs(30);

/// Scaffolding epic ids the engine refuses to accept from the LLM; any
/// task arriving with one of these gets a real, functional-area-derived
/// epic instead of carrying a meaningless placeholder forward.
pub const FORBIDDEN_EPIC_IDS: [&str; 4] = ["E001", "E002", "E003", "default-epic"];

#[derive(Debug, Clone)]
pub struct DecompositionLimits {
    pub max_depth: u32,
    pub max_tree_size: usize,
    pub wall_clock_budget: Duration,
    pub retry_attempts: u32,
    pub retry_initial: Duration,
    pub retry_cap: Duration,
}

impl Default for DecompositionLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_tree_size: DEFAULT_MAX_TREE_SIZE,
            wall_clock_budget: DEFAULT_WALL_CLOCK_BUDGET,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
            retry_initial: DEFAULT_RETRY_INITIAL,
            retry_cap: DEFAULT_RETRY_CAP,
        }
    }
}

/// A candidate node awaiting an atomicity decision. Not yet a persisted
/// [`AtomicTask`]; fields mirror it loosely so a draft can be promoted to
/// one once the detector confirms it is a true atom.
#[derive(Debug, Clone)]
pub struct DraftNode {
    pub title: String,
    pub description: String,
    pub estimated_hours: f64,
    pub functional_area: FunctionalArea,
    pub acceptance_criteria: Vec<String>,
    pub file_paths: Vec<String>,
    pub depth: u32,
}

impl DraftNode {
    pub fn root(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            estimated_hours: 8.0,
            functional_area: FunctionalArea::Other,
            acceptance_criteria: Vec::new(),
            file_paths: Vec::new(),
            depth: 0,
        }
    }

    fn to_probe_task(&self, project_id: &ProjectId) -> Result<AtomicTask> {
        let mut task = AtomicTask::new(
            TaskId::new(),
            self.title.clone(),
            TaskType::Development,
            TaskPriority::Medium,
            EstimatedHours::new(self.estimated_hours)?,
            self.functional_area,
            EpicId::new(),
            project_id.clone(),
            0,
        );
        task.description = self.description.clone();
        task.acceptance_criteria = self.acceptance_criteria.iter().map(|c| AcceptanceCriterion(c.clone())).collect();
        task.file_paths = self.file_paths.clone();
        Ok(task)
    }
}

#[derive(Debug, Clone)]
pub struct DecompositionOutcome {
    pub tasks: Vec<AtomicTask>,
    pub epics: Vec<Epic>,
    pub node_results: Vec<NodeResult>,
    pub partial: bool,
    pub error: Option<String>,
}

/// The raw shape an LLM decomposition response must conform to.
#[derive(Debug, Clone, serde::Deserialize)]
struct ChildSpec {
    title: String,
    description: String,
    #[serde(rename = "estimatedHours")]
    estimated_hours: f64,
    #[serde(rename = "functionalArea", default)]
    functional_area: Option<String>,
    #[serde(rename = "acceptanceCriteria", default)]
    acceptance_criteria: Vec<String>,
    #[serde(rename = "filePaths", default)]
    file_paths: Vec<String>,
}

pub struct RddEngine<C: Clock> {
    clock: C,
    atomicity: AtomicityDetector,
    research: AutoResearchDetector,
    llm: Arc<dyn LlmClient>,
    research_provider: Option<Arc<dyn ResearchProvider>>,
    limits: DecompositionLimits,
}

impl<C: Clock> RddEngine<C> {
    pub fn new(
        clock: C,
        llm: Arc<dyn LlmClient>,
        research_provider: Option<Arc<dyn ResearchProvider>>,
        limits: DecompositionLimits,
    ) -> Self {
        Self {
            clock,
            atomicity: AtomicityDetector::new(llm.clone()),
            research: AutoResearchDetector::new(),
            llm,
            research_provider,
            limits,
        }
    }

    /// `cancel` is the cooperative-cancel flag a [`crate::decomposition_service::DecompositionService`]
    /// session hands in; it is polled once per queued node, right before
    /// the atomicity decision for that node, so an in-flight LLM call is
    /// never aborted mid-flight but the next candidate is never started
    /// either.
    pub async fn decompose(
        &self,
        root: DraftNode,
        project_id: &ProjectId,
        ctx: &mut ProjectContext,
        cancel: &std::sync::atomic::AtomicBool,
    ) -> Result<DecompositionOutcome> {
        let start = self.clock.now();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back(root);

        let mut tasks = Vec::new();
        let mut epics: IndexMap<FunctionalArea, Epic> = IndexMap::new();
        let mut node_results = Vec::new();
        let mut partial = false;
        let mut error = None;

        'outer: while let Some(node) = queue.pop_front() {
            if tasks.len() >= self.limits.max_tree_size {
                partial = true;
                break;
            }
            if self.clock.now().duration_since(start) >= self.limits.wall_clock_budget {
                partial = true;
                break;
            }
            if cancel.load(std::sync::atomic::Ordering::Relaxed) {
                partial = true;
                error = Some("cancelled".to_string());
                break;
            }

            if let Some(split) = split_on_compound_connective(&node) {
                queue.push_back(split.0);
                queue.push_back(split.1);
                continue;
            }

            let forced_leaf = node.depth >= self.limits.max_depth;
            let probe = node.to_probe_task(project_id)?;
            let verdict = if forced_leaf {
                None
            } else {
                Some(self.atomicity.analyze(&probe, ctx).await?)
            };
            let is_atomic = forced_leaf || verdict.as_ref().map(|v| v.is_atomic).unwrap_or(false);

            if is_atomic {
                let depth = node.depth;
                let task = self.finalize_leaf(node, project_id, &mut epics);
                node_results.push(NodeResult { task_id: task.id, depth, was_atomic: true, research_triggered: false });
                tasks.push(task);
                continue;
            }

            let research_triggered = self.maybe_research(&node, project_id, ctx).await;

            match self.llm_decompose(&node).await {
                Ok(children) => {
                    for child in children {
                        queue.push_back(child);
                    }
                }
                Err(e) => {
                    error = Some(e.to_string());
                    partial = true;
                    break 'outer;
                }
            }
        }

        Ok(DecompositionOutcome { tasks, epics: epics.into_values().collect(), node_results, partial, error })
    }

    async fn maybe_research(&self, node: &DraftNode, project_id: &ProjectId, ctx: &mut ProjectContext) -> bool {
        let probe_id = TaskId::new();
        let decision = self.research.evaluate(&probe_id, project_id, ctx, self.clock.epoch_ms());
        if !decision.should_trigger_research {
            return false;
        }
        if let (Some(provider), Some(scope)) = (self.research_provider.as_ref(), decision.recommended_scope.as_ref())
        {
            if let Ok(notes) = provider.research(&node.title, scope).await {
                ctx.append_research(notes);
            }
        }
        true
    }

    fn finalize_leaf(
        &self,
        node: DraftNode,
        project_id: &ProjectId,
        epics: &mut IndexMap<FunctionalArea, Epic>,
    ) -> AtomicTask {
        let now_ms = self.clock.epoch_ms();
        let epic = assign_epic(epics, node.functional_area, project_id.clone(), now_ms);

        let mut task = AtomicTask::new(
            TaskId::new(),
            node.title,
            TaskType::Development,
            TaskPriority::Medium,
            EstimatedHours::new(node.estimated_hours.clamp(0.01, 0.17)).unwrap_or_else(|_| {
                EstimatedHours::new(0.17).expect("0.17 is a valid positive estimate")
            }),
            node.functional_area,
            epic.id,
            project_id.clone(),
            now_ms,
        );
        task.description = node.description;
        task.acceptance_criteria = if node.acceptance_criteria.is_empty() {
            vec![AcceptanceCriterion("behavior matches the task description".to_string())]
        } else {
            node.acceptance_criteria.into_iter().take(1).map(AcceptanceCriterion).collect()
        };
        task.file_paths = node.file_paths;
        let _ = epic.add_task(&task, now_ms);
        task
    }

    async fn llm_decompose(&self, node: &DraftNode) -> Result<Vec<DraftNode>> {
        let schema = decompose_schema();
        let prompt = format!(
            "Decompose \"{}\" ({}) into smaller child tasks.",
            node.title, node.description
        );

        let mut attempt = 0;
        let mut backoff = self.limits.retry_initial;
        loop {
            match self.llm.complete(&prompt, Some(&schema)).await {
                Ok(response) => {
                    let children = parse_children(&response, node.depth + 1)?;
                    return Ok(children);
                }
                Err(e) => {
                    attempt += 1;
                    if attempt >= self.limits.retry_attempts {
                        return Err(e);
                    }
                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, self.limits.retry_cap);
                }
            }
        }
    }
}

fn parse_children(response: &rdd_core::ports::LlmResponse, child_depth: u32) -> Result<Vec<DraftNode>> {
    let json = response
        .json
        .as_ref()
        .ok_or_else(|| CoreError::parse("llm decomposition response was not structured json"))?;
    let specs: Vec<ChildSpec> = serde_json::from_value(json.get("children").cloned().unwrap_or(json.clone()))
        .map_err(|e| CoreError::with_source(rdd_core::ErrorKind::Parse, "failed to parse decomposition children", e))?;

    if specs.is_empty() {
        return Err(CoreError::parse("decomposition response produced no children"));
    }

    Ok(specs
        .into_iter()
        .map(|spec| DraftNode {
            title: spec.title,
            description: spec.description,
            estimated_hours: spec.estimated_hours,
            functional_area: spec
                .functional_area
                .as_deref()
                .and_then(parse_functional_area)
                .unwrap_or(FunctionalArea::Other),
            acceptance_criteria: spec.acceptance_criteria,
            file_paths: spec.file_paths,
            depth: child_depth,
        })
        .collect())
}

fn parse_functional_area(s: &str) -> Option<FunctionalArea> {
    FunctionalArea::ALL.iter().find(|a| a.to_string() == s).copied()
}

fn decompose_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["children"],
        "properties": {
            "children": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["title", "description", "estimatedHours"],
                }
            }
        }
    })
}

const COMPOUND_CONNECTIVES: [&str; 3] = ["and", "or", "then"];

/// If `node`'s title contains a compound connective, split it into two
/// sibling drafts at the same depth rather than letting it masquerade as
/// one atom; matches the atomicity invariant enforced in
/// [`rdd_core::has_compound_connective`].
fn split_on_compound_connective(node: &DraftNode) -> Option<(DraftNode, DraftNode)> {
    let words: Vec<&str> = node.title.split_whitespace().collect();
    let idx = words.iter().position(|w| {
        let bare = w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        COMPOUND_CONNECTIVES.contains(&bare.as_str())
    })?;

    let left = words[..idx].join(" ");
    let right = words[idx + 1..].join(" ");
    if left.is_empty() || right.is_empty() {
        return None;
    }

    let mut first = node.clone();
    first.title = left;
    let mut second = node.clone();
    second.title = right;
    Some((first, second))
}

#[cfg(test)]
#[path = "rdd_tests.rs"]
mod tests;
