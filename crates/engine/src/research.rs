// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-research detector: decides whether a task needs research
//! before decomposition continues, and how deep that research should go.
//! Evaluates a fixed, priority-ordered list of trigger conditions and stops
//! at the first one that fires.

use crate::project_context::ProjectContext;
use rdd_core::ports::{ResearchDepth, ResearchScope};
use rdd_core::{ProjectId, TaskId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Complexity score above which `task_complexity` fires.
const COMPLEXITY_THRESHOLD: f64 = 0.4;
/// Below this file count, `knowledge_gap` fires on sparse codebase signal.
const KNOWLEDGE_GAP_FILE_FLOOR: u32 = 5;
/// Below this relevance, `knowledge_gap` fires on weak retrieval signal.
const KNOWLEDGE_GAP_RELEVANCE_FLOOR: f64 = 0.5;
/// How long a cached decision for a given (task, project) stays valid,
/// checked against the caller-supplied epoch milliseconds rather than
/// wall-clock time, so tests can expire the cache with a [`rdd_core::FakeClock`]
/// instead of sleeping.
const CACHE_TTL_MS: u64 = 300_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    ProjectType,
    TaskComplexity,
    KnowledgeGap,
    DomainSpecific,
    SufficientContext,
}

rdd_core::simple_display! {
    TriggerReason {
        ProjectType => "project_type",
        TaskComplexity => "task_complexity",
        KnowledgeGap => "knowledge_gap",
        DomainSpecific => "domain_specific",
        SufficientContext => "sufficient_context",
    }
}

#[derive(Debug, Clone)]
pub struct ResearchDecision {
    pub should_trigger_research: bool,
    pub primary_reason: TriggerReason,
    pub confidence: f64,
    pub recommended_scope: Option<ResearchScope>,
    pub evaluated_conditions: Vec<(TriggerReason, bool)>,
}

struct CacheEntry {
    decision: ResearchDecision,
    recorded_at_ms: u64,
}

#[derive(Default)]
struct Counters {
    evaluations: u64,
    total_time: Duration,
}

pub struct AutoResearchDetector {
    cache: Mutex<HashMap<(TaskId, ProjectId), CacheEntry>>,
    counters: Mutex<Counters>,
}

impl Default for AutoResearchDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoResearchDetector {
    pub fn new() -> Self {
        Self { cache: Mutex::new(HashMap::new()), counters: Mutex::new(Counters::default()) }
    }

    /// `now_ms` is the caller's current epoch milliseconds (from its
    /// injected [`rdd_core::Clock`]), used both to check cache freshness and
    /// to stamp a freshly computed decision.
    pub fn evaluate(&self, task_id: &TaskId, project_id: &ProjectId, ctx: &ProjectContext, now_ms: u64) -> ResearchDecision {
        let key = (task_id.clone(), project_id.clone());
        if let Some(entry) = self.cache.lock().get(&key) {
            if now_ms.saturating_sub(entry.recorded_at_ms) < CACHE_TTL_MS {
                return entry.decision.clone();
            }
        }

        let start = std::time::Instant::now();
        let decision = self.evaluate_uncached(ctx);
        let elapsed = start.elapsed();

        {
            let mut counters = self.counters.lock();
            counters.evaluations += 1;
            counters.total_time += elapsed;
        }
        self.cache.lock().insert(key, CacheEntry { decision: decision.clone(), recorded_at_ms: now_ms });
        decision
    }

    fn evaluate_uncached(&self, ctx: &ProjectContext) -> ResearchDecision {
        let conditions = [
            (TriggerReason::ProjectType, ctx.is_greenfield()),
            (TriggerReason::TaskComplexity, ctx.complexity_score() > COMPLEXITY_THRESHOLD),
            (
                TriggerReason::KnowledgeGap,
                ctx.total_files < KNOWLEDGE_GAP_FILE_FLOOR || ctx.avg_relevance < KNOWLEDGE_GAP_RELEVANCE_FLOOR,
            ),
            (TriggerReason::DomainSpecific, ctx.is_domain_specific()),
        ];

        for (reason, fired) in conditions.iter() {
            if *fired {
                return ResearchDecision {
                    should_trigger_research: true,
                    primary_reason: *reason,
                    confidence: confidence_for(*reason),
                    recommended_scope: Some(scope_for(*reason)),
                    evaluated_conditions: conditions.to_vec(),
                };
            }
        }

        ResearchDecision {
            should_trigger_research: false,
            primary_reason: TriggerReason::SufficientContext,
            confidence: 0.9,
            recommended_scope: None,
            evaluated_conditions: conditions.to_vec(),
        }
    }

    pub fn evaluation_count(&self) -> u64 {
        self.counters.lock().evaluations
    }

    pub fn average_evaluation_time(&self) -> Duration {
        let counters = self.counters.lock();
        if counters.evaluations == 0 {
            return Duration::ZERO;
        }
        counters.total_time / counters.evaluations as u32
    }
}

fn confidence_for(reason: TriggerReason) -> f64 {
    match reason {
        TriggerReason::ProjectType => 0.95,
        TriggerReason::TaskComplexity => 0.75,
        TriggerReason::KnowledgeGap => 0.7,
        TriggerReason::DomainSpecific => 0.8,
        TriggerReason::SufficientContext => 0.9,
    }
}

fn scope_for(reason: TriggerReason) -> ResearchScope {
    match reason {
        TriggerReason::ProjectType => ResearchScope { depth: ResearchDepth::Deep, estimated_queries: 8 },
        TriggerReason::TaskComplexity => ResearchScope { depth: ResearchDepth::Moderate, estimated_queries: 5 },
        TriggerReason::KnowledgeGap => ResearchScope { depth: ResearchDepth::Moderate, estimated_queries: 4 },
        TriggerReason::DomainSpecific => ResearchScope { depth: ResearchDepth::Targeted, estimated_queries: 3 },
        TriggerReason::SufficientContext => ResearchScope { depth: ResearchDepth::Shallow, estimated_queries: 0 },
    }
}

#[cfg(test)]
#[path = "research_tests.rs"]
mod tests;
