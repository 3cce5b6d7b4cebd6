// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Atomicity detector: classifies a task as atomic or decomposable
//! using cheap heuristics first, falling back to an LLM tie-break only
//! when the heuristics disagree with each other.

use crate::project_context::ProjectContext;
use rdd_core::{has_compound_connective, AtomicTask, LlmClient, Result};
use std::sync::Arc;

/// Confidence assigned when every heuristic agrees; no LLM call is made.
const HEURISTIC_CONFIDENCE: f64 = 0.95;
/// Confidence assigned when the LLM's structured response fails schema
/// validation and the detector falls back to the heuristic verdict.
const FALLBACK_CONFIDENCE: f64 = 0.5;
/// Default bound on how many file paths a true atom may reference.
const DEFAULT_MAX_FILE_PATHS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct AtomicityVerdict {
    pub is_atomic: bool,
    pub confidence: f64,
    pub reasoning: String,
    pub estimated_hours: f64,
}

struct Heuristics {
    hours_in_range: bool,
    single_criterion: bool,
    no_compound_connective: bool,
    bounded_paths: bool,
}

impl Heuristics {
    fn evaluate(task: &AtomicTask, max_file_paths: usize) -> Self {
        Self {
            hours_in_range: task.estimated_hours.is_atomic_range(),
            single_criterion: task.acceptance_criteria.len() == 1,
            no_compound_connective: !has_compound_connective(&task.title),
            bounded_paths: task.file_paths.len() <= max_file_paths,
        }
    }

    fn passed(&self) -> u8 {
        [self.hours_in_range, self.single_criterion, self.no_compound_connective, self.bounded_paths]
            .iter()
            .filter(|v| **v)
            .count() as u8
    }

    fn all_pass(&self) -> bool {
        self.passed() == 4
    }

    fn none_pass(&self) -> bool {
        self.passed() == 0
    }
}

pub struct AtomicityDetector {
    llm: Arc<dyn LlmClient>,
    max_file_paths: usize,
}

impl AtomicityDetector {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm, max_file_paths: DEFAULT_MAX_FILE_PATHS }
    }

    pub async fn analyze(&self, task: &AtomicTask, _ctx: &ProjectContext) -> Result<AtomicityVerdict> {
        let heuristics = Heuristics::evaluate(task, self.max_file_paths);

        if heuristics.all_pass() {
            return Ok(AtomicityVerdict {
                is_atomic: true,
                confidence: HEURISTIC_CONFIDENCE,
                reasoning: "all atomicity heuristics satisfied".to_string(),
                estimated_hours: task.estimated_hours.value(),
            });
        }
        if heuristics.none_pass() {
            return Ok(AtomicityVerdict {
                is_atomic: false,
                confidence: HEURISTIC_CONFIDENCE,
                reasoning: "no atomicity heuristics satisfied".to_string(),
                estimated_hours: task.estimated_hours.value(),
            });
        }

        self.llm_tie_break(task, &heuristics).await
    }

    async fn llm_tie_break(&self, task: &AtomicTask, heuristics: &Heuristics) -> Result<AtomicityVerdict> {
        let prompt = format!(
            "Task \"{}\" has {} of 4 atomicity heuristics satisfied. Decide isAtomic.",
            task.title,
            heuristics.passed()
        );
        let schema = atomicity_schema();
        let response = self.llm.complete(&prompt, Some(&schema)).await?;

        match response.json.as_ref().and_then(parse_verdict) {
            Some(verdict) => Ok(verdict),
            None => Ok(AtomicityVerdict {
                is_atomic: heuristics.passed() >= 3,
                confidence: FALLBACK_CONFIDENCE,
                reasoning: "llm response failed schema validation, used heuristic verdict".to_string(),
                estimated_hours: task.estimated_hours.value(),
            }),
        }
    }
}

fn atomicity_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "required": ["isAtomic", "confidence", "reasoning", "estimatedHours"],
        "properties": {
            "isAtomic": {"type": "boolean"},
            "confidence": {"type": "number"},
            "reasoning": {"type": "string"},
            "estimatedHours": {"type": "number"},
        }
    })
}

fn parse_verdict(value: &serde_json::Value) -> Option<AtomicityVerdict> {
    Some(AtomicityVerdict {
        is_atomic: value.get("isAtomic")?.as_bool()?,
        confidence: value.get("confidence")?.as_f64()?,
        reasoning: value.get("reasoning")?.as_str()?.to_string(),
        estimated_hours: value.get("estimatedHours")?.as_f64()?,
    })
}

#[cfg(test)]
#[path = "atomicity_tests.rs"]
mod tests;
