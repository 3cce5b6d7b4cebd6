// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdd_core::ports::fakes::{FakeLlmClient, FakeResearchProvider};
use rdd_core::ports::LlmResponse;
use rdd_core::{FakeClock, ProjectId};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

fn llm_json(value: serde_json::Value) -> LlmResponse {
    LlmResponse { text: value.to_string(), json: Some(value) }
}

fn atomicity_verdict(is_atomic: bool) -> serde_json::Value {
    serde_json::json!({
        "isAtomic": is_atomic,
        "confidence": 0.9,
        "reasoning": "llm tie-break",
        "estimatedHours": 0.1,
    })
}

fn atomic_children(n: usize) -> serde_json::Value {
    let children: Vec<_> = (0..n)
        .map(|i| {
            serde_json::json!({
                "title": format!("Wire endpoint {i}"),
                "description": "single atomic leaf",
                "estimatedHours": 0.1,
                "functionalArea": "integration",
                "acceptanceCriteria": ["endpoint responds"],
            })
        })
        .collect();
    serde_json::json!({ "children": children })
}

/// A root node shaped so the atomicity heuristics are indeterminate (not
/// all 4 pass, so it isn't trivially atomic) and require the LLM
/// tie-break, matching the only reachable path into the non-atomic branch
/// once the compound-connective pre-split has already run.
fn indeterminate_root(title: &str) -> DraftNode {
    let mut node = DraftNode::root(title, "needs a tie-break");
    node.estimated_hours = 10.0;
    node.file_paths = vec!["a".into(), "b".into(), "c".into(), "d".into()];
    node
}

#[tokio::test]
async fn already_atomic_root_returns_single_leaf_without_decomposition_call() {
    let clock = FakeClock::new();
    let llm = Arc::new(FakeLlmClient::new(vec![]));
    let engine = RddEngine::new(clock, llm, None, DecompositionLimits::default());
    let project_id = ProjectId::new();
    let mut ctx = ProjectContext::default();

    let mut root = DraftNode::root("Add login button", "single atomic leaf");
    root.estimated_hours = 0.1;
    root.acceptance_criteria = vec!["button renders".to_string()];
    root.functional_area = FunctionalArea::Authentication;

    let outcome = engine.decompose(root, &project_id, &mut ctx, &AtomicBool::new(false)).await.expect("decompose");

    assert_eq!(outcome.tasks.len(), 1);
    assert!(!outcome.partial);
    assert!(outcome.error.is_none());
    assert!(outcome.tasks[0].satisfies_atomic_invariants(&FORBIDDEN_EPIC_IDS));
}

#[tokio::test]
async fn non_atomic_root_expands_into_atomic_leaves_with_real_epics() {
    let clock = FakeClock::new();
    let llm = Arc::new(FakeLlmClient::new(vec![llm_json(atomicity_verdict(false)), llm_json(atomic_children(2))]));
    let engine = RddEngine::new(clock, llm, None, DecompositionLimits::default());
    let project_id = ProjectId::new();
    let mut ctx = ProjectContext { total_files: 10, avg_relevance: 0.9, ..Default::default() };

    let outcome = engine
        .decompose(indeterminate_root("Build the integration surface"), &project_id, &mut ctx, &AtomicBool::new(false))
        .await
        .expect("decompose");

    assert_eq!(outcome.tasks.len(), 2);
    assert_eq!(outcome.epics.len(), 1);
    assert!(outcome.tasks.iter().all(|t| t.functional_area == FunctionalArea::Integration));
    assert!(outcome.tasks.iter().all(|t| t.satisfies_atomic_invariants(&FORBIDDEN_EPIC_IDS)));
}

#[tokio::test]
async fn compound_connective_title_is_split_before_reaching_the_llm() {
    let clock = FakeClock::new();
    let llm = Arc::new(FakeLlmClient::new(vec![]));
    let engine = RddEngine::new(clock, llm, None, DecompositionLimits::default());
    let project_id = ProjectId::new();
    let mut ctx = ProjectContext::default();

    let mut root = DraftNode::root("Build login and build logout", "two atoms joined");
    root.estimated_hours = 0.1;
    root.acceptance_criteria = vec!["works".to_string()];

    let outcome = engine.decompose(root, &project_id, &mut ctx, &AtomicBool::new(false)).await.expect("decompose");

    assert_eq!(outcome.tasks.len(), 2);
    assert!(outcome.tasks.iter().all(|t| !rdd_core::has_compound_connective(&t.title)));
}

#[tokio::test]
async fn tree_size_cap_marks_session_partial() {
    let clock = FakeClock::new();
    let llm = Arc::new(FakeLlmClient::new(vec![llm_json(atomicity_verdict(false)), llm_json(atomic_children(5))]));
    let limits = DecompositionLimits { max_tree_size: 3, ..DecompositionLimits::default() };
    let engine = RddEngine::new(clock, llm, None, limits);
    let project_id = ProjectId::new();
    let mut ctx = ProjectContext::default();

    let outcome = engine
        .decompose(indeterminate_root("Build a huge integration surface"), &project_id, &mut ctx, &AtomicBool::new(false))
        .await
        .expect("decompose");

    assert!(outcome.partial);
    assert_eq!(outcome.tasks.len(), 3);
}

#[tokio::test]
async fn llm_failure_surfaces_as_partial_with_error() {
    let clock = FakeClock::new();
    // One response settles the atomicity tie-break as non-atomic; every
    // subsequent call (the decomposition call and its retries) finds the
    // fake exhausted and fails.
    let llm = Arc::new(FakeLlmClient::new(vec![llm_json(atomicity_verdict(false))]));
    let limits = DecompositionLimits { retry_initial: Duration::from_millis(1), retry_cap: Duration::from_millis(2), ..DecompositionLimits::default() };
    let engine = RddEngine::new(clock, llm, None, limits);
    let project_id = ProjectId::new();
    let mut ctx = ProjectContext::default();

    let outcome = engine
        .decompose(indeterminate_root("Build a complicated integration"), &project_id, &mut ctx, &AtomicBool::new(false))
        .await
        .expect("decompose");

    assert!(outcome.partial);
    assert!(outcome.error.is_some());
    assert!(outcome.tasks.is_empty());
}

#[tokio::test]
async fn depth_guard_forces_a_leaf_regardless_of_atomicity() {
    let clock = FakeClock::new();
    let llm = Arc::new(FakeLlmClient::new(vec![]));
    let limits = DecompositionLimits { max_depth: 0, ..DecompositionLimits::default() };
    let engine = RddEngine::new(clock, llm, None, limits);
    let project_id = ProjectId::new();
    let mut ctx = ProjectContext::default();

    let outcome = engine
        .decompose(indeterminate_root("Build an enormous distributed integration"), &project_id, &mut ctx, &AtomicBool::new(false))
        .await
        .expect("decompose");

    assert_eq!(outcome.tasks.len(), 1);
    assert!(!outcome.partial);
}

#[tokio::test]
async fn preset_cancel_flag_stops_before_the_first_atomicity_decision() {
    let clock = FakeClock::new();
    let llm = Arc::new(FakeLlmClient::new(vec![]));
    let engine = RddEngine::new(clock, llm, None, DecompositionLimits::default());
    let project_id = ProjectId::new();
    let mut ctx = ProjectContext::default();
    let cancel = AtomicBool::new(true);

    let mut root = DraftNode::root("Build login", "would have been atomic");
    root.estimated_hours = 0.1;
    root.acceptance_criteria = vec!["works".to_string()];

    let outcome = engine.decompose(root, &project_id, &mut ctx, &cancel).await.expect("decompose");

    assert!(outcome.partial);
    assert_eq!(outcome.error.as_deref(), Some("cancelled"));
    assert!(outcome.tasks.is_empty());
}

#[tokio::test]
async fn greenfield_project_triggers_research_before_decomposing() {
    let clock = FakeClock::new();
    let llm = Arc::new(FakeLlmClient::new(vec![llm_json(atomic_children(1))]));
    let research = Arc::new(FakeResearchProvider { context: "framework docs".to_string() });
    let engine = RddEngine::new(clock, llm.clone(), Some(research), DecompositionLimits::default());
    let project_id = ProjectId::new();
    let mut ctx = ProjectContext { total_files: 0, ..Default::default() };

    // None of the four atomicity heuristics pass, so this root is
    // unambiguously non-atomic without needing an LLM tie-break: out of
    // range hours, no single acceptance criterion, and more file paths
    // than a true atom may reference.
    let mut root = DraftNode::root("Scaffold greenfield service", "needs research before it can be broken down");
    root.estimated_hours = 8.0;
    root.file_paths = vec!["a".into(), "b".into(), "c".into(), "d".into()];

    let outcome = engine.decompose(root, &project_id, &mut ctx, &AtomicBool::new(false)).await.expect("decompose");

    // The root itself is never atomic, so it contributes no leaf
    // `NodeResult` — only the one child the fake LLM handed back does, and
    // research never fires for that already-atomic child.
    assert_eq!(outcome.node_results.len(), 1);
    assert!(!outcome.node_results[0].research_triggered);
    assert_eq!(llm.call_count(), 1, "exactly one decompose call, no atomicity tie-break needed");
    assert!(!ctx.research_notes.is_empty(), "research must run once before the non-atomic root is decomposed");
}
