// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdd_core::ports::fakes::FakeLlmClient;
use rdd_core::ports::LlmResponse;
use rdd_core::{
    AcceptanceCriterion, AtomicTask, EpicId, EstimatedHours, FunctionalArea, ProjectId, TaskId,
    TaskPriority, TaskType,
};

fn base_task(hours: f64, criteria: usize, title: &str, paths: usize) -> AtomicTask {
    let mut task = AtomicTask::new(
        TaskId::new(),
        title,
        TaskType::Development,
        TaskPriority::Medium,
        EstimatedHours::new(hours).unwrap(),
        FunctionalArea::Other,
        EpicId::new(),
        ProjectId::new(),
        0,
    );
    task.acceptance_criteria = (0..criteria).map(|i| AcceptanceCriterion(format!("criterion {i}"))).collect();
    task.file_paths = (0..paths).map(|i| format!("src/file_{i}.rs")).collect();
    task
}

#[tokio::test]
async fn all_heuristics_pass_is_atomic_without_llm_call() {
    let llm = Arc::new(FakeLlmClient::new(vec![]));
    let detector = AtomicityDetector::new(llm.clone());
    let task = base_task(0.1, 1, "Add login button", 1);

    let verdict = detector.analyze(&task, &ProjectContext::default()).await.unwrap();

    assert!(verdict.is_atomic);
    assert_eq!(verdict.confidence, HEURISTIC_CONFIDENCE);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn no_heuristics_pass_is_not_atomic_without_llm_call() {
    let llm = Arc::new(FakeLlmClient::new(vec![]));
    let detector = AtomicityDetector::new(llm.clone());
    let task = base_task(10.0, 3, "Build and ship the authentication and billing systems", 20);

    let verdict = detector.analyze(&task, &ProjectContext::default()).await.unwrap();

    assert!(!verdict.is_atomic);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn mixed_heuristics_defers_to_llm() {
    let response = LlmResponse {
        text: String::new(),
        json: Some(serde_json::json!({
            "isAtomic": true,
            "confidence": 0.8,
            "reasoning": "single well scoped change",
            "estimatedHours": 0.15,
        })),
    };
    let llm = Arc::new(FakeLlmClient::new(vec![response]));
    let detector = AtomicityDetector::new(llm.clone());
    let task = base_task(0.1, 1, "Add login button", 10);

    let verdict = detector.analyze(&task, &ProjectContext::default()).await.unwrap();

    assert!(verdict.is_atomic);
    assert_eq!(verdict.confidence, 0.8);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn malformed_llm_response_falls_back_to_heuristic_verdict() {
    let response = LlmResponse { text: "not json shaped as expected".to_string(), json: None };
    let llm = Arc::new(FakeLlmClient::new(vec![response]));
    let detector = AtomicityDetector::new(llm);
    let task = base_task(0.1, 1, "Add login button", 10);

    let verdict = detector.analyze(&task, &ProjectContext::default()).await.unwrap();

    assert_eq!(verdict.confidence, FALLBACK_CONFIDENCE);
}
