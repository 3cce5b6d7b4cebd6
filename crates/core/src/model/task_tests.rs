// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ids::{EpicId, ProjectId, TaskId};

fn make_task(title: &str, hours: f64) -> AtomicTask {
    AtomicTask::new(
        TaskId::new(),
        title,
        TaskType::Development,
        TaskPriority::Medium,
        EstimatedHours::new(hours).unwrap(),
        FunctionalArea::Authentication,
        EpicId::new(),
        ProjectId::new(),
        0,
    )
}

#[test]
fn estimated_hours_rejects_zero_and_negative() {
    assert!(EstimatedHours::new(0.0).is_err());
    assert!(EstimatedHours::new(-1.0).is_err());
    assert!(EstimatedHours::new(f64::NAN).is_err());
}

#[test]
fn estimated_hours_atomic_range_boundaries() {
    assert!(EstimatedHours::new(0.17).unwrap().is_atomic_range());
    assert!(!EstimatedHours::new(0.18).unwrap().is_atomic_range());
    assert!(EstimatedHours::new(0.01).unwrap().is_atomic_range());
}

#[test]
fn compound_connective_detection_is_word_bounded() {
    assert!(has_compound_connective("Build login and signup"));
    assert!(has_compound_connective("Fetch then render"));
    assert!(has_compound_connective("Validate OR reject"));
    assert!(!has_compound_connective("Build android client"));
    assert!(!has_compound_connective("Orchestrate deployment"));
    assert!(!has_compound_connective("Build user login"));
}

#[test]
fn satisfies_atomic_invariants_requires_every_condition() {
    let mut task = make_task("Build login form", 0.1);
    assert!(!task.satisfies_atomic_invariants(&["E001"]));

    task.acceptance_criteria.push(AcceptanceCriterion("renders a form".into()));
    assert!(task.satisfies_atomic_invariants(&["E001"]));

    let mut with_connective = task.clone();
    with_connective.title = "Build login and signup form".into();
    assert!(!with_connective.satisfies_atomic_invariants(&["E001"]));

    let mut with_big_estimate = task.clone();
    with_big_estimate.estimated_hours = EstimatedHours::new(2.0).unwrap();
    assert!(!with_big_estimate.satisfies_atomic_invariants(&["E001"]));
}

#[test]
fn satisfies_atomic_invariants_rejects_forbidden_epic() {
    let mut task = make_task("Build login form", 0.1);
    task.acceptance_criteria.push(AcceptanceCriterion("renders a form".into()));
    task.epic_id = EpicId::from_string("E001");
    assert!(!task.satisfies_atomic_invariants(&["E001", "E002", "E003", "default-epic"]));
}

#[test]
fn complete_sets_timestamp_and_hours() {
    let mut task = make_task("Build login form", 0.1);
    task.complete(0.15, 500).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.completed_at_ms, Some(500));
    assert_eq!(task.actual_hours, Some(0.15));
}

#[test]
fn complete_rejects_negative_actual_hours() {
    let mut task = make_task("Build login form", 0.1);
    assert!(task.complete(-1.0, 500).is_err());
    assert_eq!(task.status, TaskStatus::Pending);
}
