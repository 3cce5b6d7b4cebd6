// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdd_core::{EpicId, ProjectId, TaskId};
use rdd_core::{AtomicTask, Epic, EstimatedHours, FunctionalArea, Project, TaskPriority, TaskType};
use tempfile::tempdir;

fn make_project() -> Project {
    Project::new(ProjectId::new(), "Demo", 0)
}

#[tokio::test]
async fn put_then_get_round_trips() {
    let dir = tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path()).unwrap();
    let project = make_project();
    storage.put_project(project.clone()).await.unwrap();
    let fetched = storage.get_project(&project.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, project.id);
    assert_eq!(fetched.name, project.name);
}

#[tokio::test]
async fn get_missing_entity_returns_none() {
    let dir = tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path()).unwrap();
    assert!(storage.get_project(&ProjectId::new()).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_project_cascades_to_epics_and_tasks() {
    let dir = tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path()).unwrap();
    let project = make_project();
    storage.put_project(project.clone()).await.unwrap();

    let epic = Epic::new(EpicId::new(), project.id, "Auth", 0);
    storage.put_epic(epic.clone()).await.unwrap();

    let task = AtomicTask::new(
        TaskId::new(),
        "Build login form",
        TaskType::Development,
        TaskPriority::Medium,
        EstimatedHours::new(0.1).unwrap(),
        FunctionalArea::Authentication,
        epic.id,
        project.id,
        0,
    );
    storage.put_task(task.clone()).await.unwrap();

    storage.delete_project(&project.id).await.unwrap();

    assert!(storage.get_project(&project.id).await.unwrap().is_none());
    assert!(storage.get_epic(&epic.id).await.unwrap().is_none());
    assert!(storage.get_task(&task.id).await.unwrap().is_none());
}

#[tokio::test]
async fn projects_by_status_filters_correctly() {
    let dir = tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path()).unwrap();
    let project = make_project();
    storage.put_project(project.clone()).await.unwrap();

    let matches = storage.projects_by_status(rdd_core::ProjectStatus::Pending).await.unwrap();
    assert_eq!(matches.len(), 1);

    let none = storage.projects_by_status(rdd_core::ProjectStatus::Completed).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn search_projects_matches_name_case_insensitively() {
    let dir = tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path()).unwrap();
    storage.put_project(make_project()).await.unwrap();

    let found = storage.search_projects("DEMO").await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn concurrent_write_to_same_project_surfaces_busy() {
    let dir = tempdir().unwrap();
    let storage = JsonFileStorage::new(dir.path()).unwrap();
    let project = make_project();
    let lock = storage.lock_for(&format!("project:{}", project.id));
    let guard = lock.try_lock().unwrap();
    let err = storage.put_project(project).await.unwrap_err();
    assert_eq!(err.kind(), rdd_core::ErrorKind::Busy);
    drop(guard);
}
