// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdd_core::FunctionalArea;

#[test]
fn creates_one_epic_per_functional_area() {
    let mut epics = IndexMap::new();
    let project_id = ProjectId::new();

    let first = assign_epic(&mut epics, FunctionalArea::Authentication, project_id.clone(), 1);
    let first_id = first.id;
    let second = assign_epic(&mut epics, FunctionalArea::Authentication, project_id.clone(), 2);

    assert_eq!(first_id, second.id);
    assert_eq!(epics.len(), 1);
}

#[test]
fn distinct_areas_get_distinct_epics() {
    let mut epics = IndexMap::new();
    let project_id = ProjectId::new();

    assign_epic(&mut epics, FunctionalArea::Authentication, project_id.clone(), 1);
    assign_epic(&mut epics, FunctionalArea::Performance, project_id.clone(), 1);

    assert_eq!(epics.len(), 2);
}

#[test]
fn epic_ids_never_collide_with_forbidden_defaults() {
    let mut epics = IndexMap::new();
    let project_id = ProjectId::new();

    for area in FunctionalArea::ALL {
        let epic = assign_epic(&mut epics, *area, project_id.clone(), 1);
        assert!(!crate::rdd::FORBIDDEN_EPIC_IDS.contains(&epic.id.as_str()));
    }
}
