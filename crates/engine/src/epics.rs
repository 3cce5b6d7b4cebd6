// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Epic assignment: derives an epic id from a task's functional area
//! rather than auto-incrementing, per the normalization rule that
//! forbids generic scaffolding-bucket epics (`E001`/`E002`/...).

use indexmap::IndexMap;
use rdd_core::{Epic, EpicId, FunctionalArea, ProjectId};

/// Returns the epic for `area` within `epics`, creating it on first use.
/// The epic id embeds the functional-area tag so it never collides with
/// the forbidden scaffolding defaults in
/// [`crate::rdd::FORBIDDEN_EPIC_IDS`].
///
/// `epics` is an [`IndexMap`] rather than a `HashMap` so the epic list in
/// the final decomposition outcome comes out in first-assigned order
/// instead of hashing order, which would otherwise reorder randomly
/// between runs of the same decomposition.
pub fn assign_epic<'a>(
    epics: &'a mut IndexMap<FunctionalArea, Epic>,
    area: FunctionalArea,
    project_id: ProjectId,
    now_ms: u64,
) -> &'a mut Epic {
    epics.entry(area).or_insert_with(|| Epic::new(EpicId::new(), project_id, epic_title(area), now_ms))
}

fn epic_title(area: FunctionalArea) -> String {
    format!("{area}")
}

#[cfg(test)]
#[path = "epics_tests.rs"]
mod tests;
