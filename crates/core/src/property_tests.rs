// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for the invariants the rest of the workspace leans on:
//! estimated-hours validation and branded id round-tripping.

use crate::ids::TaskId;
use crate::model::EstimatedHours;
use proptest::prelude::*;

proptest! {
    #[test]
    fn estimated_hours_accepts_any_positive_finite_value(hours in 0.0001f64..10_000.0) {
        let estimate = EstimatedHours::new(hours).unwrap();
        prop_assert_eq!(estimate.value(), hours);
    }

    #[test]
    fn estimated_hours_rejects_non_positive_values(hours in -10_000.0f64..=0.0) {
        prop_assert!(EstimatedHours::new(hours).is_err());
    }

    #[test]
    fn estimated_hours_atomic_range_matches_its_own_bounds(hours in 0.0001f64..10_000.0) {
        let estimate = EstimatedHours::new(hours).unwrap();
        prop_assert_eq!(estimate.is_atomic_range(), hours > 0.0 && hours <= 0.17);
    }

    #[test]
    fn task_id_try_from_string_round_trips_any_non_empty_string(s in "[!-~]{1,15}") {
        let id = TaskId::try_from_string(&s).unwrap();
        prop_assert_eq!(id.as_str(), s.as_str());
    }

    #[test]
    fn task_id_try_from_string_rejects_empty(s in "") {
        prop_assert!(TaskId::try_from_string(&s).is_err());
    }

    #[test]
    fn freshly_generated_task_ids_carry_the_branded_prefix(_seed in any::<u8>()) {
        let id = TaskId::new();
        prop_assert!(id.as_str().starts_with("tsk-"));
    }
}
