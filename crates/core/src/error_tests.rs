// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn kind_round_trips_through_display() {
    assert_eq!(ErrorKind::Validation.to_string(), "validation_error");
    assert_eq!(ErrorKind::InvalidStateTransition.to_string(), "invalid_state_transition");
    assert_eq!(ErrorKind::Fatal.to_string(), "fatal");
}

#[test]
fn locally_recoverable_kinds() {
    assert!(CoreError::timeout("slow").is_locally_recoverable());
    assert!(CoreError::busy("locked").is_locally_recoverable());
    assert!(CoreError::parse("bad json").is_locally_recoverable());
    assert!(CoreError::port_unavailable("range exhausted").is_locally_recoverable());
    assert!(!CoreError::validation("bad input").is_locally_recoverable());
    assert!(!CoreError::fatal("invariant broken").is_locally_recoverable());
}

#[test]
fn message_included_in_display() {
    let err = CoreError::unknown_task("tsk-missing");
    assert_eq!(err.to_string(), "unknown_task: tsk-missing");
}
