// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ids::{AgentId, ExecutionId, TaskId};

fn make_execution() -> Execution {
    Execution::new(ExecutionId::new(), TaskId::new(), AgentId::new(), 1, 0)
}

#[test]
fn start_transitions_to_running() {
    let mut exec = make_execution();
    exec.start(10);
    assert_eq!(exec.status, ExecutionStatus::Running);
}

#[test]
fn request_help_then_resume_round_trips_status() {
    let mut exec = make_execution();
    exec.start(10);
    exec.request_help("which adapter do I use?", None, 20);
    assert_eq!(exec.status, ExecutionStatus::AwaitingHelp);
    assert_eq!(exec.help_requests.len(), 1);

    exec.resume(30);
    assert_eq!(exec.status, ExecutionStatus::Running);
}

#[test]
fn resume_is_a_no_op_when_not_awaiting_help() {
    let mut exec = make_execution();
    exec.start(10);
    exec.resume(20);
    assert_eq!(exec.status, ExecutionStatus::Running);
    assert_eq!(exec.updated_at_ms, 10);
}

#[test]
fn block_and_fail_both_set_completed_at_and_are_terminal() {
    let mut blocked = make_execution();
    blocked.block("missing credentials", 40);
    assert!(blocked.is_terminal());
    assert!(blocked.completed_at_ms.is_some());

    let mut failed = make_execution();
    failed.fail("panic in adapter", 40);
    assert!(failed.is_terminal());
    assert!(failed.error.is_some());
}

#[test]
fn dispatch_records_dispatched_at_and_status() {
    let mut exec = make_execution();
    exec.dispatch(15);
    assert_eq!(exec.status, ExecutionStatus::Dispatched);
    assert_eq!(exec.dispatched_at_ms, Some(15));
}

#[test]
fn time_out_and_cancel_are_terminal() {
    let mut timed_out = make_execution();
    timed_out.dispatch(10);
    timed_out.time_out(20);
    assert!(timed_out.is_terminal());
    assert_eq!(timed_out.status, ExecutionStatus::TimedOut);

    let mut cancelled = make_execution();
    cancelled.cancel(5);
    assert!(cancelled.is_terminal());
    assert_eq!(cancelled.status, ExecutionStatus::Cancelled);
}
