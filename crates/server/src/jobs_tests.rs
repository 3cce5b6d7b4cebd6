// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdd_core::FakeClock;

fn manager() -> JobManager<FakeClock> {
    JobManager::new(FakeClock::new(), DEFAULT_MAX_JOBS)
}

/// Adaptive polling wait times track job progress as it advances in place.
#[test]
fn rate_limited_wait_tracks_the_adaptive_polling_table() {
    let mgr = manager();
    let id = mgr.create_job("decompose");

    let (_, hint) = mgr.get_job_rate_limited(&id, false).expect("job");
    assert_eq!(hint.suggested_wait_ms, 1000);

    mgr.update_status(&id, JobStatus::Running, None, Some(0.30)).expect("update");
    let (_, hint) = mgr.get_job_rate_limited(&id, false).expect("job");
    assert_eq!(hint.suggested_wait_ms, 800);

    mgr.update_status(&id, JobStatus::Running, None, Some(0.60)).expect("update");
    let (_, hint) = mgr.get_job_rate_limited(&id, false).expect("job");
    assert_eq!(hint.suggested_wait_ms, 500);

    mgr.update_status(&id, JobStatus::Running, None, Some(0.90)).expect("update");
    let (_, hint) = mgr.get_job_rate_limited(&id, false).expect("job");
    assert_eq!(hint.suggested_wait_ms, 200);

    mgr.set_result(&id, serde_json::json!({"ok": true}), true).expect("set_result");
    let (job, hint) = mgr.get_job_rate_limited(&id, false).expect("job");
    assert_eq!(hint.suggested_wait_ms, 0);
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.progress, 1.0);
}

#[yare::parameterized(
    queued               = { 0.0, JobStatus::Queued, 1000 },
    running_low_progress = { 0.1, JobStatus::Running, 800 },
    running_mid_progress = { 0.6, JobStatus::Running, 500 },
    running_high_progress = { 0.9, JobStatus::Running, 200 },
)]
fn rate_limited_wait_depends_on_status_and_progress(progress: f32, status: JobStatus, expected_wait_ms: u64) {
    let mgr = manager();
    let id = mgr.create_job("decompose");
    if status != JobStatus::Queued {
        mgr.update_status(&id, status, None, Some(progress)).expect("update");
    }
    let (_, hint) = mgr.get_job_rate_limited(&id, false).expect("job");
    assert_eq!(hint.suggested_wait_ms, expected_wait_ms);
}

#[test]
fn push_capable_caller_always_gets_a_zero_wait() {
    let mgr = manager();
    let id = mgr.create_job("decompose");
    let (_, hint) = mgr.get_job_rate_limited(&id, true).expect("job");
    assert_eq!(hint.suggested_wait_ms, 0);
}

#[test]
fn progress_cannot_decrease() {
    let mgr = manager();
    let id = mgr.create_job("decompose");
    mgr.update_status(&id, JobStatus::Running, None, Some(0.5)).expect("update");
    let err = mgr.update_status(&id, JobStatus::Running, None, Some(0.2)).unwrap_err();
    assert_eq!(err.kind(), rdd_core::ErrorKind::InvalidStateTransition);
}

#[test]
fn mutating_a_terminal_job_is_rejected() {
    let mgr = manager();
    let id = mgr.create_job("decompose");
    mgr.set_result(&id, serde_json::json!({"ok": true}), true).expect("set_result");
    let err = mgr.update_status(&id, JobStatus::Running, None, None).unwrap_err();
    assert_eq!(err.kind(), rdd_core::ErrorKind::InvalidStateTransition);
    let err = mgr.set_result(&id, serde_json::json!({"ok": true}), true).unwrap_err();
    assert_eq!(err.kind(), rdd_core::ErrorKind::InvalidStateTransition);
}

#[test]
fn purge_terminal_only_removes_jobs_past_the_cutoff() {
    let mgr = manager();
    let old = mgr.create_job("decompose");
    mgr.set_result(&old, serde_json::json!({"ok": true}), true).expect("set_result");
    let fresh = mgr.create_job("decompose");

    let removed = mgr.purge_terminal(500_000);
    assert_eq!(removed, 0);

    let removed = mgr.purge_terminal(2_000_000);
    assert_eq!(removed, 1);
    assert!(mgr.get_job(&old).is_none());
    assert!(mgr.get_job(&fresh).is_some());
}

#[test]
fn eviction_prefers_terminal_jobs_and_warns_when_none_are_evictable() {
    let mgr = JobManager::new(FakeClock::new(), 2);
    let a = mgr.create_job("decompose");
    mgr.set_result(&a, serde_json::json!({"ok": true}), true).expect("set_result");
    let _b = mgr.create_job("decompose");
    let _c = mgr.create_job("decompose");

    // `a` was terminal, so it should have been evicted to make room for `_c`.
    assert!(mgr.get_job(&a).is_none());

    // Now fill with only non-terminal jobs: capacity warning path, no eviction.
    let mgr = JobManager::new(FakeClock::new(), 1);
    let x = mgr.create_job("decompose");
    let y = mgr.create_job("decompose");
    assert!(mgr.get_job(&x).is_some());
    assert!(mgr.get_job(&y).is_some());
}

#[test]
fn unknown_job_lookups_return_none_or_unknown_task_error() {
    let mgr = manager();
    let bogus = rdd_core::JobId::new();
    assert!(mgr.get_job(&bogus).is_none());
    let err = mgr.update_status(&bogus, JobStatus::Running, None, None).unwrap_err();
    assert_eq!(err.kind(), rdd_core::ErrorKind::UnknownTask);
}
