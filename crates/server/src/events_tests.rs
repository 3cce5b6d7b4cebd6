// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rdd_core::{JobId, SessionId};

#[tokio::test]
async fn subscriber_receives_events_in_publish_order() {
    let notifier = EventNotifier::new(DEFAULT_HIGH_WATERMARK);
    let session_id = SessionId::new();
    let job_id = JobId::new();
    let sub = notifier.subscribe(session_id);

    notifier.publish(session_id, job_id, EventKind::Progress, serde_json::json!({"pct": 10}));
    notifier.publish(session_id, job_id, EventKind::Progress, serde_json::json!({"pct": 50}));
    notifier.publish(session_id, job_id, EventKind::Terminal, serde_json::json!({"pct": 100}));

    let first = sub.recv().await;
    let second = sub.recv().await;
    let third = sub.recv().await;
    assert_eq!((first.seq, second.seq, third.seq), (1, 2, 3));
    assert_eq!(third.kind, EventKind::Terminal);
}

#[tokio::test]
async fn unrelated_sessions_do_not_cross_deliver() {
    let notifier = EventNotifier::new(DEFAULT_HIGH_WATERMARK);
    let watched = SessionId::new();
    let other = SessionId::new();
    let job_id = JobId::new();
    let sub = notifier.subscribe(watched);

    notifier.publish(other, job_id, EventKind::Log, serde_json::json!({"line": "noise"}));
    assert!(sub.drain().is_empty());
}

#[tokio::test]
async fn unsubscribed_subscriber_stops_receiving() {
    let notifier = EventNotifier::new(DEFAULT_HIGH_WATERMARK);
    let session_id = SessionId::new();
    let job_id = JobId::new();
    let sub = notifier.subscribe(session_id);

    notifier.unsubscribe(&session_id, sub.id);
    notifier.publish(session_id, job_id, EventKind::Log, serde_json::json!({"line": "after unsubscribe"}));
    assert!(sub.drain().is_empty());
}

#[tokio::test]
async fn over_capacity_backlog_drops_oldest_non_terminal_and_marks_backpressure() {
    let notifier = EventNotifier::new(2);
    let session_id = SessionId::new();
    let job_id = JobId::new();
    let sub = notifier.subscribe(session_id);

    notifier.publish(session_id, job_id, EventKind::Progress, serde_json::json!({"pct": 1}));
    notifier.publish(session_id, job_id, EventKind::Progress, serde_json::json!({"pct": 2}));
    notifier.publish(session_id, job_id, EventKind::Progress, serde_json::json!({"pct": 3}));

    let drained = sub.drain();
    assert_eq!(drained.len(), 2);
    assert!(drained[0].backpressure);
    assert_eq!(drained[1].payload["pct"], 3);
}

#[tokio::test]
async fn terminal_events_are_never_dropped_even_over_the_high_watermark() {
    let notifier = EventNotifier::new(1);
    let session_id = SessionId::new();
    let job_id = JobId::new();
    let sub = notifier.subscribe(session_id);

    notifier.publish(session_id, job_id, EventKind::Progress, serde_json::json!({"pct": 1}));
    notifier.publish(session_id, job_id, EventKind::Terminal, serde_json::json!({"pct": 100}));
    notifier.publish(session_id, job_id, EventKind::Terminal, serde_json::json!({"pct": 100}));

    let drained = sub.drain();
    assert_eq!(drained.iter().filter(|e| e.kind == EventKind::Terminal).count(), 2);
}

#[tokio::test]
async fn sequence_numbers_are_scoped_per_session_and_job_pair() {
    let notifier = EventNotifier::new(DEFAULT_HIGH_WATERMARK);
    let session_id = SessionId::new();
    let job_a = JobId::new();
    let job_b = JobId::new();
    let sub = notifier.subscribe(session_id);

    notifier.publish(session_id, job_a, EventKind::Log, serde_json::json!({}));
    notifier.publish(session_id, job_b, EventKind::Log, serde_json::json!({}));
    notifier.publish(session_id, job_a, EventKind::Log, serde_json::json!({}));

    let drained = sub.drain();
    let job_a_seqs: Vec<u64> = drained.iter().filter(|e| e.job_id == job_a).map(|e| e.seq).collect();
    assert_eq!(job_a_seqs, vec![1, 2]);
}
