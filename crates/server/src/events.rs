// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event notifier: per-session fan-out of job events to subscribers, with
//! a bounded backlog per subscriber instead of the unbounded-queue
//! default a plain `mpsc` channel would give you.
//!
//! Subscribers don't get a `tokio::sync::mpsc::Receiver` directly because
//! the drop-oldest-non-terminal backpressure policy needs random access
//! into the backlog to evict a specific entry, which a channel doesn't
//! expose. Each subscriber instead gets a `Notify` paired with a
//! `Mutex<VecDeque<Event>>` it drains from.

use parking_lot::Mutex;
use rdd_core::{JobId, SessionId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// Default high-water mark on a subscriber's backlog.
pub const DEFAULT_HIGH_WATERMARK: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Progress,
    Status,
    Log,
    Terminal,
}

impl EventKind {
    fn is_terminal(self) -> bool {
        matches!(self, EventKind::Terminal)
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub job_id: JobId,
    pub kind: EventKind,
    pub payload: serde_json::Value,
    /// Monotonic within the (session, job) pair this event was published
    /// under; never reused even across a dropped-and-replaced backlog.
    pub seq: u64,
    /// Set on the synthetic marker that replaces an evicted event.
    pub backpressure: bool,
}

impl Event {
    fn backpressure_marker(job_id: JobId, seq: u64) -> Self {
        Self { job_id, kind: EventKind::Status, payload: serde_json::Value::Null, seq, backpressure: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    backlog: Arc<Mutex<VecDeque<Event>>>,
    notify: Arc<Notify>,
    high_watermark: usize,
}

/// Handle returned from `subscribe`. Dropping it does not unsubscribe;
/// callers must call `EventNotifier::unsubscribe` explicitly so a
/// subscriber that's mid-`recv` isn't torn down underneath it.
pub struct Subscription {
    pub id: SubscriptionId,
    session_id: SessionId,
    backlog: Arc<Mutex<VecDeque<Event>>>,
    notify: Arc<Notify>,
}

impl Subscription {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Waits for and returns the next event, in publish order.
    pub async fn recv(&self) -> Event {
        loop {
            if let Some(event) = self.backlog.lock().pop_front() {
                return event;
            }
            self.notify.notified().await;
        }
    }

    /// Drains whatever is currently buffered without waiting.
    pub fn drain(&self) -> Vec<Event> {
        self.backlog.lock().drain(..).collect()
    }
}

pub struct EventNotifier {
    subscribers: Mutex<HashMap<SessionId, Vec<Arc<Subscriber>>>>,
    seqs: Mutex<HashMap<(SessionId, JobId), u64>>,
    next_subscription_id: AtomicU64,
    high_watermark: usize,
}

impl EventNotifier {
    pub fn new(high_watermark: usize) -> Self {
        Self {
            subscribers: Mutex::new(HashMap::new()),
            seqs: Mutex::new(HashMap::new()),
            next_subscription_id: AtomicU64::new(1),
            high_watermark,
        }
    }

    pub fn subscribe(&self, session_id: SessionId) -> Subscription {
        let id = SubscriptionId(self.next_subscription_id.fetch_add(1, Ordering::Relaxed));
        let backlog = Arc::new(Mutex::new(VecDeque::new()));
        let notify = Arc::new(Notify::new());
        let subscriber =
            Arc::new(Subscriber { id, backlog: backlog.clone(), notify: notify.clone(), high_watermark: self.high_watermark });

        self.subscribers.lock().entry(session_id).or_default().push(subscriber);

        Subscription { id, session_id, backlog, notify }
    }

    pub fn unsubscribe(&self, session_id: &SessionId, id: SubscriptionId) {
        let mut subscribers = self.subscribers.lock();
        if let Some(list) = subscribers.get_mut(session_id) {
            list.retain(|s| s.id != id);
            if list.is_empty() {
                subscribers.remove(session_id);
            }
        }
    }

    /// Publishes to every subscriber of `session_id`, assigning the next
    /// sequence number for the `(session_id, job_id)` pair.
    pub fn publish(&self, session_id: SessionId, job_id: JobId, kind: EventKind, payload: serde_json::Value) {
        let seq = {
            let mut seqs = self.seqs.lock();
            let counter = seqs.entry((session_id, job_id)).or_insert(0);
            *counter += 1;
            *counter
        };

        let subscribers = self.subscribers.lock();
        let Some(list) = subscribers.get(&session_id) else { return };
        for subscriber in list {
            let event = Event { job_id, kind, payload: payload.clone(), seq, backpressure: false };
            push_with_backpressure(subscriber, event);
            subscriber.notify.notify_waiters();
        }
    }
}

fn push_with_backpressure(subscriber: &Arc<Subscriber>, event: Event) {
    let mut backlog = subscriber.backlog.lock();
    if event.kind.is_terminal() {
        backlog.push_back(event);
        return;
    }
    if backlog.len() >= subscriber.high_watermark {
        if let Some(pos) = backlog.iter().position(|e| !e.kind.is_terminal()) {
            let evicted = backlog.remove(pos).expect("position just checked");
            backlog.insert(pos, Event::backpressure_marker(evicted.job_id, evicted.seq));
        }
    }
    backlog.push_back(event);
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
