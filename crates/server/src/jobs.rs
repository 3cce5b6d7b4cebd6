// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job manager: a process-wide registry of long-running jobs behind a
//! reader-writer map, with adaptive poll hints and LRU eviction.
//!
//! A reader-writer map with a background eviction timer: writes
//! (status/progress/result transitions) take a brief write lock;
//! `get_job` is a lock-free-feeling snapshot clone taken under a read
//! lock.

use parking_lot::RwLock;
use rdd_core::{Clock, CoreError, Job, JobId, JobStatus, Result};
use std::collections::HashMap;
use tracing::warn;

/// Default LRU capacity: terminal jobs keep their result around for later
/// polling, up to this many jobs, before eviction kicks in.
pub const DEFAULT_MAX_JOBS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitedJob {
    pub suggested_wait_ms: u64,
}

struct Entry {
    job: Job,
    last_access_ms: u64,
}

pub struct JobManager<C: Clock> {
    clock: C,
    jobs: RwLock<HashMap<JobId, Entry>>,
    max_jobs: usize,
}

impl<C: Clock> JobManager<C> {
    pub fn new(clock: C, max_jobs: usize) -> Self {
        Self { clock, jobs: RwLock::new(HashMap::new()), max_jobs }
    }

    pub fn create_job(&self, tool_name: impl Into<String>) -> JobId {
        let now_ms = self.clock.epoch_ms();
        let id = JobId::new();
        let job = Job::new(id, tool_name, now_ms);
        self.jobs.write().insert(id, Entry { job, last_access_ms: now_ms });
        self.evict_if_over_capacity();
        id
    }

    /// CAS update: rejects decreasing progress or mutating a terminal job.
    pub fn update_status(&self, id: &JobId, status: JobStatus, message: Option<String>, progress: Option<f32>) -> Result<()> {
        let now_ms = self.clock.epoch_ms();
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(id).ok_or_else(|| CoreError::unknown_task(format!("unknown job {id}")))?;
        if entry.job.is_terminal() {
            return Err(CoreError::invalid_state_transition(format!("job {id} is already terminal")));
        }
        if let Some(p) = progress {
            if p < entry.job.progress {
                return Err(CoreError::invalid_state_transition(format!("job {id} progress cannot decrease ({} -> {p})", entry.job.progress)));
            }
        }
        entry.job.transition(status, now_ms);
        if let Some(p) = progress {
            entry.job.set_progress(p, now_ms);
        }
        if let Some(msg) = message {
            entry.job.error = if status == JobStatus::Failed { Some(msg) } else { entry.job.error.clone() };
        }
        Ok(())
    }

    /// Atomically writes the result envelope, sets the terminal status from
    /// `success`, and forces progress to 100%.
    pub fn set_result(&self, id: &JobId, result: serde_json::Value, success: bool) -> Result<()> {
        let now_ms = self.clock.epoch_ms();
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(id).ok_or_else(|| CoreError::unknown_task(format!("unknown job {id}")))?;
        if entry.job.is_terminal() {
            return Err(CoreError::invalid_state_transition(format!("job {id} is already terminal")));
        }
        if success {
            entry.job.succeed(result, now_ms);
        } else {
            entry.job.fail(result.to_string(), now_ms);
        }
        Ok(())
    }

    pub fn get_job(&self, id: &JobId) -> Option<Job> {
        let now_ms = self.clock.epoch_ms();
        let mut jobs = self.jobs.write();
        let entry = jobs.get_mut(id)?;
        entry.last_access_ms = now_ms;
        Some(entry.job.clone())
    }

    /// Adaptive polling table. `push_capable` forces the wait to 0
    /// when the caller is already subscribed over the event notifier.
    pub fn get_job_rate_limited(&self, id: &JobId, push_capable: bool) -> Option<(Job, RateLimitedJob)> {
        let job = self.get_job(id)?;
        let suggested_wait_ms = if push_capable {
            0
        } else if job.is_terminal() {
            0
        } else if job.status == JobStatus::Queued {
            1000
        } else if job.progress < 0.5 {
            800
        } else if job.progress < 0.8 {
            500
        } else {
            200
        };
        Some((job, RateLimitedJob { suggested_wait_ms }))
    }

    /// Purges terminal jobs last accessed before `older_than_ms`. Returns
    /// the number of jobs removed.
    pub fn purge_terminal(&self, older_than_ms: u64) -> usize {
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, entry| !(entry.job.is_terminal() && entry.last_access_ms < older_than_ms));
        before - jobs.len()
    }

    /// LRU eviction: terminal jobs are preferred candidates. If the
    /// registry is over capacity with only non-terminal jobs, no eviction
    /// happens and a capacity warning is logged instead.
    fn evict_if_over_capacity(&self) {
        let mut jobs = self.jobs.write();
        if jobs.len() <= self.max_jobs {
            return;
        }
        let mut terminal_ids: Vec<(JobId, u64)> = jobs
            .iter()
            .filter(|(_, e)| e.job.is_terminal())
            .map(|(id, e)| (*id, e.last_access_ms))
            .collect();
        terminal_ids.sort_by_key(|(_, last_access)| *last_access);

        let over_by = jobs.len() - self.max_jobs;
        let to_evict = terminal_ids.into_iter().take(over_by);
        let mut evicted = 0;
        for (id, _) in to_evict {
            jobs.remove(&id);
            evicted += 1;
        }
        if evicted < over_by {
            warn!(capacity = self.max_jobs, size = jobs.len(), "job registry at capacity with no terminal jobs to evict");
        }
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
