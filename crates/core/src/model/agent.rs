// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent entity: a worker registered with the execution engine, with a
//! bounded concurrency slot pool and a running performance score.

use crate::ids::AgentId;
use crate::model::task::FunctionalArea;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Available,
    Busy,
    Draining,
    Offline,
}

crate::simple_display! {
    AgentStatus {
        Available => "available",
        Busy => "busy",
        Draining => "draining",
        Offline => "offline",
    }
}

/// Starting score assigned to a newly registered agent, per the feedback
/// processor's scoring formula (neutral prior, neither rewarded nor
/// penalized until it has a track record).
pub const INITIAL_SCORE: f64 = 0.5;

/// Resource ceilings an agent advertises at registration. Capacity is
/// static for the agent's lifetime; what changes over time is
/// [`AgentUsage`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentCapacity {
    pub max_memory_mb: u32,
    pub max_cpu_weight: f64,
    pub max_concurrent_tasks: u32,
}

impl AgentCapacity {
    pub fn new(max_memory_mb: u32, max_cpu_weight: f64, max_concurrent_tasks: u32) -> Self {
        Self { max_memory_mb, max_cpu_weight, max_concurrent_tasks }
    }
}

/// The resources an agent is consuming right now, in the same shape as
/// [`AgentCapacity`] so the two can be compared field-for-field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentUsage {
    pub memory_mb: u32,
    pub cpu_weight: f64,
    pub concurrent_tasks: u32,
}

/// A signed adjustment applied to [`AgentUsage`] by
/// [`Agent::apply_usage_delta`] — e.g. a dispatched execution adds its
/// estimated footprint, a completed one subtracts it back out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageDelta {
    pub memory_mb: i64,
    pub cpu_weight: f64,
    pub concurrent_tasks: i32,
}

/// Rolling operational stats, updated as the agent runs tasks rather than
/// set once at registration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentMetadata {
    pub last_heartbeat_ms: u64,
    pub total_tasks_executed: u64,
    pub average_execution_time_ms: f64,
    pub success_rate: f64,
}

impl AgentMetadata {
    fn new(now_ms: u64) -> Self {
        Self { last_heartbeat_ms: now_ms, total_tasks_executed: 0, average_execution_time_ms: 0.0, success_rate: 1.0 }
    }

    /// Folds one more completed execution into the running average
    /// execution time and success rate. `duration_ms` is the wall time the
    /// execution took; `succeeded` whether it completed or failed.
    fn record_execution(&mut self, duration_ms: f64, succeeded: bool, now_ms: u64) {
        let n = self.total_tasks_executed;
        self.average_execution_time_ms = (self.average_execution_time_ms * n as f64 + duration_ms) / (n + 1) as f64;
        let successes_before = self.success_rate * n as f64;
        let successes_after = successes_before + if succeeded { 1.0 } else { 0.0 };
        self.total_tasks_executed = n + 1;
        self.success_rate = successes_after / self.total_tasks_executed as f64;
        self.last_heartbeat_ms = now_ms;
    }
}

/// An execution-capable worker. Capacity enforcement (invariant: the engine
/// must never hand out more concurrent work than `max_concurrent` allows)
/// lives entirely in [`Agent::try_reserve_slot`]/[`Agent::release_slot`] so
/// there is exactly one place that can over-commit an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub capabilities: Vec<FunctionalArea>,
    pub max_concurrent: u32,
    pub active_executions: u32,
    pub status: AgentStatus,
    pub score: f64,
    pub completed_count: u64,
    pub failed_count: u64,
    pub capacity: AgentCapacity,
    pub current_usage: AgentUsage,
    pub metadata: AgentMetadata,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Agent {
    pub fn new(id: AgentId, name: impl Into<String>, max_concurrent: u32, now_ms: u64) -> Self {
        Self {
            id,
            name: name.into(),
            capabilities: Vec::new(),
            max_concurrent,
            active_executions: 0,
            status: AgentStatus::Available,
            score: INITIAL_SCORE,
            completed_count: 0,
            failed_count: 0,
            capacity: AgentCapacity::new(0, 0.0, max_concurrent),
            current_usage: AgentUsage::default(),
            metadata: AgentMetadata::new(now_ms),
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// Overrides the default zero-valued memory/CPU capacity (registration
    /// callers that know real resource ceilings call this after `new`).
    pub fn with_capacity(mut self, capacity: AgentCapacity) -> Self {
        self.max_concurrent = capacity.max_concurrent_tasks;
        self.capacity = capacity;
        self
    }

    pub fn can_handle(&self, area: FunctionalArea) -> bool {
        self.capabilities.is_empty() || self.capabilities.contains(&area)
    }

    pub fn has_capacity(&self) -> bool {
        self.status != AgentStatus::Offline && self.status != AgentStatus::Draining && self.active_executions < self.max_concurrent
    }

    /// Attempts to claim a concurrency slot. Returns `false`, leaving state
    /// untouched, when the agent is offline, draining, or already at
    /// `max_concurrent` in-flight executions.
    pub fn try_reserve_slot(&mut self, now_ms: u64) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.active_executions += 1;
        self.status = if self.active_executions >= self.max_concurrent { AgentStatus::Busy } else { AgentStatus::Available };
        self.updated_at_ms = now_ms;
        true
    }

    pub fn release_slot(&mut self, now_ms: u64) {
        self.active_executions = self.active_executions.saturating_sub(1);
        if self.status != AgentStatus::Offline && self.status != AgentStatus::Draining {
            self.status = AgentStatus::Available;
        }
        self.updated_at_ms = now_ms;
    }

    /// Applies a signed usage adjustment, clamping every field at zero so
    /// an over-subtraction (a stale or duplicate delta) can't leave the
    /// agent holding negative resource usage.
    pub fn apply_usage_delta(&mut self, delta: UsageDelta, now_ms: u64) {
        self.current_usage.memory_mb = self.current_usage.memory_mb.saturating_add_signed(delta.memory_mb as i32);
        self.current_usage.cpu_weight = (self.current_usage.cpu_weight + delta.cpu_weight).max(0.0);
        self.current_usage.concurrent_tasks =
            self.current_usage.concurrent_tasks.saturating_add_signed(delta.concurrent_tasks);
        self.updated_at_ms = now_ms;
    }

    /// Exponential-moving-average update applied after each execution
    /// outcome, weighting recent results more heavily than historical ones.
    /// `duration_ms` feeds the separate cumulative-average stats in
    /// [`AgentMetadata`], which track true lifetime performance rather than
    /// the EMA's recency bias.
    pub fn record_outcome(&mut self, succeeded: bool, duration_ms: f64, now_ms: u64) {
        const ALPHA: f64 = 0.2;
        let sample = if succeeded { 1.0 } else { 0.0 };
        self.score = self.score * (1.0 - ALPHA) + sample * ALPHA;
        if succeeded {
            self.completed_count += 1;
        } else {
            self.failed_count += 1;
        }
        self.metadata.record_execution(duration_ms, succeeded, now_ms);
        self.updated_at_ms = now_ms;
    }

    pub fn heartbeat(&mut self, now_ms: u64) {
        self.metadata.last_heartbeat_ms = now_ms;
        self.updated_at_ms = now_ms;
    }

    pub fn set_offline(&mut self, now_ms: u64) {
        self.status = AgentStatus::Offline;
        self.updated_at_ms = now_ms;
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
