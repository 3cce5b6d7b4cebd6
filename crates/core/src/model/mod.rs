// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The core data model: projects, epics, atomic tasks, decomposition
//! sessions, background jobs, task executions, agents, and transport
//! endpoints.
//!
//! Each kind lives in its own module and is stored in its own collection
//! keyed by id elsewhere in the workspace (storage, engine); structs here
//! hold only ids for cross-references, never owned child collections with
//! back-pointers, per the Design Notes' "deep mutable object graph"
//! guidance.

pub mod agent;
pub mod epic;
pub mod execution;
pub mod job;
pub mod project;
pub mod session;
pub mod task;
pub mod transport;

pub use agent::{Agent, AgentCapacity, AgentMetadata, AgentStatus, AgentUsage, UsageDelta, INITIAL_SCORE};
pub use epic::{Epic, EpicStatus};
pub use execution::{Execution, ExecutionStatus, HelpRequest};
pub use job::{Job, JobStatus};
pub use project::{Project, ProjectStatus};
pub use session::{DecompositionSession, NodeResult, SessionStatus, DEFAULT_SESSION_TTL_MS};
pub use task::{
    has_compound_connective, AcceptanceCriterion, AtomicTask, EstimatedHours, FunctionalArea,
    TaskCriteria, TaskPriority, TaskStatus, TaskType,
};
pub use transport::{TransportDescriptor, TransportKind, TransportState};
