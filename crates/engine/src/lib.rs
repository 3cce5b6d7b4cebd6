// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdd-engine: the atomicity detector, auto-research detector, RDD
//! engine, decomposition service, execution engine, and feedback
//! processor.

pub mod atomicity;
pub mod decomposition_service;
pub mod epics;
pub mod execution;
pub mod feedback;
pub mod project_context;
pub mod rdd;
pub mod research;

pub use atomicity::{AtomicityDetector, AtomicityVerdict};
pub use decomposition_service::{DecompositionRequest, DecompositionService};
pub use epics::assign_epic;
pub use execution::{
    AgentRegistration, EngineCommand, ExecutionEngine, ExecutionEngineConfig, ExecutionEngineHandle,
    ExecutionResult, ExecutionStatistics, SchedulingPolicy, SubmittedTask,
};
pub use feedback::{Feedback, FeedbackProcessor, FeedbackSettings};
pub use project_context::ProjectContext;
pub use rdd::{DecompositionLimits, DecompositionOutcome, DraftNode, RddEngine, FORBIDDEN_EPIC_IDS};
pub use research::{AutoResearchDetector, ResearchDecision, TriggerReason};
