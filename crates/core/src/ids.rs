// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The branded identifier types used throughout the workspace.

crate::define_id! {
    /// Unique identifier for a project.
    pub struct ProjectId("prj-");
}

crate::define_id! {
    /// Unique identifier for an epic.
    pub struct EpicId("epc-");
}

crate::define_id! {
    /// Unique identifier for an atomic task. Factory functions reject empty
    /// strings via [`TaskId::try_from_string`].
    pub struct TaskId("tsk-");
}

crate::define_id! {
    /// Unique identifier for a decomposition session.
    pub struct SessionId("ses-");
}

crate::define_id! {
    /// Unique identifier for a background job.
    pub struct JobId("job-");
}

crate::define_id! {
    /// Unique identifier for a registered agent. Factory functions reject
    /// empty strings via [`AgentId::try_from_string`].
    pub struct AgentId("agt-");
}

crate::define_id! {
    /// Unique identifier for a task execution. Factory functions reject
    /// empty strings via [`ExecutionId::try_from_string`].
    pub struct ExecutionId("exe-");
}
