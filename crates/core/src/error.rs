// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across every crate in the workspace.
//!
//! Kinds mirror the propagation policy table: `Validation`,
//! `InvalidStateTransition`, and `UnknownTask`/`UnknownSession` surface to
//! the caller unchanged; `Parse`, `Timeout`, `Busy`, and `PortUnavailable`
//! are recovered locally by their owning subsystem (bounded retries,
//! graceful degradation) before ever reaching here as a terminal error;
//! `Cancelled` is terminal and never retried; `Fatal` marks an invariant
//! breach and should be logged with a full span trace upstream.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    InvalidStateTransition,
    Parse,
    Timeout,
    Busy,
    PortUnavailable,
    Protocol,
    UnknownTask,
    UnknownSession,
    Cancelled,
    Fatal,
}

crate::simple_display! {
    ErrorKind {
        Validation => "validation_error",
        InvalidStateTransition => "invalid_state_transition",
        Parse => "parse_error",
        Timeout => "timeout",
        Busy => "busy",
        PortUnavailable => "port_unavailable",
        Protocol => "protocol_error",
        UnknownTask => "unknown_task",
        UnknownSession => "unknown_session",
        Cancelled => "cancelled",
        Fatal => "fatal",
    }
}

/// The crate-wide error type. Carries a stable [`ErrorKind`] tag plus a
/// human-readable message, so callers can branch on recovery policy without
/// matching every possible message string.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct CoreError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl CoreError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self { kind, message: message.into(), source: Some(Box::new(source)) }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn invalid_state_transition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidStateTransition, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Parse, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Busy, message)
    }

    pub fn port_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PortUnavailable, message)
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Protocol, message)
    }

    pub fn unknown_task(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownTask, message)
    }

    pub fn unknown_session(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownSession, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, message)
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Fatal, message)
    }

    /// True for kinds the owning subsystem should retry locally rather than
    /// surface on first occurrence.
    pub fn is_locally_recoverable(&self) -> bool {
        matches!(self.kind, ErrorKind::Parse | ErrorKind::Timeout | ErrorKind::Busy | ErrorKind::PortUnavailable)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
