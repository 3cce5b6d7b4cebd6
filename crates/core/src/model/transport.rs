// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transport descriptor: the lifecycle state of one agent-communication
//! channel managed by the transport manager.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Stdio,
    WebSocket,
    Http,
    Sse,
}

crate::simple_display! {
    TransportKind {
        Stdio => "stdio",
        WebSocket => "websocket",
        Http => "http",
        Sse => "sse",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportState {
    Disabled,
    Pending,
    Starting,
    Started,
    Stopping,
    Stopped,
    Failed,
}

crate::simple_display! {
    TransportState {
        Disabled => "disabled",
        Pending => "pending",
        Starting => "starting",
        Started => "started",
        Stopping => "stopping",
        Stopped => "stopped",
        Failed => "failed",
    }
}

impl TransportState {
    /// Legal next states, per the transport manager's state machine.
    /// `starting` can fail outright in addition to reaching `started`.
    fn allowed_next(self) -> &'static [TransportState] {
        use TransportState::*;
        match self {
            Disabled => &[Pending],
            Pending => &[Starting],
            Starting => &[Started, Failed],
            Started => &[Stopping, Failed],
            Stopping => &[Stopped],
            Stopped => &[Pending],
            Failed => &[Pending],
        }
    }
}

/// One managed transport channel. Binds at most one port at a time; the
/// port is cleared whenever the transport leaves `started` so a later
/// restart re-runs the allocation policy instead of reusing a stale value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportDescriptor {
    pub kind: TransportKind,
    pub state: TransportState,
    pub port: Option<u16>,
    pub last_error: Option<String>,
    pub updated_at_ms: u64,
}

impl TransportDescriptor {
    pub fn new(kind: TransportKind, now_ms: u64) -> Self {
        Self { kind, state: TransportState::Disabled, port: None, last_error: None, updated_at_ms: now_ms }
    }

    /// Validates against the state machine and applies the transition.
    pub fn transition(&mut self, next: TransportState, now_ms: u64) -> Result<()> {
        if !self.state.allowed_next().contains(&next) {
            return Err(CoreError::invalid_state_transition(format!(
                "transport {} cannot move from {} to {}",
                self.kind, self.state, next
            )));
        }
        self.state = next;
        self.updated_at_ms = now_ms;
        if !matches!(next, TransportState::Started) {
            self.port = None;
        }
        Ok(())
    }

    pub fn mark_started(&mut self, port: Option<u16>, now_ms: u64) -> Result<()> {
        self.transition(TransportState::Started, now_ms)?;
        self.port = port;
        Ok(())
    }

    pub fn mark_failed(&mut self, error: impl Into<String>, now_ms: u64) -> Result<()> {
        self.last_error = Some(error.into());
        self.transition(TransportState::Failed, now_ms)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TransportState::Starting | TransportState::Started)
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
