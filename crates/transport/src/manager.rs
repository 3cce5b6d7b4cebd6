// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The transport manager: brings up the configured transports in
//! declared order, allocating ports dynamically and degrading gracefully
//! when an individual transport fails to start.

use crate::channel::Transport;
use crate::port::{allocate_port, PortSelectionConfig};
use parking_lot::RwLock;
use rdd_core::model::{TransportDescriptor, TransportKind, TransportState};
use rdd_core::{Clock, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

pub struct TransportSpec {
    pub enabled: bool,
    pub transport: Arc<dyn Transport>,
    pub port_config: Option<PortSelectionConfig>,
}

/// Owns the declared-order list of transports and their lifecycle state.
/// `start_all`/`stop_all` are the only mutators; allocated-port reads are
/// lock-free snapshots taken from the descriptor map once startup settles.
pub struct TransportManager<C: Clock> {
    clock: C,
    host: String,
    specs: Vec<TransportSpec>,
    descriptors: RwLock<HashMap<TransportKind, TransportDescriptor>>,
}

impl<C: Clock> TransportManager<C> {
    pub fn new(clock: C, host: impl Into<String>, specs: Vec<TransportSpec>) -> Self {
        let now_ms = clock.epoch_ms();
        let descriptors = specs.iter().map(|s| (s.transport.kind(), TransportDescriptor::new(s.transport.kind(), now_ms))).collect();
        Self { clock, host: host.into(), specs, descriptors: RwLock::new(descriptors) }
    }

    /// Starts every enabled transport in declared order. Idempotent: a
    /// transport already `started` is left untouched, so calling this
    /// twice without an intervening `stop_all` yields the same allocated-
    /// ports map as a single call.
    pub async fn start_all(&self) -> Result<()> {
        for spec in &self.specs {
            if !spec.enabled {
                continue;
            }
            let kind = spec.transport.kind();
            let already_started = self.descriptors.read().get(&kind).map(|d| d.state == TransportState::Started).unwrap_or(false);
            if already_started {
                continue;
            }

            let now_ms = self.clock.epoch_ms();
            self.transition(kind, TransportState::Pending, now_ms);
            self.transition(kind, TransportState::Starting, now_ms);

            let port = match &spec.port_config {
                Some(cfg) => match allocate_port(cfg).await {
                    Ok(p) => Some(p),
                    Err(e) => {
                        warn!(transport = %kind, error = %e, "port allocation failed, transport unavailable");
                        self.fail(kind, e.to_string());
                        continue;
                    }
                },
                None => None,
            };

            let bind_port = port.unwrap_or_default();
            match spec.transport.bind(bind_port).await {
                Ok(()) => {
                    info!(transport = %kind, port = ?port, "transport started");
                    let now_ms = self.clock.epoch_ms();
                    if let Some(d) = self.descriptors.write().get_mut(&kind) {
                        let _ = d.mark_started(port, now_ms);
                    }
                }
                Err(e) => {
                    warn!(transport = %kind, error = %e, "transport failed to bind, continuing with remaining transports");
                    self.fail(kind, e.to_string());
                }
            }
        }
        Ok(())
    }

    pub async fn stop_all(&self) -> Result<()> {
        for spec in &self.specs {
            let kind = spec.transport.kind();
            let is_started = self.descriptors.read().get(&kind).map(|d| d.state == TransportState::Started).unwrap_or(false);
            if !is_started {
                continue;
            }
            let now_ms = self.clock.epoch_ms();
            self.transition(kind, TransportState::Stopping, now_ms);
            spec.transport.stop().await?;
            let now_ms = self.clock.epoch_ms();
            self.transition(kind, TransportState::Stopped, now_ms);
        }
        Ok(())
    }

    pub fn get_allocated_ports(&self) -> HashMap<TransportKind, u16> {
        self.descriptors.read().iter().filter_map(|(k, d)| d.port.map(|p| (*k, p))).collect()
    }

    pub fn get_service_endpoints(&self) -> HashMap<TransportKind, String> {
        let ports = self.get_allocated_ports();
        let started = self.started_kinds();
        self.specs
            .iter()
            .filter(|s| started.contains(&s.transport.kind()))
            .map(|s| {
                let kind = s.transport.kind();
                (kind, s.transport.endpoint_url(&self.host, ports.get(&kind).copied()))
            })
            .collect()
    }

    pub fn started_kinds(&self) -> Vec<TransportKind> {
        self.descriptors.read().iter().filter(|(_, d)| d.state == TransportState::Started).map(|(k, _)| *k).collect()
    }

    fn transition(&self, kind: TransportKind, next: TransportState, now_ms: u64) {
        if let Some(d) = self.descriptors.write().get_mut(&kind) {
            let _ = d.transition(next, now_ms);
        }
    }

    fn fail(&self, kind: TransportKind, error: String) {
        let now_ms = self.clock.epoch_ms();
        if let Some(d) = self.descriptors.write().get_mut(&kind) {
            let _ = d.mark_failed(error, now_ms);
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
