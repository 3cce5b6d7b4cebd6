// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port selection policy: a dynamic, conflict-tolerant allocator that
//! never aborts startup over a single bad env var or a busy port.

use rdd_core::{CoreError, ErrorKind, Result};
use std::net::TcpListener;
use std::time::Duration;

/// Resolved port configuration for one transport. Env vars are parsed once
/// by the caller (the runtime config layer) and handed in here already
/// validated; this module never touches the environment directly.
#[derive(Debug, Clone)]
pub struct PortSelectionConfig {
    pub preferred: u16,
    pub range: Option<(u16, u16)>,
    pub env_single: Option<u16>,
    pub env_range: Option<(u16, u16)>,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for PortSelectionConfig {
    fn default() -> Self {
        Self {
            preferred: 0,
            range: None,
            env_single: None,
            env_range: None,
            max_retries: 3,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

fn probe_free(port: u16) -> bool {
    TcpListener::bind(("0.0.0.0", port)).is_ok()
}

fn first_free_in_range(lo: u16, hi: u16) -> Option<u16> {
    (lo..=hi).find(|&p| probe_free(p))
}

/// Walks forward from `start`, within `bound` (inclusive) if given or up to
/// 20 ports past `start` otherwise, returning the first free port found.
fn walk_forward(start: u16, bound: Option<(u16, u16)>) -> Option<u16> {
    let hi = match bound {
        Some((_, hi)) => hi,
        None => start.saturating_add(20),
    };
    (start..=hi).find(|&p| probe_free(p))
}

/// Runs the selection policy end to end: pick a candidate, bind-probe
/// it with forward walking on conflict, and retry transient failures with
/// backoff. Returns `port_unavailable` only once the range (or 20-port
/// window) is exhausted and every retry has been spent.
pub async fn allocate_port(cfg: &PortSelectionConfig) -> Result<u16> {
    let candidate = if let Some(p) = cfg.env_single {
        p
    } else if let Some((lo, hi)) = cfg.env_range {
        first_free_in_range(lo, hi).ok_or_else(|| {
            CoreError::port_unavailable(format!("no free port in range {lo}-{hi}"))
        })?
    } else {
        cfg.preferred
    };

    let mut attempt = 0;
    loop {
        if probe_free(candidate) {
            return Ok(candidate);
        }
        if let Some(found) = walk_forward(candidate, cfg.range) {
            return Ok(found);
        }
        attempt += 1;
        if attempt >= cfg.max_retries {
            return Err(CoreError::new(
                ErrorKind::PortUnavailable,
                format!("no free port found near {candidate} after {attempt} attempts"),
            ));
        }
        tokio::time::sleep(cfg.retry_backoff).await;
    }
}

/// Parses a single-port env var value, rejecting non-numeric or
/// out-of-range (>65535) values rather than panicking. Callers log a
/// warning and ignore the var entirely when this returns `None`.
pub fn parse_single_port_env(raw: &str) -> Option<u16> {
    raw.trim().parse::<u32>().ok().and_then(|v| u16::try_from(v).ok()).filter(|&v| v > 0)
}

/// Parses a `low-high` range env var value.
pub fn parse_range_env(raw: &str) -> Option<(u16, u16)> {
    let (lo, hi) = raw.trim().split_once('-')?;
    let lo: u16 = lo.trim().parse().ok()?;
    let hi: u16 = hi.trim().parse().ok()?;
    if lo > hi {
        return None;
    }
    Some((lo, hi))
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
