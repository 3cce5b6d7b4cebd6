// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime configuration: reads every environment variable the runtime
//! honors exactly once at startup. An invalid value is logged and
//! replaced by the default, never treated as fatal.

use rdd_transport::{parse_range_env, parse_single_port_env, PortSelectionConfig};
use std::env;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_MAX_CONCURRENT_TASKS: u32 = 10;
const DEFAULT_MAX_RESPONSE_TIME_MS: u64 = 50;
const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;
const DEFAULT_ENABLE_EXPONENTIAL_BACKOFF: bool = true;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub output_dir: PathBuf,
    pub max_concurrent_tasks: u32,
    pub max_response_time_ms: u64,
    pub min_confidence: f64,
    pub enable_exponential_backoff: bool,
    pub websocket_port: PortSelectionConfig,
    pub http_agent_port: PortSelectionConfig,
    pub sse_port: PortSelectionConfig,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_env_reader(|key| env::var(key).ok())
    }

    /// Testable variant: reads through a closure instead of the real
    /// process environment so tests don't need to mutate global state.
    pub fn from_env_reader(get: impl Fn(&str) -> Option<String>) -> Self {
        let output_dir = get("VIBE_CODER_OUTPUT_DIR").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

        let max_concurrent_tasks = parse_bounded_u32("VIBE_MAX_CONCURRENT_TASKS", &get, 1, 100, DEFAULT_MAX_CONCURRENT_TASKS);
        let max_response_time_ms = parse_u64("VIBE_MAX_RESPONSE_TIME", &get, DEFAULT_MAX_RESPONSE_TIME_MS);
        let min_confidence = parse_bounded_f64("VIBE_MIN_CONFIDENCE", &get, 0.0, 1.0, DEFAULT_MIN_CONFIDENCE);
        let enable_exponential_backoff = parse_bool("VIBE_ENABLE_EXPONENTIAL_BACKOFF", &get, DEFAULT_ENABLE_EXPONENTIAL_BACKOFF);

        Self {
            output_dir,
            max_concurrent_tasks,
            max_response_time_ms,
            min_confidence,
            enable_exponential_backoff,
            websocket_port: port_config("WEBSOCKET_PORT", "WEBSOCKET_PORT_RANGE", &get),
            http_agent_port: port_config("HTTP_AGENT_PORT", "HTTP_AGENT_PORT_RANGE", &get),
            sse_port: port_config("SSE_PORT", "SSE_PORT_RANGE", &get),
        }
    }
}

fn port_config(single_var: &str, range_var: &str, get: &impl Fn(&str) -> Option<String>) -> PortSelectionConfig {
    let env_single = get(single_var).and_then(|raw| {
        parse_single_port_env(&raw).or_else(|| {
            warn!(var = single_var, value = %raw, "ignoring invalid port env var");
            None
        })
    });
    let env_range = get(range_var).and_then(|raw| {
        parse_range_env(&raw).or_else(|| {
            warn!(var = range_var, value = %raw, "ignoring invalid port range env var");
            None
        })
    });
    PortSelectionConfig { env_single, env_range, ..PortSelectionConfig::default() }
}

fn parse_bounded_u32(var: &str, get: &impl Fn(&str) -> Option<String>, min: u32, max: u32, default: u32) -> u32 {
    match get(var) {
        None => default,
        Some(raw) => match raw.trim().parse::<u32>() {
            Ok(v) if (min..=max).contains(&v) => v,
            _ => {
                warn!(var, value = %raw, min, max, "ignoring out-of-range env var, using default");
                default
            }
        },
    }
}

fn parse_bounded_f64(var: &str, get: &impl Fn(&str) -> Option<String>, min: f64, max: f64, default: f64) -> f64 {
    match get(var) {
        None => default,
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v >= min && v <= max => v,
            _ => {
                warn!(var, value = %raw, min, max, "ignoring out-of-range env var, using default");
                default
            }
        },
    }
}

fn parse_u64(var: &str, get: &impl Fn(&str) -> Option<String>, default: u64) -> u64 {
    match get(var) {
        None => default,
        Some(raw) => raw.trim().parse::<u64>().unwrap_or_else(|_| {
            warn!(var, value = %raw, "ignoring invalid env var, using default");
            default
        }),
    }
}

fn parse_bool(var: &str, get: &impl Fn(&str) -> Option<String>, default: bool) -> bool {
    match get(var) {
        None => default,
        Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => {
                warn!(var, value = %raw, "ignoring invalid bool env var, using default");
                default
            }
        },
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
