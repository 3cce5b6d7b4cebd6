// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

fn reader(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_when_nothing_is_set() {
    let cfg = RuntimeConfig::from_env_reader(reader(&[]));
    assert_eq!(cfg.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);
    assert_eq!(cfg.max_response_time_ms, DEFAULT_MAX_RESPONSE_TIME_MS);
    assert_eq!(cfg.min_confidence, DEFAULT_MIN_CONFIDENCE);
    assert_eq!(cfg.enable_exponential_backoff, DEFAULT_ENABLE_EXPONENTIAL_BACKOFF);
    assert_eq!(cfg.output_dir, PathBuf::from("."));
}

#[test]
fn valid_values_are_honored() {
    let cfg = RuntimeConfig::from_env_reader(reader(&[
        ("VIBE_CODER_OUTPUT_DIR", "/tmp/out"),
        ("VIBE_MAX_CONCURRENT_TASKS", "25"),
        ("VIBE_MAX_RESPONSE_TIME", "75"),
        ("VIBE_MIN_CONFIDENCE", "0.9"),
        ("VIBE_ENABLE_EXPONENTIAL_BACKOFF", "false"),
    ]));
    assert_eq!(cfg.output_dir, PathBuf::from("/tmp/out"));
    assert_eq!(cfg.max_concurrent_tasks, 25);
    assert_eq!(cfg.max_response_time_ms, 75);
    assert_eq!(cfg.min_confidence, 0.9);
    assert!(!cfg.enable_exponential_backoff);
}

#[test]
fn out_of_range_max_concurrent_tasks_falls_back_to_default() {
    let cfg = RuntimeConfig::from_env_reader(reader(&[("VIBE_MAX_CONCURRENT_TASKS", "0")]));
    assert_eq!(cfg.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);

    let cfg = RuntimeConfig::from_env_reader(reader(&[("VIBE_MAX_CONCURRENT_TASKS", "101")]));
    assert_eq!(cfg.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);

    let cfg = RuntimeConfig::from_env_reader(reader(&[("VIBE_MAX_CONCURRENT_TASKS", "not-a-number")]));
    assert_eq!(cfg.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);
}

#[test]
fn out_of_range_confidence_falls_back_to_default() {
    let cfg = RuntimeConfig::from_env_reader(reader(&[("VIBE_MIN_CONFIDENCE", "1.5")]));
    assert_eq!(cfg.min_confidence, DEFAULT_MIN_CONFIDENCE);
}

#[test]
fn invalid_port_env_vars_are_ignored_not_fatal() {
    let cfg = RuntimeConfig::from_env_reader(reader(&[
        ("WEBSOCKET_PORT", "not-a-port"),
        ("HTTP_AGENT_PORT_RANGE", "9000"),
        ("SSE_PORT", "70000"),
    ]));
    assert!(cfg.websocket_port.env_single.is_none());
    assert!(cfg.http_agent_port.env_range.is_none());
    assert!(cfg.sse_port.env_single.is_none());
}

#[test]
fn valid_port_env_vars_are_parsed() {
    let cfg = RuntimeConfig::from_env_reader(reader(&[("WEBSOCKET_PORT", "8080"), ("SSE_PORT_RANGE", "9000-9010")]));
    assert_eq!(cfg.websocket_port.env_single, Some(8080));
    assert_eq!(cfg.sse_port.env_range, Some((9000, 9010)));
}
