// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn free_port() -> u16 {
    TcpListener::bind(("127.0.0.1", 0)).unwrap().local_addr().unwrap().port()
}

#[tokio::test]
async fn allocates_preferred_port_when_free() {
    let port = free_port();
    let cfg = PortSelectionConfig { preferred: port, ..Default::default() };
    assert_eq!(allocate_port(&cfg).await.unwrap(), port);
}

#[tokio::test]
async fn walks_forward_when_preferred_port_is_occupied() {
    let listener = TcpListener::bind(("127.0.0.1", 0)).unwrap();
    let occupied = listener.local_addr().unwrap().port();
    let cfg = PortSelectionConfig { preferred: occupied, retry_backoff: std::time::Duration::from_millis(1), ..Default::default() };
    let allocated = allocate_port(&cfg).await.unwrap();
    assert_ne!(allocated, occupied);
    drop(listener);
}

#[tokio::test]
async fn env_single_takes_priority_over_preferred() {
    let port = free_port();
    let cfg = PortSelectionConfig { preferred: 1, env_single: Some(port), ..Default::default() };
    assert_eq!(allocate_port(&cfg).await.unwrap(), port);
}

#[test]
fn parse_single_port_env_rejects_garbage() {
    assert_eq!(parse_single_port_env("abc"), None);
    assert_eq!(parse_single_port_env("99999999"), None);
    assert_eq!(parse_single_port_env("0"), None);
    assert_eq!(parse_single_port_env("8080"), Some(8080));
}

#[test]
fn parse_range_env_rejects_malformed_and_inverted_ranges() {
    assert_eq!(parse_range_env("abc-def"), None);
    assert_eq!(parse_range_env("100-50"), None);
    assert_eq!(parse_range_env("100-200"), Some((100, 200)));
}
