// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn greenfield_project_has_no_files() {
    let ctx = ProjectContext::default();
    assert!(ctx.is_greenfield());
}

#[test]
fn complexity_score_rises_with_architectural_keywords() {
    let mut ctx = ProjectContext { total_files: 10, ..Default::default() };
    assert_eq!(ctx.complexity_score(), 0.0);

    ctx.frameworks.push("Distributed Event Bus".to_string());
    assert!(ctx.complexity_score() > 0.0);
}

#[test]
fn domain_specific_detection_matches_keywords() {
    let mut ctx = ProjectContext::default();
    assert!(!ctx.is_domain_specific());
    ctx.languages.push("Solidity".to_string());
    ctx.frameworks.push("blockchain-sdk".to_string());
    assert!(ctx.is_domain_specific());
}
