// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trait ports for external collaborators.
//!
//! These are consumed-only interfaces: the engine and storage crates are
//! generic over them, or hold `Arc<dyn Trait>`, rather than depending on
//! a concrete agent runtime. Callers supply the real LLM client, research
//! backend, path validator, and task-list parser; this crate only
//! describes the shape of the call.

use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A schema the LLM response must conform to. Opaque to this crate; callers
/// interpret it (typically JSON Schema) when validating the completion.
pub type Schema = serde_json::Value;

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub json: Option<serde_json::Value>,
}

/// `complete(prompt, schema?) -> text|json`, with timeout/retry owned by the
/// caller (the engine applies its own backoff policy around this call; the
/// port itself is a single attempt).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, schema: Option<&Schema>) -> Result<LlmResponse>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchDepth {
    Shallow,
    Moderate,
    Targeted,
    Deep,
}

#[derive(Debug, Clone)]
pub struct ResearchScope {
    pub depth: ResearchDepth,
    pub estimated_queries: u32,
}

/// `research(query, scope) -> textContext`.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn research(&self, query: &str, scope: &ResearchScope) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathOp {
    Read,
    Write,
    Create,
    Delete,
}

#[derive(Debug, Clone)]
pub struct CanonicalPath(pub PathBuf);

/// `validate(path, op) -> {ok, canonical}|{error, violationType}`.
///
/// The core treats any `!ok` as a hard failure and never retries — callers
/// must propagate `Err` from this port straight through without recovery.
pub trait PathValidator: Send + Sync {
    fn validate(&self, path: &Path, op: PathOp) -> Result<CanonicalPath>;
}

#[derive(Debug, Clone)]
pub struct StructuredArtifact {
    pub title: String,
    pub body: serde_json::Value,
}

/// `parse(content, path) -> structuredArtifact`; errors surface to the
/// originating job as `parse_error`.
pub trait TaskListParser: Send + Sync {
    fn parse(&self, content: &str, path: &Path) -> Result<StructuredArtifact>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fakes {
    use super::*;
    use parking_lot::Mutex;

    /// Returns a fixed response (or a queued sequence) regardless of prompt.
    pub struct FakeLlmClient {
        responses: Mutex<Vec<LlmResponse>>,
        calls: Mutex<u32>,
    }

    impl FakeLlmClient {
        pub fn new(responses: Vec<LlmResponse>) -> Self {
            Self { responses: Mutex::new(responses), calls: Mutex::new(0) }
        }

        pub fn call_count(&self) -> u32 {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl LlmClient for FakeLlmClient {
        async fn complete(&self, _prompt: &str, _schema: Option<&Schema>) -> Result<LlmResponse> {
            *self.calls.lock() += 1;
            let mut responses = self.responses.lock();
            if responses.is_empty() {
                return Err(crate::error::CoreError::parse("fake llm exhausted"));
            }
            Ok(responses.remove(0))
        }
    }

    pub struct FakeResearchProvider {
        pub context: String,
    }

    #[async_trait]
    impl ResearchProvider for FakeResearchProvider {
        async fn research(&self, _query: &str, _scope: &ResearchScope) -> Result<String> {
            Ok(self.context.clone())
        }
    }

    pub struct FakePathValidator;

    impl PathValidator for FakePathValidator {
        fn validate(&self, path: &Path, _op: PathOp) -> Result<CanonicalPath> {
            Ok(CanonicalPath(path.to_path_buf()))
        }
    }
}
