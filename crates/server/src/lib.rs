// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rdd-server: the job manager, event notifier, runtime configuration,
//! and the runtime root that wires every other crate's subsystem
//! together for the lifetime of the process.

pub mod config;
pub mod events;
pub mod jobs;
pub mod runtime;

pub use config::RuntimeConfig;
pub use events::{Event, EventKind, EventNotifier, Subscription, SubscriptionId, DEFAULT_HIGH_WATERMARK};
pub use jobs::{JobManager, RateLimitedJob, DEFAULT_MAX_JOBS};
pub use runtime::Runtime;
