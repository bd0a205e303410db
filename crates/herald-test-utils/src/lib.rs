// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Herald integration tests.
//!
//! Provides mock adapters and test harness infrastructure for fast,
//! deterministic, CI-runnable tests without a live transport.
//!
//! # Components
//!
//! - [`MockTransport`] - Mock chat transport with event injection and capture
//! - [`MockSettingsStore`] - In-memory settings store with failure injection
//! - [`EventBuilder`] - Fluent construction of raw inbound events
//! - [`TestHarness`] - A fully wired single-tenant dispatcher

pub mod events;
pub mod harness;
pub mod mock_collaborators;
pub mod mock_store;
pub mod mock_transport;

pub use events::{EventBuilder, USER_SUFFIX};
pub use harness::{DEFAULT_TENANT, TestHarness, TestHarnessBuilder};
pub use mock_collaborators::{
    FailingTier, HandledEvent, MockSecurity, RecordedCommand, RecordingHandler,
    RecordingInterpreter, RecordingMetrics,
};
pub use mock_store::MockSettingsStore;
pub use mock_transport::{MockTransport, SentReaction};
