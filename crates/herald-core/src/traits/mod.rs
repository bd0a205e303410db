// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait definitions for every external collaborator of the dispatch core.
//!
//! Long-lived adapters (transport, store) extend [`PluginAdapter`]; per-call
//! collaborators are plain `#[async_trait]` traits.

pub mod adapter;
pub mod handler;
pub mod interpreter;
pub mod metrics;
pub mod security;
pub mod store;
pub mod tier;
pub mod transport;

pub use adapter::PluginAdapter;
pub use handler::{EventHandler, HandlerInput};
pub use interpreter::{CommandInterpreter, CommandRequest};
pub use metrics::{MetricsSink, ProcessingSample};
pub use security::{SecurityCheck, SecurityGate, Verdict};
pub use store::TenantSettingsStore;
pub use tier::TierSource;
pub use transport::Transport;
