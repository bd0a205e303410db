// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dispatch orchestration for the Herald chat dispatch core.
//!
//! This crate provides:
//! - [`ConfigCache`]: TTL cache of per-tenant settings over the durable store
//! - [`BurstBatcher`]: per-tenant timed batching of status events
//! - [`Dispatcher`]: admission, security gate, classification and hand-off
//! - [`Ingress`]: multi-tenant event intake with graceful drain on shutdown

pub mod batcher;
pub mod cache;
pub mod dispatcher;
pub mod ingress;
pub mod presence;
pub mod settings;
pub mod shutdown;
pub mod status;

pub use batcher::{BatchItem, BatchProcessor, BurstBatcher, BurstQueueStore, InMemoryBurstQueues};
pub use cache::{ConfigCache, DefaultCause, Resolved, SettingsCaches};
pub use dispatcher::{
    Admission, Admitted, DispatchOutcome, DispatchReport, DispatchStage, Dispatcher,
    DispatcherBuilder, FixedTier, Handlers, NoopHandler, NoopMetrics,
};
pub use ingress::{Ingress, IngressSummary};
pub use presence::PresenceThrottle;
pub use settings::DispatchSettings;
pub use shutdown::{drain_in_flight, install_signal_handler};
pub use status::StatusViewer;
