// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Identity normalization and event classification for the Herald dispatch core.
//!
//! This crate provides:
//! - [`normalize`]: raw transport envelope to [`herald_core::ChatEvent`]
//! - [`EventClassifier`]: precedence-ordered category assignment

pub mod classifier;
pub mod identity;

pub use classifier::{AmbientFlags, Category, Classification, EventClassifier, POLL_MARKER};
pub use identity::normalize;
