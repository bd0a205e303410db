// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Herald dispatch core.

use thiserror::Error;

/// The primary error type used across all Herald adapter traits and core operations.
#[derive(Debug, Error)]
pub enum HeraldError {
    /// Chat or sender identity could not be extracted from an inbound event.
    #[error("malformed event: {reason}")]
    MalformedEvent { reason: String },

    /// The durable store is unavailable or a query failed.
    #[error("store error: {source}")]
    TransientStore {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The security collaborator rejected the event.
    #[error("event blocked by security gate: {reason}")]
    SecurityBlocked { reason: String },

    /// A downstream handler failed.
    #[error("handler `{handler}` failed: {source}")]
    Handler {
        handler: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A transport primitive (send, read, presence) failed.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored setting could not be decoded.
    #[error("invalid setting `{key}`: {message}")]
    InvalidSetting { key: String, message: String },

    /// Configuration errors.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HeraldError {
    /// Shorthand for a [`HeraldError::MalformedEvent`].
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`HeraldError::TransientStore`] from any error source.
    pub fn store(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::TransientStore {
            source: source.into(),
        }
    }

    /// Shorthand for a [`HeraldError::Transport`] without an underlying source.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an arbitrary error as a [`HeraldError::Handler`] failure.
    pub fn handler(
        handler: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Handler {
            handler: handler.into(),
            source: source.into(),
        }
    }

    /// Stable short label for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            HeraldError::MalformedEvent { .. } => "malformed_event",
            HeraldError::TransientStore { .. } => "transient_store",
            HeraldError::SecurityBlocked { .. } => "security_blocked",
            HeraldError::Handler { .. } => "handler",
            HeraldError::Transport { .. } => "transport",
            HeraldError::InvalidSetting { .. } => "invalid_setting",
            HeraldError::Config(_) => "config",
            HeraldError::Internal(_) => "internal",
        }
    }
}
