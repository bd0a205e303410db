// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-delimited JSON transport.
//!
//! Reads one [`InboundEvent`] per line from any async reader and writes every
//! outbound primitive as one JSON line to a writer. `herald serve` wires it to
//! stdin/stdout; `herald replay` reads a recorded file. Unseen statuses for the
//! start-up catch-up are handed in up front.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use herald_core::{
    AdapterType, EventKey, HealthStatus, HeraldError, InboundEvent, PluginAdapter, PresenceKind,
    Transport,
};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::{debug, warn};

type LineReader = Lines<BufReader<Box<dyn tokio::io::AsyncRead + Send + Unpin>>>;
type LineWriter = Box<dyn AsyncWrite + Send + Unpin>;

fn io_err(context: &str, e: std::io::Error) -> HeraldError {
    HeraldError::Transport {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}

/// NDJSON transport over an arbitrary reader/writer pair.
///
/// Lines that are blank or fail to parse are skipped with a warning; the
/// stream ends at EOF.
pub struct NdjsonTransport {
    name: String,
    own_id: Option<String>,
    lines: Mutex<LineReader>,
    out: Mutex<LineWriter>,
    line_no: AtomicU64,
    skipped: AtomicU64,
    unseen: Mutex<Vec<InboundEvent>>,
}

impl NdjsonTransport {
    pub fn new(
        name: impl Into<String>,
        reader: impl tokio::io::AsyncRead + Send + Unpin + 'static,
        writer: impl AsyncWrite + Send + Unpin + 'static,
    ) -> Self {
        let reader: Box<dyn tokio::io::AsyncRead + Send + Unpin> = Box::new(reader);
        Self {
            name: name.into(),
            own_id: None,
            lines: Mutex::new(BufReader::new(reader).lines()),
            out: Mutex::new(Box::new(writer)),
            line_no: AtomicU64::new(0),
            skipped: AtomicU64::new(0),
            unseen: Mutex::new(Vec::new()),
        }
    }

    /// Events from stdin, actions to stdout.
    pub fn stdio() -> Self {
        Self::new("ndjson-stdio", tokio::io::stdin(), tokio::io::stdout())
    }

    /// Events from a recorded file, actions to stdout.
    pub async fn open(path: &Path) -> Result<Self, HeraldError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| io_err(&format!("cannot open {}", path.display()), e))?;
        Ok(Self::new(
            format!("ndjson-file:{}", path.display()),
            file,
            tokio::io::stdout(),
        ))
    }

    /// Reads every event of a recorded file up front.
    pub async fn read_file(path: &Path) -> Result<Vec<InboundEvent>, HeraldError> {
        let source = Self::open(path).await?;
        let mut events = Vec::new();
        while let Some(event) = source.next_event().await? {
            events.push(event);
        }
        Ok(events)
    }

    pub fn with_own_id(mut self, own_id: Option<String>) -> Self {
        self.own_id = own_id;
        self
    }

    /// Statuses reported, once, as missed while offline.
    pub fn with_unseen_statuses(mut self, statuses: Vec<InboundEvent>) -> Self {
        self.unseen = Mutex::new(statuses);
        self
    }

    /// Lines dropped because they were not valid events.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    async fn emit(&self, action: Value) -> Result<(), HeraldError> {
        let mut line = action.to_string();
        line.push('\n');
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| io_err("write failed", e))?;
        out.flush().await.map_err(|e| io_err("flush failed", e))
    }
}

#[async_trait]
impl PluginAdapter for NdjsonTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Transport
    }

    async fn health_check(&self) -> Result<HealthStatus, HeraldError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), HeraldError> {
        let mut out = self.out.lock().await;
        out.flush().await.map_err(|e| io_err("flush failed", e))
    }
}

#[async_trait]
impl Transport for NdjsonTransport {
    fn own_id(&self) -> Option<&str> {
        self.own_id.as_deref()
    }

    async fn next_event(&self) -> Result<Option<InboundEvent>, HeraldError> {
        let mut lines = self.lines.lock().await;
        loop {
            let Some(line) = lines
                .next_line()
                .await
                .map_err(|e| io_err("read failed", e))?
            else {
                debug!(transport = %self.name, "input stream ended");
                return Ok(None);
            };
            let line_no = self.line_no.fetch_add(1, Ordering::Relaxed) + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<InboundEvent>(line) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    self.skipped.fetch_add(1, Ordering::Relaxed);
                    warn!(transport = %self.name, line = line_no, error = %e, "skipping unparseable event line");
                }
            }
        }
    }

    async fn fetch_unseen_statuses(&self) -> Result<Vec<InboundEvent>, HeraldError> {
        let unseen = std::mem::take(&mut *self.unseen.lock().await);
        debug!(transport = %self.name, count = unseen.len(), "handing out unseen statuses");
        Ok(unseen)
    }

    async fn send_reaction(
        &self,
        key: &EventKey,
        emoji: &str,
        recipients: &[String],
    ) -> Result<(), HeraldError> {
        self.emit(json!({
            "action": "reaction",
            "key": key,
            "emoji": emoji,
            "recipients": recipients,
        }))
        .await
    }

    async fn mark_read(&self, keys: &[EventKey]) -> Result<(), HeraldError> {
        self.emit(json!({ "action": "read", "keys": keys })).await
    }

    async fn set_presence(&self, chat_id: &str, presence: PresenceKind) -> Result<(), HeraldError> {
        self.emit(json!({
            "action": "presence",
            "chat_id": chat_id,
            "presence": presence,
        }))
        .await
    }
}
