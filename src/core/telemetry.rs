use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Success,
    Failed,
}

/// A single entry in the execution trace: one attempted unit of work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEntry {
    pub timestamp: DateTime<Utc>,
    pub session_id: Option<Uuid>,
    pub task: String,
    pub worker_role: String,
    pub provider: String,
    pub model_name: String,
    /// Names of the upstream tasks whose outputs were given as context.
    pub context: Vec<String>,
    pub output: Value,
    pub duration_ms: u64,
    pub status: TraceStatus,
    pub metadata: HashMap<String, String>,
}

/// Trait for recording execution traces.
pub trait Telemetry: Send + Sync {
    fn record(&self, entry: TraceEntry);
    fn flush(&self);
}

/// Simple in-memory collector for traces.
#[derive(Default)]
pub struct MemoryTelemetry {
    traces: Mutex<Vec<TraceEntry>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_traces(&self) -> Vec<TraceEntry> {
        self.traces
            .lock()
            .map(|traces| traces.clone())
            .unwrap_or_default()
    }
}

impl Telemetry for MemoryTelemetry {
    fn record(&self, entry: TraceEntry) {
        if let Ok(mut traces) = self.traces.lock() {
            traces.push(entry);
        }
    }

    fn flush(&self) {
        // No-op for memory collector
    }
}

/// Appends one JSON object per trace to a file.
///
/// The file is opened lazily on the first record. Write failures are logged
/// and dropped; telemetry never aborts a run.
pub struct JsonlTelemetry {
    path: PathBuf,
    writer: Mutex<Option<BufWriter<File>>>,
}

impl JsonlTelemetry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> std::io::Result<BufWriter<File>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        Ok(BufWriter::new(file))
    }
}

impl Telemetry for JsonlTelemetry {
    fn record(&self, entry: TraceEntry) {
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(err) => {
                log::warn!("Dropping trace for '{}': {}", entry.task, err);
                return;
            }
        };

        let Ok(mut guard) = self.writer.lock() else {
            return;
        };
        if guard.is_none() {
            match self.open() {
                Ok(writer) => *guard = Some(writer),
                Err(err) => {
                    log::warn!("Cannot open trace file {}: {}", self.path.display(), err);
                    return;
                }
            }
        }
        if let Some(writer) = guard.as_mut() {
            if let Err(err) = writeln!(writer, "{}", line) {
                log::warn!("Failed to write trace to {}: {}", self.path.display(), err);
            }
        }
    }

    fn flush(&self) {
        if let Ok(mut guard) = self.writer.lock() {
            if let Some(writer) = guard.as_mut() {
                if let Err(err) = writer.flush() {
                    log::warn!("Failed to flush {}: {}", self.path.display(), err);
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndState {
    Success,
    Fail,
}

/// Summary returned when a session ends.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub state: EndState,
    pub tags: Vec<String>,
    pub traces: usize,
    pub elapsed_ms: u64,
}

struct Session {
    id: Uuid,
    tags: Vec<String>,
    started: Instant,
    traces: usize,
}

/// Session-scoped handle over a [`Telemetry`] sink.
///
/// Cloning shares the session. `start` opens a session, every recorded trace
/// is stamped with its id, and `end` closes it and flushes the sink.
#[derive(Clone)]
pub struct Observer {
    sink: Arc<dyn Telemetry>,
    default_tags: Vec<String>,
    session: Arc<Mutex<Option<Session>>>,
}

impl Observer {
    pub fn new(sink: Arc<dyn Telemetry>) -> Self {
        Self {
            sink,
            default_tags: Vec::new(),
            session: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_default_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.default_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Open a session. Starting while a session is open replaces it.
    pub fn start(&self, tags: &[String]) -> Uuid {
        let id = Uuid::new_v4();
        let mut all_tags = self.default_tags.clone();
        all_tags.extend(tags.iter().cloned());
        log::info!("Telemetry session {} started (tags: {:?})", id, all_tags);

        if let Ok(mut session) = self.session.lock() {
            if let Some(previous) = session.replace(Session {
                id,
                tags: all_tags,
                started: Instant::now(),
                traces: 0,
            }) {
                log::warn!("Telemetry session {} was never ended", previous.id);
            }
        }
        id
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session
            .lock()
            .ok()
            .and_then(|s| s.as_ref().map(|s| s.id))
    }

    pub fn record(&self, mut entry: TraceEntry) {
        if let Ok(mut session) = self.session.lock() {
            if let Some(session) = session.as_mut() {
                entry.session_id = Some(session.id);
                session.traces += 1;
            }
        }
        self.sink.record(entry);
    }

    /// Close the current session and flush the sink. `None` if no session was open.
    pub fn end(&self, state: EndState) -> Option<SessionSummary> {
        let session = self.session.lock().ok().and_then(|mut s| s.take());
        self.sink.flush();

        let session = session?;
        let summary = SessionSummary {
            session_id: session.id,
            state,
            tags: session.tags,
            traces: session.traces,
            elapsed_ms: session.started.elapsed().as_millis() as u64,
        };
        log::info!(
            "Telemetry session {} ended: {:?} ({} traces, {} ms)",
            summary.session_id,
            summary.state,
            summary.traces,
            summary.elapsed_ms
        );
        Some(summary)
    }
}
