use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::core::contract::OutputContract;
use crate::core::wiring;
use crate::core::worker::Worker;
use crate::error::WiringError;

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Opaque identity of a unit of work.
///
/// Handles are only minted when a unit of work is constructed, and carry the
/// process-wide construction sequence that wiring checks against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    id: Uuid,
    sequence: u64,
    name: Arc<str>,
}

impl TaskHandle {
    fn mint(name: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            name: Arc::from(name),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when `self` was constructed strictly before `other`.
    pub fn precedes(&self, other: &TaskHandle) -> bool {
        self.sequence < other.sequence
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Everything a unit of work needs besides the worker that executes it.
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Short stable name, used in logs, traces and errors.
    pub name: String,
    /// Instructions; `{placeholders}` are filled from the run inputs.
    pub description: String,
    pub expected_output: String,
    pub contract: Arc<dyn OutputContract>,
    pub output_file: Option<PathBuf>,
}

/// One stage's job: instructions, output contract, destination, context inputs
/// and the worker that executes it.
///
/// Values are immutable once built; re-wiring yields a fresh value that keeps
/// the same [`TaskHandle`].
#[derive(Debug, Clone)]
pub struct UnitOfWork {
    handle: TaskHandle,
    description: String,
    expected_output: String,
    contract: Arc<dyn OutputContract>,
    output_file: Option<PathBuf>,
    context: Vec<TaskHandle>,
    worker: Arc<Worker>,
}

impl UnitOfWork {
    pub fn new(config: TaskConfig, worker: Arc<Worker>) -> Self {
        Self {
            handle: TaskHandle::mint(&config.name),
            description: config.description,
            expected_output: config.expected_output,
            contract: config.contract,
            output_file: config.output_file,
            context: Vec::new(),
            worker,
        }
    }

    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn expected_output(&self) -> &str {
        &self.expected_output
    }

    pub fn contract(&self) -> &Arc<dyn OutputContract> {
        &self.contract
    }

    pub fn output_file(&self) -> Option<&Path> {
        self.output_file.as_deref()
    }

    /// Context inputs, in the order they were wired.
    pub fn context(&self) -> &[TaskHandle] {
        &self.context
    }

    /// The worker that executes this unit of work.
    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    /// A copy of this unit of work whose context is exactly `upstream`.
    pub fn with_context(&self, upstream: Vec<TaskHandle>) -> Result<Self, WiringError> {
        wiring::check_edges(&self.handle, &upstream)?;
        Ok(Self {
            context: upstream,
            ..self.clone()
        })
    }
}
