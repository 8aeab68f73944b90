use std::sync::Arc;

use crate::core::unit_of_work::{TaskConfig, TaskHandle, UnitOfWork};
use crate::core::worker::Worker;
use crate::error::WiringError;

/// Anything that contributes workers and units of work to a crew.
pub trait PipelineStage {
    fn worker(&self) -> &Arc<Worker>;

    /// Units of work in execution order.
    fn units_of_work(&self) -> Vec<&UnitOfWork>;
}

/// One worker paired with one unit of work.
#[derive(Debug, Clone)]
pub struct Stage {
    worker: Arc<Worker>,
    unit_of_work: UnitOfWork,
}

impl Stage {
    pub fn new(worker: Worker, task: TaskConfig) -> Self {
        let worker = Arc::new(worker);
        let unit_of_work = UnitOfWork::new(task, Arc::clone(&worker));
        Self {
            worker,
            unit_of_work,
        }
    }

    pub fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.unit_of_work
    }

    pub fn handle(&self) -> &TaskHandle {
        self.unit_of_work.handle()
    }

    /// Replace the context inputs of this stage's unit of work with `upstream`.
    ///
    /// Calling it again overwrites the previous edges; they never accumulate.
    pub fn wire(
        self,
        upstream: impl IntoIterator<Item = TaskHandle>,
    ) -> Result<Self, WiringError> {
        let unit_of_work = self
            .unit_of_work
            .with_context(upstream.into_iter().collect())?;
        log::debug!(
            "Wired '{}' <- {:?}",
            unit_of_work.name(),
            unit_of_work
                .context()
                .iter()
                .map(TaskHandle::name)
                .collect::<Vec<_>>()
        );
        Ok(Self {
            worker: self.worker,
            unit_of_work,
        })
    }
}

impl PipelineStage for Stage {
    fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }

    fn units_of_work(&self) -> Vec<&UnitOfWork> {
        vec![&self.unit_of_work]
    }
}
