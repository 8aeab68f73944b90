//! # Crew
//!
//! The sequential runtime that executes assembled units of work.
//!
//! A [`Crew`] is built from workers and units of work (usually through
//! [`PipelineStage`]s), validated once, then kicked off with the run inputs.
//! Units of work run strictly in list order; each one sees the conformed
//! outputs of its context handles, which must all have completed earlier.

mod executor;
mod prompt;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;

use crate::core::telemetry::{TraceEntry, TraceStatus};
use crate::core::{knowledge, template, wiring};
use crate::core::{
    KnowledgeSource, Observer, PipelineStage, TaskHandle, UnitOfWork, WiringPlan, Worker,
};
use crate::error::{CrewError, WiringError};
use crate::inputs::RunInputs;

pub use prompt::CONTEXT_HEADER;

/// How the crew schedules its units of work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Process {
    #[default]
    Sequential,
}

/// The conformed output of one unit of work.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskOutput {
    pub handle: TaskHandle,
    pub worker_role: String,
    pub raw: String,
    pub json: Option<Value>,
    pub output_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrewOutput {
    /// Output of the last unit of work.
    pub raw: String,
    pub tasks_output: Vec<TaskOutput>,
}

impl CrewOutput {
    pub fn task(&self, handle: &TaskHandle) -> Option<&TaskOutput> {
        self.tasks_output.iter().find(|t| &t.handle == handle)
    }
}

#[derive(Default)]
pub struct CrewBuilder {
    workers: Vec<Arc<Worker>>,
    tasks: Vec<UnitOfWork>,
    knowledge: Vec<KnowledgeSource>,
    observer: Option<Observer>,
    process: Process,
}

impl CrewBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a worker. Registering the same worker twice is a no-op.
    pub fn worker(mut self, worker: Arc<Worker>) -> Self {
        if !self.workers.iter().any(|w| w.id() == worker.id()) {
            self.workers.push(worker);
        }
        self
    }

    pub fn task(mut self, task: UnitOfWork) -> Self {
        self.tasks.push(task);
        self
    }

    /// Register a stage's worker and append its units of work.
    pub fn stage(mut self, stage: &dyn PipelineStage) -> Self {
        self = self.worker(Arc::clone(stage.worker()));
        for task in stage.units_of_work() {
            self.tasks.push(task.clone());
        }
        self
    }

    pub fn knowledge(mut self, source: KnowledgeSource) -> Self {
        self.knowledge.push(source);
        self
    }

    pub fn observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn process(mut self, process: Process) -> Self {
        self.process = process;
        self
    }

    pub fn build(self) -> Result<Crew, WiringError> {
        wiring::check_schedule(&self.tasks)?;
        for task in &self.tasks {
            if !self.workers.iter().any(|w| w.id() == task.worker().id()) {
                return Err(WiringError::UnknownWorker {
                    task: task.name().to_string(),
                    role: task.worker().role().to_string(),
                });
            }
        }
        log::debug!(
            "Crew built: {} workers, {} tasks, {:?}",
            self.workers.len(),
            self.tasks.len(),
            self.process
        );
        Ok(Crew {
            workers: self.workers,
            tasks: self.tasks,
            knowledge: self.knowledge,
            observer: self.observer,
            process: self.process,
        })
    }
}

pub struct Crew {
    workers: Vec<Arc<Worker>>,
    tasks: Vec<UnitOfWork>,
    knowledge: Vec<KnowledgeSource>,
    observer: Option<Observer>,
    process: Process,
}

impl Crew {
    pub fn builder() -> CrewBuilder {
        CrewBuilder::new()
    }

    pub fn workers(&self) -> &[Arc<Worker>] {
        &self.workers
    }

    pub fn tasks(&self) -> &[UnitOfWork] {
        &self.tasks
    }

    pub fn process(&self) -> Process {
        self.process
    }

    pub fn plan(&self) -> WiringPlan {
        WiringPlan::from_tasks(&self.tasks)
    }

    /// Run every unit of work in order and return all outputs.
    ///
    /// The first failure aborts the run; files written by earlier units of
    /// work are left in place.
    pub async fn kickoff(&self, inputs: &RunInputs) -> Result<CrewOutput, CrewError> {
        inputs.validate()?;
        let vars = inputs.template_vars();
        let knowledge = knowledge::render(&self.knowledge);
        let mut completed: HashMap<TaskHandle, usize> = HashMap::with_capacity(self.tasks.len());
        let mut outputs: Vec<TaskOutput> = Vec::with_capacity(self.tasks.len());

        for (idx, task) in self.tasks.iter().enumerate() {
            let worker = task.worker();
            log::info!(
                "[{}/{}] '{}' working on {}",
                idx + 1,
                self.tasks.len(),
                worker.role(),
                task.name()
            );
            let started = Instant::now();

            let context = task
                .context()
                .iter()
                .map(|h| {
                    completed
                        .get(h)
                        .map(|&i| outputs[i].raw.as_str())
                        .ok_or_else(|| CrewError::MissingContext(h.clone()))
                })
                .collect::<Result<Vec<&str>, CrewError>>()?;

            let result = self
                .run_task(task, &vars, context, knowledge.as_deref(), inputs)
                .await;
            let elapsed = started.elapsed();

            let (output, metadata) = match result {
                Ok(pair) => pair,
                Err(err) => {
                    log::error!("Task {} failed: {}", task.name(), err);
                    self.trace(
                        task,
                        Value::String(err.to_string()),
                        elapsed.as_millis() as u64,
                        TraceStatus::Failed,
                        HashMap::new(),
                    );
                    return Err(err);
                }
            };

            self.trace(
                task,
                output.json.clone().unwrap_or_else(|| Value::String(output.raw.clone())),
                elapsed.as_millis() as u64,
                TraceStatus::Success,
                metadata,
            );
            log::info!("Finished {} in {:.1}s", task.name(), elapsed.as_secs_f64());

            completed.insert(task.handle().clone(), outputs.len());
            outputs.push(output);
        }

        let raw = outputs.last().map(|o| o.raw.clone()).unwrap_or_default();
        Ok(CrewOutput {
            raw,
            tasks_output: outputs,
        })
    }

    async fn run_task(
        &self,
        task: &UnitOfWork,
        vars: &HashMap<String, String>,
        context: Vec<&str>,
        knowledge: Option<&str>,
        inputs: &RunInputs,
    ) -> Result<(TaskOutput, HashMap<String, String>), CrewError> {
        let template_err = |source| CrewError::Template {
            task: task.name().to_string(),
            source,
        };
        let assignment = executor::Assignment {
            task: task.name(),
            description: template::interpolate(task.description(), vars).map_err(template_err)?,
            expected_output: template::interpolate(task.expected_output(), vars)
                .map_err(template_err)?,
            schema: task.contract().json_schema(),
            context,
            knowledge,
        };

        let execution = executor::execute(task.worker(), &assignment).await?;
        let conformed = task
            .contract()
            .conform(&execution.answer, inputs)
            .map_err(|source| CrewError::Schema {
                task: task.name().to_string(),
                source,
            })?;

        if let Some(path) = task.output_file() {
            write_output(path, &conformed.raw)?;
            log::info!("Wrote {}", path.display());
        }

        let metadata = HashMap::from([
            ("llm_calls".to_string(), execution.llm_calls.to_string()),
            ("tool_calls".to_string(), execution.tool_calls.to_string()),
            ("contract".to_string(), task.contract().name().to_string()),
        ]);

        Ok((
            TaskOutput {
                handle: task.handle().clone(),
                worker_role: task.worker().role().to_string(),
                raw: conformed.raw,
                json: conformed.json,
                output_file: task.output_file().map(Path::to_path_buf),
            },
            metadata,
        ))
    }

    fn trace(
        &self,
        task: &UnitOfWork,
        output: Value,
        duration_ms: u64,
        status: TraceStatus,
        metadata: HashMap<String, String>,
    ) {
        let Some(observer) = &self.observer else {
            return;
        };
        let worker = task.worker();
        observer.record(TraceEntry {
            timestamp: Utc::now(),
            session_id: None,
            task: task.name().to_string(),
            worker_role: worker.role().to_string(),
            provider: worker.llm().provider().to_string(),
            model_name: worker.llm().model().to_string(),
            context: task.context().iter().map(|h| h.name().to_string()).collect(),
            output,
            duration_ms,
            status,
            metadata,
        });
    }
}

fn write_output(path: &Path, content: &str) -> Result<(), CrewError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|source| CrewError::output_io(parent.to_path_buf(), source))?;
    }
    std::fs::write(path, content).map_err(|source| CrewError::output_io(path.to_path_buf(), source))
}
