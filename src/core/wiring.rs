//! Construction-order checks for context edges, and a printable view of the
//! resulting graph.

use std::collections::HashSet;
use std::fmt;

use crate::core::unit_of_work::{TaskHandle, UnitOfWork};
use crate::error::WiringError;

/// Validate the edges `upstream -> consumer` at wire time.
///
/// Every producer must have been constructed strictly before the consumer,
/// which rules out cycles without walking the graph.
pub(crate) fn check_edges(
    consumer: &TaskHandle,
    upstream: &[TaskHandle],
) -> Result<(), WiringError> {
    for producer in upstream {
        if producer == consumer {
            return Err(WiringError::SelfReference(consumer.to_string()));
        }
        if !producer.precedes(consumer) {
            return Err(WiringError::ForwardReference {
                consumer: consumer.to_string(),
                producer: producer.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a sequential schedule: every context handle is produced by a task
/// that appears earlier in `tasks`, and no task appears twice.
pub(crate) fn check_schedule(tasks: &[UnitOfWork]) -> Result<(), WiringError> {
    if tasks.is_empty() {
        return Err(WiringError::Empty);
    }

    let mut scheduled: HashSet<&TaskHandle> = HashSet::with_capacity(tasks.len());
    for task in tasks {
        for producer in task.context() {
            if !scheduled.contains(producer) {
                return Err(WiringError::NotScheduledBefore {
                    consumer: task.name().to_string(),
                    producer: producer.to_string(),
                });
            }
        }
        if !scheduled.insert(task.handle()) {
            return Err(WiringError::DuplicateTask(task.name().to_string()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub producer: TaskHandle,
    pub consumer: TaskHandle,
}

/// Execution order plus context edges of a schedule.
#[derive(Debug, Clone)]
pub struct WiringPlan {
    pub steps: Vec<PlanStep>,
}

#[derive(Debug, Clone)]
pub struct PlanStep {
    pub task: TaskHandle,
    pub worker_role: String,
    pub output_file: Option<String>,
    pub context: Vec<TaskHandle>,
}

impl WiringPlan {
    pub fn from_tasks(tasks: &[UnitOfWork]) -> Self {
        let steps = tasks
            .iter()
            .map(|task| PlanStep {
                task: task.handle().clone(),
                worker_role: task.worker().role().to_string(),
                output_file: task.output_file().map(|p| p.display().to_string()),
                context: task.context().to_vec(),
            })
            .collect();
        Self { steps }
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.steps
            .iter()
            .flat_map(|step| {
                step.context.iter().map(|producer| Edge {
                    producer: producer.clone(),
                    consumer: step.task.clone(),
                })
            })
            .collect()
    }
}

impl fmt::Display for WiringPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            write!(f, "{}. {} [{}]", idx + 1, step.task, step.worker_role)?;
            if let Some(path) = &step.output_file {
                write!(f, " -> {}", path)?;
            }
            writeln!(f)?;
        }
        writeln!(f)?;
        writeln!(f, "Edges:")?;
        for edge in self.edges() {
            writeln!(f, "  {} -> {}", edge.producer, edge.consumer)?;
        }
        Ok(())
    }
}
