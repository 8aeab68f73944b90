//! Critique and revision: the only fan-in of the pipeline.
//!
//! The critic's own unit of work reads the author's report. The revision unit
//! of work reads both the report and the critique, and is executed by the
//! author's worker so the report is revised by whoever wrote it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::{
    PipelineStage, Stage, TaskConfig, TaskHandle, TextContract, UnitOfWork, Worker, WorkerConfig,
};
use crate::error::WiringError;
use crate::llm::LlmHandle;
use crate::schema::report_contract;

pub const CRITIQUE_TASK_NAME: &str = "critique_procurement_report";
pub const REVISION_TASK_NAME: &str = "revise_procurement_report";
pub const REVISION_OUTPUT_FILE: &str = "step_4_updated_procurement_report.html";
pub const REASONING_ATTEMPTS: u8 = 3;

pub fn worker_config() -> WorkerConfig {
    WorkerConfig {
        role: "Procurement Quality Assurance Expert".to_string(),
        goal: "Critically review procurement reports for accuracy, completeness, and quality"
            .to_string(),
        backstory: "You are a meticulous procurement analyst with 15 years of experience.
Your expertise includes:
- Identifying gaps in market analysis
- Spotting missing cost factors
- Checking supplier evaluation completeness
- Ensuring risk assessment thoroughness
- Validating data consistency and accuracy

You are known for being thorough, critical, and constructive. You never accept
reports at face value and always look for ways to improve them."
            .to_string(),
    }
}

pub fn critique_task_config() -> TaskConfig {
    TaskConfig {
        name: CRITIQUE_TASK_NAME.to_string(),
        description: "Thoroughly review and critique the draft procurement report.

Provide specific, constructive feedback on:

**Accuracy & Completeness:**
- Are all cost factors included?
- Is the market analysis comprehensive?
- Are there any factual inaccuracies?
- Is the data interpretation correct?

**Structure & Clarity:**
- Is the report well-organized?
- Are recommendations clear and actionable?
- Is the executive summary effective?

**Gaps & Improvements:**
- What important information is missing?
- What sections need more depth?
- Are there better alternatives not considered?

Provide detailed, specific feedback that the author can use to improve the report."
            .to_string(),
        expected_output: "Detailed critique with specific improvement suggestions".to_string(),
        contract: Arc::new(TextContract),
        output_file: None,
    }
}

pub fn revision_task_config(output_dir: &Path) -> TaskConfig {
    TaskConfig {
        name: REVISION_TASK_NAME.to_string(),
        description: "Revise and improve the procurement report based on the detailed critique provided.

Address all points raised in the critique:
- Fix any factual inaccuracies
- Fill identified information gaps
- Improve structure and clarity
- Strengthen recommendations
- Enhance executive summary

Ensure the final report is polished, comprehensive, and meets the highest quality standards.
Incorporate the feedback while maintaining your professional writing style."
            .to_string(),
        expected_output: "Final, polished procurement report".to_string(),
        contract: Arc::new(report_contract()),
        output_file: Some(output_dir.join(REVISION_OUTPUT_FILE)),
    }
}

#[derive(Debug, Clone)]
pub struct ReportCriticStage {
    critique: Stage,
    revision: Option<UnitOfWork>,
    output_dir: PathBuf,
}

impl ReportCriticStage {
    pub fn new(llm: LlmHandle, output_dir: &Path) -> Self {
        let worker = Worker::new(worker_config(), llm).with_reasoning(REASONING_ATTEMPTS);
        Self {
            critique: Stage::new(worker, critique_task_config()),
            revision: None,
            output_dir: output_dir.to_path_buf(),
        }
    }

    pub fn worker(&self) -> &Arc<Worker> {
        self.critique.worker()
    }

    pub fn critique_task(&self) -> &UnitOfWork {
        self.critique.unit_of_work()
    }

    /// `None` until [`ReportCriticStage::set_revision_context`] has been called.
    pub fn revision_task(&self) -> Option<&UnitOfWork> {
        self.revision.as_ref()
    }

    /// The critique reads exactly the author's report.
    pub fn set_critique_context(mut self, author_task: &TaskHandle) -> Result<Self, WiringError> {
        self.critique = self.critique.wire([author_task.clone()])?;
        Ok(self)
    }

    /// Create the revision unit of work: context is `[author_task, critique_task]`
    /// and it runs on `author_worker`. Calling it again replaces the previous
    /// revision with a new one.
    pub fn set_revision_context(
        mut self,
        author_task: &TaskHandle,
        critique_task: &TaskHandle,
        author_worker: &Arc<Worker>,
    ) -> Result<Self, WiringError> {
        let revision = UnitOfWork::new(
            revision_task_config(&self.output_dir),
            Arc::clone(author_worker),
        )
        .with_context(vec![author_task.clone(), critique_task.clone()])?;
        log::debug!(
            "Revision '{}' bound to worker '{}'",
            revision.name(),
            author_worker.role()
        );
        self.revision = Some(revision);
        Ok(self)
    }
}

impl PipelineStage for ReportCriticStage {
    fn worker(&self) -> &Arc<Worker> {
        self.critique.worker()
    }

    fn units_of_work(&self) -> Vec<&UnitOfWork> {
        let mut units = vec![self.critique.unit_of_work()];
        units.extend(self.revision.as_ref());
        units
    }
}
