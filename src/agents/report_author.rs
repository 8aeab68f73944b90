use std::path::Path;
use std::sync::Arc;

use crate::core::{Stage, TaskConfig, Worker, WorkerConfig};
use crate::llm::LlmHandle;
use crate::schema::report_contract;

pub const TASK_NAME: &str = "write_procurement_report";
pub const OUTPUT_FILE: &str = "step_4_procurement_report.html";

pub fn worker_config() -> WorkerConfig {
    WorkerConfig {
        role: "Procurement Report Author Agent".to_string(),
        goal: "To generate a professional HTML page for the procurement report".to_string(),
        backstory: "The agent is designed to assist in generating a professional HTML page for the procurement report after looking into a list of products.".to_string(),
    }
}

pub fn task_config(output_dir: &Path) -> TaskConfig {
    TaskConfig {
        name: TASK_NAME.to_string(),
        description: [
            "The task is to generate a professional HTML page for the procurement report.",
            "You have to use Bootstrap CSS framework for a better UI.",
            "Use the provided context about the OHAY company to make a specialized report.",
            "The report will include the search results and prices of products from different websites.",
            "The report should be structured with the following sections:",
            "1. Executive Summary: A brief overview of the procurement process and key findings.",
            "2. Introduction: An introduction to the purpose and scope of the report.",
            "3. Methodology: A description of the methods used to gather and compare prices.",
            "4. Findings: Detailed comparison of prices from different websites, including tables and charts.",
            "5. Analysis: An analysis of the findings, highlighting any significant trends or observations.",
            "6. Recommendations: Suggestions for procurement based on the analysis.",
            "7. Conclusion: A summary of the report and final thoughts.",
            "8. Appendices: Any additional information, such as raw data or supplementary materials.",
        ]
        .join("\n"),
        expected_output: "A professional HTML page for the procurement report.".to_string(),
        contract: Arc::new(report_contract()),
        output_file: Some(output_dir.join(OUTPUT_FILE)),
    }
}

/// The author's worker also executes the revision task.
pub fn stage(llm: LlmHandle, output_dir: &Path) -> Stage {
    Stage::new(Worker::new(worker_config(), llm), task_config(output_dir))
}
