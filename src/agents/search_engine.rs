use std::path::Path;
use std::sync::Arc;

use crate::core::{JsonContract, Stage, TaskConfig, Worker, WorkerConfig};
use crate::llm::LlmHandle;
use crate::schema::AllSearchResults;
use crate::tools::{SearchProvider, SearchTool};

pub const TASK_NAME: &str = "search_products";
pub const OUTPUT_FILE: &str = "step_2_search_engine.json";

pub fn worker_config() -> WorkerConfig {
    WorkerConfig {
        role: "Search Engine Agent".to_string(),
        goal: "To search for products based on the suggested search query".to_string(),
        backstory: "The agent is designed to help in looking for products by searching for products based on the suggested search queries.".to_string(),
    }
}

pub fn task_config(output_dir: &Path) -> TaskConfig {
    TaskConfig {
        name: TASK_NAME.to_string(),
        description: [
            "The task is to search for products based on the suggested search queries.",
            "You have to collect results from multiple search queries.",
            "Ignore any suspicious links or not an ecommerce single product website link.",
            "Ignore any search results with confidence score less than ({score_th}) and a customer rating (score) lower than ({score_ra})",
            "The search results will be used to compare prices of products from different websites.",
        ]
        .join("\n"),
        expected_output: "A JSON object containing the search results.".to_string(),
        contract: Arc::new(JsonContract::<AllSearchResults>::new("AllSearchResults")),
        output_file: Some(output_dir.join(OUTPUT_FILE)),
    }
}

pub fn stage(
    llm: LlmHandle,
    output_dir: &Path,
    search: Option<Arc<dyn SearchProvider>>,
    max_iterations: usize,
) -> Stage {
    let worker = Worker::new(worker_config(), llm)
        .with_tool(Arc::new(SearchTool::new(search)))
        .with_max_iterations(max_iterations);
    Stage::new(worker, task_config(output_dir))
}
