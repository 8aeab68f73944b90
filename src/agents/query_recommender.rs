use std::path::Path;
use std::sync::Arc;

use crate::core::{JsonContract, Stage, TaskConfig, Worker, WorkerConfig};
use crate::llm::LlmHandle;
use crate::schema::SuggestedSearchQueries;

pub const TASK_NAME: &str = "suggest_search_queries";
pub const OUTPUT_FILE: &str = "step_1_suggested_search_queries.json";

pub fn worker_config() -> WorkerConfig {
    WorkerConfig {
        role: "search_queries_recommendation_agent".to_string(),
        goal: [
            "To provide a list of suggested search queries to be passed to the search engine.",
            "Generating multiple variations of search queries, including keyword-based looking for specific items",
        ]
        .join("\n"),
        backstory: "The agent is designed to help in looking for products by providing a list of suggested search queries to be passed to the search engine based on the context provided.".to_string(),
    }
}

pub fn task_config(output_dir: &Path) -> TaskConfig {
    TaskConfig {
        name: TASK_NAME.to_string(),
        description: [
            "Ohay is looking to buy {product_name} at the best prices (value for a price strategy)",
            "The company target any of these websites to buy from: {websites_list}",
            "The stores must sell the product in {country_name}",
            "Generate at maximum {no_keywords} queries.",
            "Search keywords must contains specific brands, types or technologies. Avoid general keywords.",
            "The search query must reach an ecommerce webpage for product, and not a blog or listing page.",
        ]
        .join("\n"),
        expected_output: "A JSON object containing a list of suggested search queries.".to_string(),
        contract: Arc::new(JsonContract::<SuggestedSearchQueries>::new(
            "SuggestedSearchQueries",
        )),
        output_file: Some(output_dir.join(OUTPUT_FILE)),
    }
}

/// First stage: no tools, no upstream context.
pub fn stage(llm: LlmHandle, output_dir: &Path) -> Stage {
    Stage::new(Worker::new(worker_config(), llm), task_config(output_dir))
}
