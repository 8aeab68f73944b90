use std::path::Path;
use std::sync::Arc;

use crate::core::{JsonContract, Stage, TaskConfig, Worker, WorkerConfig};
use crate::llm::LlmHandle;
use crate::schema::AllExtractedProducts;
use crate::tools::{ScrapeProvider, ScrapeTool};

pub const TASK_NAME: &str = "extract_products";
pub const OUTPUT_FILE: &str = "step_3_search_results.json";

pub fn worker_config() -> WorkerConfig {
    WorkerConfig {
        role: "Web scraping agent".to_string(),
        goal: "To extract detailed product information from e-commerce website URLs".to_string(),
        backstory: [
            "You are an expert web scraping agent specialized in extracting product information from e-commerce websites.",
            "Your role is to analyze product pages and extract key details like title, price, specifications, and images.",
            "You can identify genuine product information and filter out irrelevant or incorrect data.",
        ]
        .join("\n"),
    }
}

pub fn task_config(output_dir: &Path) -> TaskConfig {
    TaskConfig {
        name: TASK_NAME.to_string(),
        description: [
            "Extract detailed product information from e-commerce store page URLs obtained from search results.",
            "For each product URL, extract the following information:",
            "  - Product title, image URL, and product URL",
            "  - Current price and original price (if on discount)",
            "  - Key product specifications (focus on 3-5 most important specs for comparison)",
            "  - Provide a recommendation rank (1-5) and notes explaining the ranking",
            "Prioritize products with complete information and good value for money.",
            "Ensure all extracted data is accurate and relevant for procurement decision making.",
        ]
        .join("\n"),
        expected_output: "A JSON object containing detailed information for all extracted products".to_string(),
        contract: Arc::new(JsonContract::<AllExtractedProducts>::new(
            "AllExtractedProducts",
        )),
        output_file: Some(output_dir.join(OUTPUT_FILE)),
    }
}

pub fn stage(
    llm: LlmHandle,
    output_dir: &Path,
    scrape: Option<Arc<dyn ScrapeProvider>>,
    max_iterations: usize,
) -> Stage {
    let worker = Worker::new(worker_config(), llm)
        .with_tool(Arc::new(ScrapeTool::new(scrape)))
        .with_max_iterations(max_iterations);
    Stage::new(worker, task_config(output_dir))
}
