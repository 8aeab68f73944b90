//! # procurement-crew
//!
//! A five-stage agent crew that turns a product request into a procurement
//! comparison report.
//!
//! ## Stages
//!
//! - **Query recommender**: suggests search queries for the product
//! - **Search engine**: runs them through a web search API and keeps results above the thresholds
//! - **Web scraper**: extracts structured product data from each result page
//! - **Report author**: writes a Bootstrap-styled HTML report
//! - **Report critic**: critiques the report; the author then revises it
//!
//! Every stage pairs a [`Worker`] (persona + LLM backend + tools) with a
//! [`UnitOfWork`] (instructions + output contract + output file). Stages are
//! wired by handle, and the [`Crew`] executes them strictly in order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use procurement_crew::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(Client::new().with_groq(std::env::var("GROQ_API_KEY")?));
//! let fast = LlmHandle::new(backend.clone(), "llama-3.1-8b-instant").temperature(0.1);
//! let strong = LlmHandle::new(backend, "llama-3.3-70b-versatile").temperature(0.1);
//!
//! let pipeline = ProcurementPipeline::assemble(PipelineDeps::new(fast, strong, "./output"))?;
//! let output = pipeline
//!     .run(vec![KnowledgeSource::text("ohay provides AI solutions.")], &RunInputs::default())
//!     .await?;
//! println!("{}", output.raw);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`core`]: workers, units of work, stages, wiring, contracts, telemetry
//! - [`agents`]: the five procurement stages
//! - [`crew`]: the sequential runtime and agent loop
//! - [`llm`]: Groq and Ollama clients
//! - [`tools`]: `web_search` and `web_scraping`
//! - [`schema`]: typed stage outputs
//! - [`pipeline`]: assembly and execution of the whole pipeline

// ============================================================================
// Modules
// ============================================================================

pub mod agents;
pub mod config;
pub mod core;
pub mod crew;
pub mod error;
pub mod inputs;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod schema;
pub mod tools;

// ============================================================================
// Public Re-exports
// ============================================================================

pub use crate::core::{
    Conform, EndState, HtmlContract, JsonContract, JsonlTelemetry, KnowledgeSource,
    MemoryTelemetry, Observer, OutputContract, PipelineStage, Stage, TaskConfig, TaskHandle,
    Telemetry, TextContract, TraceEntry, UnitOfWork, WiringPlan, Worker, WorkerConfig,
};
pub use agents::ReportCriticStage;
pub use config::Config;
pub use crew::{Crew, CrewBuilder, CrewOutput, Process, TaskOutput};
pub use error::{ConfigError, CrewError, SchemaError, TemplateError, WiringError};
pub use inputs::RunInputs;
pub use llm::{ChatMessage, Client, CompletionBackend, CompletionRequest, LLMError, LlmHandle};
pub use pipeline::{PipelineDeps, ProcurementPipeline};
pub use tools::{ScrapeProvider, SearchProvider, Tool};

// ============================================================================
// Prelude
// ============================================================================

/// Everything needed to assemble and run a pipeline.
///
/// # Example
/// ```rust
/// use procurement_crew::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        // Runtime
        Crew,
        CrewBuilder,
        CrewOutput,
        Process,
        // LLM
        Client,
        CompletionBackend,
        LlmHandle,
        // Pipeline
        KnowledgeSource,
        PipelineDeps,
        ProcurementPipeline,
        RunInputs,
        // Building blocks
        PipelineStage,
        Stage,
        TaskConfig,
        TaskHandle,
        UnitOfWork,
        Worker,
        WorkerConfig,
        // Observability
        EndState,
        Observer,
        // Tools
        ScrapeProvider,
        SearchProvider,
        Tool,
    };
}

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
