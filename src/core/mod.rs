//! Building blocks of a crew: workers, units of work, stages, the wiring
//! rules between them, output contracts and telemetry.

pub mod contract;
pub mod knowledge;
pub mod stage;
pub mod telemetry;
pub mod template;
pub mod unit_of_work;
pub mod wiring;
pub mod worker;

pub use contract::{Conform, Conformed, HtmlContract, JsonContract, OutputContract, TextContract};
pub use knowledge::KnowledgeSource;
pub use stage::{PipelineStage, Stage};
pub use telemetry::{
    EndState, JsonlTelemetry, MemoryTelemetry, Observer, SessionSummary, Telemetry, TraceEntry,
    TraceStatus,
};
pub use unit_of_work::{TaskConfig, TaskHandle, UnitOfWork};
pub use wiring::{Edge, WiringPlan};
pub use worker::{Worker, WorkerConfig, DEFAULT_MAX_ITERATIONS};
