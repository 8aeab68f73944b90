use std::path::PathBuf;

use thiserror::Error;

use crate::core::TaskHandle;
use crate::llm::LLMError;

/// A unit of work's output did not match its contract.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("no JSON object found in output: {0}")]
    NoJson(String),

    #[error("output does not match `{schema}`: {source}")]
    Shape {
        schema: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("`{field}` has {actual} entries, expected {min}..={max}")]
    Cardinality {
        field: String,
        actual: usize,
        min: usize,
        max: usize,
    },

    #[error("`{field}` is out of range: {detail}")]
    OutOfRange { field: String, detail: String },

    #[error("output is not an HTML document")]
    NotHtml,

    #[error("report is missing sections: {0:?}")]
    MissingSections(Vec<&'static str>),

    #[error("output is empty")]
    Empty,
}

/// A context edge that would break the construction-order discipline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WiringError {
    #[error("`{consumer}` cannot depend on `{producer}`, which was constructed after it")]
    ForwardReference { consumer: String, producer: String },

    #[error("`{0}` cannot depend on itself")]
    SelfReference(String),

    #[error("`{consumer}` reads `{producer}`, which is not scheduled before it")]
    NotScheduledBefore { consumer: String, producer: String },

    #[error("`{task}` is executed by worker `{role}`, which is not part of the crew")]
    UnknownWorker { task: String, role: String },

    #[error("`{0}` appears more than once in the crew")]
    DuplicateTask(String),

    #[error("a crew needs at least one task")]
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template variable `{0}` has no value in the run inputs")]
    MissingVariable(String),

    #[error("unterminated template variable starting at byte {0}")]
    Unterminated(usize),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("missing environment variable: {0}")]
    MissingSecret(String),

    #[error(transparent)]
    Figment(#[from] Box<figment::Error>),
}

/// Everything that can abort a crew run.
#[derive(Debug, Error)]
pub enum CrewError {
    #[error(transparent)]
    Llm(#[from] LLMError),

    #[error("task `{task}` produced a non-conforming output: {source}")]
    Schema {
        task: String,
        #[source]
        source: SchemaError,
    },

    #[error(transparent)]
    Wiring(#[from] WiringError),

    #[error("task `{task}`: {source}")]
    Template {
        task: String,
        #[source]
        source: TemplateError,
    },

    #[error("task `{task}` exhausted {iterations} iterations without a final answer")]
    MaxIterationsExceeded { task: String, iterations: usize },

    #[error("missing output for `{0}` when resolving context")]
    MissingContext(TaskHandle),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CrewError {
    pub fn output_io(path: PathBuf, source: std::io::Error) -> Self {
        Self::Output { path, source }
    }
}
