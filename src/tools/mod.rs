//! # Tools
//!
//! External capabilities a worker can call from its agent loop. A tool never
//! fails the run: remote and argument errors come back as a JSON payload with
//! an `error` field, and the worker decides what to do with it.

pub mod scrape;
pub mod search;

use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

pub use scrape::{ScrapeGraphClient, ScrapeProvider, ScrapeTool};
pub use search::{SearchProvider, SearchTool, TavilyClient};

pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the `action_input` object this tool accepts.
    fn args_schema(&self) -> Value;

    fn invoke(&self, input: Value) -> BoxFuture<'_, Value>;
}

/// Failures inside a tool adapter. Never escapes a [`Tool`]; see [`ToolError::into_payload`].
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid arguments: {0}")]
    BadArguments(String),

    #[error("{0} client not configured")]
    NotConfigured(&'static str),
}

impl ToolError {
    pub fn into_payload(self) -> Value {
        error_payload(self.to_string())
    }
}

pub fn error_payload(message: impl Into<String>) -> Value {
    json!({ "error": message.into() })
}

pub(crate) fn args_schema_for<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(Value::Null)
}

/// Decode tool arguments. A bare string is accepted as the value of `primary`.
pub(crate) fn parse_args<T: DeserializeOwned>(input: Value, primary: &str) -> Result<T, ToolError> {
    let input = match input {
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(obj @ Value::Object(_)) => obj,
            _ => json!({ primary: s }),
        },
        other => other,
    };
    serde_json::from_value(input).map_err(|e| ToolError::BadArguments(e.to_string()))
}

pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ToolError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ToolError::Status {
        status: status.as_u16(),
        body,
    })
}
