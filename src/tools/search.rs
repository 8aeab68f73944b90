//! `web_search`: Tavily-style search API.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::tools::{args_schema_for, check_status, parse_args, Tool, ToolError};

pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";

/// A search engine reachable over the network.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &str) -> Result<Value, ToolError>;
}

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: u32,
}

#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    search_depth: String,
    max_results: u32,
}

impl TavilyClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_TAVILY_URL.to_string(),
            search_depth: "basic".to_string(),
            max_results: 5,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str) -> Result<Value, ToolError> {
        let request = TavilyRequest {
            query,
            search_depth: &self.search_depth,
            max_results: self.max_results,
        };
        let response = self
            .http
            .post(format!("{}/search", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchArgs {
    /// The search query to run
    pub query: String,
}

/// Tool wrapper around an optional [`SearchProvider`].
///
/// Without a provider it answers with a plain-text placeholder so a run can
/// proceed offline.
#[derive(Clone, Default)]
pub struct SearchTool {
    provider: Option<Arc<dyn SearchProvider>>,
}

impl SearchTool {
    pub fn new(provider: Option<Arc<dyn SearchProvider>>) -> Self {
        Self { provider }
    }

    async fn run(&self, input: Value) -> Value {
        let args: SearchArgs = match parse_args(input, "query") {
            Ok(args) => args,
            Err(err) => return err.into_payload(),
        };

        let Some(provider) = &self.provider else {
            return Value::String(format!("Search results for: {}", args.query));
        };

        log::debug!("web_search: {}", args.query);
        match provider.search(&args.query).await {
            Ok(results) => results,
            Err(err) => {
                log::warn!("web_search failed for '{}': {}", args.query, err);
                err.into_payload()
            }
        }
    }
}

impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Useful for search-based queries. Use this to find current information about any query related pages using a search engine"
    }

    fn args_schema(&self) -> Value {
        args_schema_for::<SearchArgs>()
    }

    fn invoke(&self, input: Value) -> BoxFuture<'_, Value> {
        Box::pin(self.run(input))
    }
}
