//! `web_scraping`: ScrapeGraph-style smart scraper.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::schema::SingleExtractedProduct;
use crate::tools::{args_schema_for, check_status, error_payload, parse_args, Tool, ToolError};

pub const DEFAULT_SCRAPEGRAPH_URL: &str = "https://api.scrapegraphai.com";

/// A service that extracts structured data from a page given a natural-language prompt.
#[async_trait]
pub trait ScrapeProvider: Send + Sync {
    async fn smartscraper(&self, website_url: &str, user_prompt: &str) -> Result<Value, ToolError>;
}

#[derive(Debug, Serialize)]
struct SmartScraperRequest<'a> {
    website_url: &'a str,
    user_prompt: &'a str,
}

#[derive(Clone)]
pub struct ScrapeGraphClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ScrapeGraphClient {
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_SCRAPEGRAPH_URL.to_string(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl ScrapeProvider for ScrapeGraphClient {
    async fn smartscraper(&self, website_url: &str, user_prompt: &str) -> Result<Value, ToolError> {
        let response = self
            .http
            .post(format!(
                "{}/v1/smartscraper",
                self.base_url.trim_end_matches('/')
            ))
            .header("SGAI-APIKEY", &self.api_key)
            .json(&SmartScraperRequest {
                website_url,
                user_prompt,
            })
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Value>().await?)
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScrapeArgs {
    /// Absolute URL of the product page to scrape
    pub page_url: String,
}

/// Prompt sent to the scraper for every page: the product schema plus
/// extraction guidance.
pub fn extraction_prompt() -> String {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(SingleExtractedProduct))
        .unwrap_or_default();
    format!(
        "Extract the following product information in JSON format:\n```json\n{schema}\n```\nFrom the web page. Focus on extracting accurate product details, prices, and specifications."
    )
}

#[derive(Clone)]
pub struct ScrapeTool {
    provider: Option<Arc<dyn ScrapeProvider>>,
    prompt: String,
}

impl ScrapeTool {
    pub fn new(provider: Option<Arc<dyn ScrapeProvider>>) -> Self {
        Self {
            provider,
            prompt: extraction_prompt(),
        }
    }

    async fn run(&self, input: Value) -> Value {
        let Some(provider) = &self.provider else {
            return ToolError::NotConfigured("Scrape").into_payload();
        };

        let args: ScrapeArgs = match parse_args(input, "page_url") {
            Ok(args) => args,
            Err(err) => return err.into_payload(),
        };
        if args.page_url.trim().is_empty() {
            return error_payload("page_url is empty");
        }

        log::debug!("web_scraping: {}", args.page_url);
        match provider.smartscraper(&args.page_url, &self.prompt).await {
            Ok(details) => json!({ "product": [details] }),
            Err(err) => {
                log::warn!("web_scraping failed for {}: {}", args.page_url, err);
                err.into_payload()
            }
        }
    }
}

impl Tool for ScrapeTool {
    fn name(&self) -> &str {
        "web_scraping"
    }

    fn description(&self) -> &str {
        "An AI tool to help an agent scrape a web page. Pass the product page URL as `page_url`; \
         it returns the extracted product details."
    }

    fn args_schema(&self) -> Value {
        args_schema_for::<ScrapeArgs>()
    }

    fn invoke(&self, input: Value) -> BoxFuture<'_, Value> {
        Box::pin(self.run(input))
    }
}
