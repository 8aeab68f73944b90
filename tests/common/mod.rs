#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use procurement_crew::tools::ToolError;
use procurement_crew::{
    CompletionBackend, CompletionRequest, LLMError, LlmHandle, ScrapeProvider, SearchProvider,
};
use serde_json::{json, Value};

pub type Script = dyn Fn(&CompletionRequest) -> Result<String, LLMError> + Send + Sync;

/// LLM stand-in that answers from a closure and records every request.
pub struct ScriptedBackend {
    script: Box<Script>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(
        script: impl Fn(&CompletionRequest) -> Result<String, LLMError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Box::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose system prompt belongs to `role`.
    pub fn requests_for(&self, role: &str) -> Vec<CompletionRequest> {
        self.requests()
            .into_iter()
            .filter(|r| system_prompt(r).starts_with(&format!("You are {role}.")))
            .collect()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LLMError> {
        let reply = (self.script)(&request);
        self.requests.lock().unwrap().push(request);
        reply
    }

    fn provider(&self) -> &str {
        "scripted"
    }
}

pub fn handles(backend: Arc<ScriptedBackend>) -> (LlmHandle, LlmHandle) {
    let fast = LlmHandle::new(backend.clone(), "llama-3.1-8b-instant").temperature(0.1);
    let strong = LlmHandle::new(backend, "llama-3.3-70b-versatile").temperature(0.1);
    (fast, strong)
}

pub fn system_prompt(request: &CompletionRequest) -> &str {
    request
        .messages
        .first()
        .filter(|m| m.role == "system")
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

pub fn first_user_prompt(request: &CompletionRequest) -> &str {
    request
        .messages
        .iter()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

pub fn last_message(request: &CompletionRequest) -> &str {
    request
        .messages
        .last()
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

pub fn is_role(request: &CompletionRequest, role: &str) -> bool {
    system_prompt(request).starts_with(&format!("You are {role}."))
}

pub fn html_report(title: &str) -> String {
    let sections = [
        "Executive Summary",
        "Introduction",
        "Methodology",
        "Findings",
        "Analysis",
        "Recommendations",
        "Conclusion",
        "Appendices",
    ];
    let body: String = sections
        .iter()
        .map(|s| format!("<section><h2>{s}</h2><p>{title}</p></section>"))
        .collect();
    format!(
        "<!DOCTYPE html><html><head><title>{title}</title>\
         <link rel=\"stylesheet\" href=\"https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css\">\
         </head><body class=\"container\">{body}</body></html>"
    )
}

pub fn product(url: &str, price: f64, rank: u8) -> Value {
    json!({
        "page_url": url,
        "product_title": "De'Longhi Magnifica S ECAM22.110.B",
        "product_image_url": "https://m.media-amazon.com/images/I/1.jpg",
        "product_url": url,
        "product_current_price": price,
        "product_original_price": null,
        "product_discount_percentage": null,
        "product_specs": [
            {"specification_name": "Power", "specification_value": "1450 W"},
            {"specification_name": "Water tank", "specification_value": "1.8 L"},
            {"specification_name": "Pressure", "specification_value": "15 bar"}
        ],
        "agent_recommendation_rank": rank,
        "agent_recommendation_notes": ["Built-in grinder suits a shared office"]
    })
}

/// Search provider that returns a fixed result set and records queries.
#[derive(Default)]
pub struct StaticSearch {
    pub queries: Mutex<Vec<String>>,
}

#[async_trait]
impl SearchProvider for StaticSearch {
    async fn search(&self, query: &str) -> Result<Value, ToolError> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(json!({
            "query": query,
            "results": [
                {"title": "De'Longhi Magnifica", "url": "https://www.amazon.eg/dp/B001", "content": "Bean to cup", "score": 0.92},
                {"title": "Coffee blog", "url": "https://blog.example.com/best", "content": "Top 10", "score": 0.05}
            ]
        }))
    }
}

/// Scrape provider that echoes the page URL and records the prompts it received.
#[derive(Default)]
pub struct StaticScrape {
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ScrapeProvider for StaticScrape {
    async fn smartscraper(&self, website_url: &str, user_prompt: &str) -> Result<Value, ToolError> {
        self.calls
            .lock()
            .unwrap()
            .push((website_url.to_string(), user_prompt.to_string()));
        Ok(json!({
            "status": "completed",
            "website_url": website_url,
            "result": product(website_url, 8999.0, 4)
        }))
    }
}
