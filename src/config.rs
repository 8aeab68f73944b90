//! Configuration (Figment-based)
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. `procurement.toml` in the working directory, or an explicit file
//! 3. Environment variables with the `PROCURE_` prefix, `__` separating
//!    sections (`PROCURE_LLM__STRONG_MODEL` -> `llm.strong_model`)
//!
//! API keys are never stored in the config itself; each section names the
//! environment variable that holds its key.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{JsonlTelemetry, KnowledgeSource, MemoryTelemetry, Observer, Telemetry};
use crate::error::ConfigError;
use crate::inputs::RunInputs;
use crate::llm::{Client, CompletionBackend, LlmHandle};
use crate::tools::{ScrapeGraphClient, ScrapeProvider, SearchProvider, TavilyClient};

pub const DEFAULT_CONFIG_FILE: &str = "procurement.toml";
pub const ENV_PREFIX: &str = "PROCURE_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Groq,
    Ollama,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    pub api_key_env: String,
    /// Used by the query recommender.
    pub fast_model: String,
    /// Used by every other stage.
    pub strong_model: String,
    pub temperature: f32,
    pub max_iterations: usize,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            base_url: None,
            api_key_env: "GROQ_API_KEY".to_string(),
            fast_model: "llama-3.1-8b-instant".to_string(),
            strong_model: "llama-3.3-70b-versatile".to_string(),
            temperature: 0.1,
            max_iterations: 15,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub api_key_env: String,
    pub base_url: String,
    pub max_results: u32,
    pub search_depth: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: "TAVILY_API_KEY".to_string(),
            base_url: crate::tools::search::DEFAULT_TAVILY_URL.to_string(),
            max_results: 5,
            search_depth: "basic".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub api_key_env: String,
    pub base_url: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            api_key_env: "SGAI_API_KEY".to_string(),
            base_url: crate::tools::scrape::DEFAULT_SCRAPEGRAPH_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    /// JSONL trace file; traces stay in memory when unset.
    pub trace_file: Option<PathBuf>,
    pub tags: Vec<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trace_file: None,
            tags: vec!["crew".to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output_dir: PathBuf,
    pub knowledge: String,
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub scrape: ScrapeConfig,
    pub run: RunInputs,
    pub telemetry: TelemetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            knowledge: "ohay is a company that provides AI solutions to help websites refine their search and recommendation systems.".to_string(),
            llm: LlmConfig::default(),
            search: SearchConfig::default(),
            scrape: ScrapeConfig::default(),
            run: RunInputs::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl Config {
    /// Load with the full resolution chain. `path` replaces the default
    /// `procurement.toml` lookup and must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::Invalid(format!(
                        "config file {} does not exist",
                        path.display()
                    )));
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    log::debug!("Loading config from {}", default_path.display());
                    figment = figment.merge(Toml::file(default_path));
                }
            }
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "llm.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(ConfigError::Invalid(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        self.run.validate()
    }

    pub fn knowledge_source(&self) -> KnowledgeSource {
        KnowledgeSource::text(&self.knowledge)
    }

    pub fn http_client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.llm.timeout_secs))
            .build()
            .unwrap_or_else(|err| {
                log::warn!("Falling back to default HTTP client: {}", err);
                reqwest::Client::new()
            })
    }

    /// The configured LLM provider as an erased backend.
    pub fn llm_backend(&self) -> Result<Arc<dyn CompletionBackend>, ConfigError> {
        let client = Client::with_timeout(Duration::from_secs(self.llm.timeout_secs));
        let backend: Arc<dyn CompletionBackend> = match self.llm.provider {
            LlmProvider::Groq => {
                let key = require_secret(&self.llm.api_key_env)?;
                match &self.llm.base_url {
                    Some(url) => Arc::new(client.with_groq_at(key, url)),
                    None => Arc::new(client.with_groq(key)),
                }
            }
            LlmProvider::Ollama => match &self.llm.base_url {
                Some(url) => Arc::new(client.with_ollama_at(url)),
                None => Arc::new(client.with_ollama()),
            },
        };
        Ok(backend)
    }

    /// Fast and strong model handles sharing one backend.
    pub fn llm_handles(&self, backend: Arc<dyn CompletionBackend>) -> (LlmHandle, LlmHandle) {
        let fast = LlmHandle::new(Arc::clone(&backend), &self.llm.fast_model)
            .temperature(self.llm.temperature);
        let strong =
            LlmHandle::new(backend, &self.llm.strong_model).temperature(self.llm.temperature);
        (fast, strong)
    }

    /// `None` when the key is missing; the search tool then answers offline.
    pub fn search_provider(&self, http: &reqwest::Client) -> Option<Arc<dyn SearchProvider>> {
        let Some(key) = optional_secret(&self.search.api_key_env) else {
            log::warn!(
                "{} is not set; web_search will return placeholder results",
                self.search.api_key_env
            );
            return None;
        };
        let client = TavilyClient::new(http.clone(), key)
            .base_url(&self.search.base_url)
            .search_depth(&self.search.search_depth)
            .max_results(self.search.max_results);
        Some(Arc::new(client))
    }

    pub fn scrape_provider(&self, http: &reqwest::Client) -> Option<Arc<dyn ScrapeProvider>> {
        let Some(key) = optional_secret(&self.scrape.api_key_env) else {
            log::warn!(
                "{} is not set; web_scraping will report an unconfigured client",
                self.scrape.api_key_env
            );
            return None;
        };
        Some(Arc::new(
            ScrapeGraphClient::new(http.clone(), key).base_url(&self.scrape.base_url),
        ))
    }

    /// `None` when telemetry is disabled.
    pub fn observer(&self) -> Option<Observer> {
        if !self.telemetry.enabled {
            return None;
        }
        let sink: Arc<dyn Telemetry> = match &self.telemetry.trace_file {
            Some(path) => Arc::new(JsonlTelemetry::new(path)),
            None => Arc::new(MemoryTelemetry::new()),
        };
        Some(Observer::new(sink).with_default_tags(self.telemetry.tags.clone()))
    }
}

fn optional_secret(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn require_secret(var: &str) -> Result<String, ConfigError> {
    optional_secret(var).ok_or_else(|| ConfigError::MissingSecret(var.to_string()))
}
