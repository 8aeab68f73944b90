//! LLM clients used as the compute backend of every worker.
//!
//! [`Client`] wraps a `reqwest::Client` and uses a typestate pattern to track
//! which providers are configured. Workers do not see the typestate: they hold
//! an [`LlmHandle`], i.e. an erased [`CompletionBackend`] plus the model name
//! and temperature that worker runs with.

pub mod error;
pub mod groq;
pub mod message;
pub mod ollama;

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;

pub use error::LLMError;
pub use groq::{GroqConfig, GroqResponse};
pub use message::ChatMessage;
pub use ollama::OllamaConfig;

/// LLM client wrapper around reqwest::Client
#[derive(Clone)]
pub struct Client<S> {
    pub(crate) client: reqwest::Client,
    pub(crate) state: PhantomData<S>,
    pub(crate) groq_config: Option<GroqConfig>,
    pub(crate) ollama_config: Option<OllamaConfig>,
    pub(crate) model_cache: ModelCache,
}

/// Thread-safe cache for provider model lists
#[derive(Clone, Default)]
pub struct ModelCache {
    pub(crate) groq: Arc<RwLock<Option<Vec<String>>>>,
    pub(crate) ollama: Arc<RwLock<Option<Vec<String>>>>,
}

// ============================================================================
// Type States
// ============================================================================

/// Marker indicating a provider is enabled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Enabled;

/// Marker indicating a provider is disabled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Disabled;

/// Provider state container
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Providers<GroqState, OllamaState> {
    _groq: PhantomData<GroqState>,
    _ollama: PhantomData<OllamaState>,
}

// ============================================================================
// Client constructors and builders
// ============================================================================

impl Client<Providers<Disabled, Disabled>> {
    /// Create a new LLM client with no providers configured
    pub fn new() -> Self {
        Self::with_http(reqwest::Client::new())
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|err| {
                log::warn!("Falling back to default HTTP client: {}", err);
                reqwest::Client::new()
            });
        Self::with_http(http)
    }

    fn with_http(client: reqwest::Client) -> Self {
        Client {
            client,
            state: PhantomData,
            groq_config: None,
            ollama_config: None,
            model_cache: ModelCache::default(),
        }
    }
}

impl Default for Client<Providers<Disabled, Disabled>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O> Client<Providers<Disabled, O>> {
    /// Enable Groq with API key and default base URL
    pub fn with_groq(self, api_key: impl Into<String>) -> Client<Providers<Enabled, O>> {
        self.with_groq_at(api_key, GroqConfig::default().base_url)
    }

    /// Enable Groq (or any OpenAI-compatible endpoint) at a custom base URL
    pub fn with_groq_at(
        self,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Client<Providers<Enabled, O>> {
        Client {
            client: self.client,
            state: PhantomData,
            groq_config: Some(GroqConfig {
                api_key: api_key.into(),
                base_url: base_url.into(),
                ..Default::default()
            }),
            ollama_config: self.ollama_config,
            model_cache: self.model_cache,
        }
    }
}

impl<G> Client<Providers<G, Disabled>> {
    /// Enable Ollama with the default host (http://localhost:11434)
    pub fn with_ollama(self) -> Client<Providers<G, Enabled>> {
        self.with_ollama_at(OllamaConfig::default().host)
    }

    pub fn with_ollama_at(self, host: impl Into<String>) -> Client<Providers<G, Enabled>> {
        Client {
            client: self.client,
            state: PhantomData,
            groq_config: self.groq_config,
            ollama_config: Some(OllamaConfig {
                host: host.into(),
                ..Default::default()
            }),
            model_cache: self.model_cache,
        }
    }
}

// ============================================================================
// Erased completion interface
// ============================================================================

/// One chat completion, independent of the provider that serves it.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    pub temperature: Option<f32>,
    pub json_mode: bool,
}

/// Anything that can turn a conversation into the assistant's next message.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LLMError>;

    /// Provider name, used in traces.
    fn provider(&self) -> &str;
}

impl<S: Clone + Send + Sync + 'static> Client<S> {
    /// Call the first configured provider; Groq wins over Ollama.
    pub(crate) async fn dispatch_complete(
        &self,
        request: CompletionRequest,
    ) -> Result<String, LLMError> {
        if self.groq_config.is_some() {
            let mut builder = groq::GroqCompletionBuilder::new(self)
                .messages(request.messages)
                .temperature_opt(request.temperature)
                .json_mode(request.json_mode);
            if let Some(m) = request.model {
                builder = builder.model(m);
            }
            return builder.execute().await;
        }

        if self.ollama_config.is_some() {
            let mut builder = ollama::OllamaCompletionBuilder::new(self)
                .messages(request.messages)
                .temperature_opt(request.temperature)
                .json_mode(request.json_mode);
            if let Some(m) = request.model {
                builder = builder.model(m);
            }
            return builder.execute().await;
        }

        Err(LLMError::ProviderNotConfigured(
            "No LLM provider available".to_string(),
        ))
    }
}

#[async_trait]
impl<S: Clone + Send + Sync + 'static> CompletionBackend for Client<S> {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LLMError> {
        self.dispatch_complete(request).await
    }

    fn provider(&self) -> &str {
        if self.groq_config.is_some() {
            "groq"
        } else if self.ollama_config.is_some() {
            "ollama"
        } else {
            "none"
        }
    }
}

/// The compute backend a worker is bound to: provider, model and temperature.
#[derive(Clone)]
pub struct LlmHandle {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    temperature: Option<f32>,
}

impl LlmHandle {
    pub fn new(backend: Arc<dyn CompletionBackend>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &str {
        self.backend.provider()
    }

    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        json_mode: bool,
    ) -> Result<String, LLMError> {
        self.backend
            .complete(CompletionRequest {
                model: Some(self.model.clone()),
                messages,
                temperature: self.temperature,
                json_mode,
            })
            .await
    }
}

impl fmt::Debug for LlmHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmHandle")
            .field("provider", &self.backend.provider())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Client::new();
        assert!(client.groq_config.is_none());
        assert!(client.ollama_config.is_none());
        assert_eq!(client.provider(), "none");
    }

    #[test]
    fn test_with_groq() {
        let client = Client::new().with_groq("test-key");
        let config = client.groq_config.clone().unwrap();
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "https://api.groq.com/openai");
        assert_eq!(config.default_model, "llama-3.3-70b-versatile");
        assert_eq!(client.provider(), "groq");
    }

    #[test]
    fn test_with_ollama() {
        let client = Client::new().with_ollama_at("http://192.168.1.10:11434");
        assert_eq!(
            client.ollama_config.clone().unwrap().host,
            "http://192.168.1.10:11434"
        );
        assert_eq!(client.provider(), "ollama");
    }

    #[test]
    fn test_groq_preferred_when_both_enabled() {
        let client = Client::new().with_ollama().with_groq("key");
        assert!(client.ollama_config.is_some());
        assert_eq!(client.provider(), "groq");
    }

    #[tokio::test]
    async fn test_dispatch_without_provider() {
        let client = Client::new();
        let err = client
            .complete(CompletionRequest {
                model: None,
                messages: vec![ChatMessage::user("hi")],
                temperature: None,
                json_mode: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::ProviderNotConfigured(_)));
    }

    #[tokio::test]
    async fn test_dispatch_reaches_configured_provider() {
        // Nothing listens on the discard port; the request must still go through the Groq path.
        let client = Client::new().with_groq_at("key", "http://127.0.0.1:9");
        let err = client
            .complete(CompletionRequest {
                model: Some("llama-3.1-8b-instant".to_string()),
                messages: vec![ChatMessage::user("hi")],
                temperature: Some(0.1),
                json_mode: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, LLMError::HttpError(_)));
    }

    #[test]
    fn test_handle_debug_hides_backend() {
        let handle = LlmHandle::new(Arc::new(Client::new().with_groq("k")), "llama-3.1-8b-instant")
            .temperature(0.1);
        let rendered = format!("{:?}", handle);
        assert!(rendered.contains("groq"));
        assert!(rendered.contains("llama-3.1-8b-instant"));
        assert!(!rendered.contains("\"k\""));
    }
}
