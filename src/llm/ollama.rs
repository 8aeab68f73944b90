//! Ollama LLM client for local inference

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{error::LLMError, ChatMessage, Client};

/// Configuration for Ollama client
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama server URL (default: http://localhost:11434)
    pub host: String,
    /// Default model to use (default: llama3.1:8b)
    pub default_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".to_string(),
            default_model: "llama3.1:8b".to_string(),
        }
    }
}

/// Request structure for Ollama chat completions
#[derive(Debug, Serialize)]
pub struct OllamaChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<OllamaOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Options for Ollama generation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Response from Ollama's chat endpoint
#[derive(Debug, Deserialize)]
pub struct OllamaChatResponse {
    pub model: String,
    pub created_at: DateTime<Utc>,
    pub message: ChatMessage,
    pub done: bool,
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub eval_count: u32,
}

/// Builder for Ollama chat completions
pub(crate) struct OllamaCompletionBuilder<'a, S> {
    pub(crate) client: &'a Client<S>,
    pub(crate) model: Option<String>,
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) options: OllamaOptions,
    pub(crate) json_mode: bool,
}

impl<'a, S> OllamaCompletionBuilder<'a, S> {
    pub fn new(client: &'a Client<S>) -> Self {
        Self {
            client,
            model: None,
            messages: Vec::new(),
            options: OllamaOptions::default(),
            json_mode: false,
        }
    }
}

impl<'a, S> OllamaCompletionBuilder<'a, S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub(crate) fn temperature_opt(mut self, temperature: Option<f32>) -> Self {
        self.options.temperature = temperature;
        self
    }

    pub fn json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    pub(crate) async fn execute(self) -> Result<String, LLMError> {
        let config = self.client.ollama_config.as_ref().ok_or_else(|| {
            LLMError::ProviderNotConfigured("Ollama not configured".to_string())
        })?;

        let model_to_use = self.model.unwrap_or_else(|| config.default_model.clone());

        let mut cache = self
            .client
            .model_cache
            .ollama
            .read()
            .ok()
            .and_then(|guard| guard.clone());
        if cache.is_none() {
            if let Ok(models) = self.client.ollama_list_models().await {
                let names: Vec<String> = models.into_iter().map(|m| m.name).collect();
                if let Ok(mut guard) = self.client.model_cache.ollama.write() {
                    *guard = Some(names.clone());
                }
                cache = Some(names);
            }
        }

        if let Some(valid_models) = cache {
            if !valid_models.contains(&model_to_use) {
                return Err(LLMError::InvalidModel(format!(
                    "Model '{}' not found in Ollama available models",
                    model_to_use
                )));
            }
        }

        let response = self
            .client
            .call_ollama_chat(model_to_use, self.messages, Some(self.options), self.json_mode)
            .await?;
        Ok(response.message.content)
    }
}

/// Model information from Ollama
#[derive(Debug, Deserialize)]
pub struct OllamaModel {
    pub name: String,
    #[serde(default)]
    pub size: u64,
}

#[derive(Debug, Deserialize)]
struct OllamaModelsResponse {
    pub models: Vec<OllamaModel>,
}

impl<S> Client<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// List available models from Ollama
    pub async fn ollama_list_models(&self) -> Result<Vec<OllamaModel>, LLMError> {
        let config = self.ollama_config.as_ref().ok_or_else(|| {
            LLMError::ProviderNotConfigured("Ollama not configured".to_string())
        })?;

        let response = self
            .client
            .get(format!("{}/api/tags", config.host))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LLMError::OllamaError(format!(
                "Failed to list models: HTTP {}",
                response.status()
            )));
        }

        let res: OllamaModelsResponse = response.json().await?;
        Ok(res.models)
    }

    pub async fn call_ollama_chat(
        &self,
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        options: Option<OllamaOptions>,
        json_mode: bool,
    ) -> Result<OllamaChatResponse, LLMError> {
        let config = self.ollama_config.as_ref().ok_or_else(|| {
            LLMError::ProviderNotConfigured("Ollama not configured".to_string())
        })?;

        let request = OllamaChatRequest {
            model: model.into(),
            messages,
            stream: false,
            options,
            format: json_mode.then(|| "json".to_string()),
        };

        let response = self
            .client
            .post(format!("{}/api/chat", config.host))
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::OllamaError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let chat_response: OllamaChatResponse = response.json().await?;
        Ok(chat_response)
    }

}
