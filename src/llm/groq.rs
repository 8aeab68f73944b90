//! Groq LLM client
//!
//! Groq exposes an OpenAI-compatible chat completions API under `/openai`.

use serde::{Deserialize, Serialize};

use crate::llm::{error::LLMError, ChatMessage, Client};

/// Configuration for Groq client
#[derive(Clone, Debug)]
pub struct GroqConfig {
    /// API key for authentication
    pub api_key: String,
    /// Base URL (default: https://api.groq.com/openai)
    pub base_url: String,
    /// Default model to use (default: llama-3.3-70b-versatile)
    pub default_model: String,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.groq.com/openai".to_string(),
            default_model: "llama-3.3-70b-versatile".to_string(),
        }
    }
}

/// Request structure for Groq chat completions
#[derive(Debug, Serialize)]
pub struct GroqRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<GroqResponseFormat>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct GroqResponseFormat {
    #[serde(rename = "type")]
    pub format_type: String,
}

/// Response from Groq chat completions
#[derive(Debug, Deserialize)]
pub struct GroqResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<GroqChoice>,
    #[serde(default)]
    pub usage: Option<GroqUsage>,
}

#[derive(Debug, Deserialize)]
pub struct GroqChoice {
    pub index: u32,
    pub message: GroqResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// The assistant turn; `content` is absent when the model only emitted tool calls.
#[derive(Debug, Deserialize)]
pub struct GroqResponseMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GroqUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// One Groq chat completion, assembled from a [`crate::llm::CompletionRequest`]
pub(crate) struct GroqCompletionBuilder<'a, S> {
    pub(crate) client: &'a Client<S>,
    pub(crate) model: Option<String>,
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) temperature: Option<f32>,
    pub(crate) json_mode: bool,
}

impl<'a, S> GroqCompletionBuilder<'a, S> {
    pub fn new(client: &'a Client<S>) -> Self {
        Self {
            client,
            model: None,
            messages: Vec::new(),
            temperature: None,
            json_mode: false,
        }
    }
}

impl<'a, S> GroqCompletionBuilder<'a, S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Set the model for this completion (overrides default)
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Seed the conversation with existing messages
    pub fn messages(mut self, messages: Vec<ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub(crate) fn temperature_opt(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Ask the endpoint for a `json_object` response
    pub fn json_mode(mut self, enabled: bool) -> Self {
        self.json_mode = enabled;
        self
    }

    pub(crate) async fn execute(self) -> Result<String, LLMError> {
        let config = self.client.groq_config.as_ref().ok_or_else(|| {
            LLMError::ProviderNotConfigured("Groq not configured".to_string())
        })?;

        let model_to_use = self.model.unwrap_or_else(|| config.default_model.clone());

        // Implicit validation against the provider's model list; skipped when listing fails.
        let mut cache = self
            .client
            .model_cache
            .groq
            .read()
            .ok()
            .and_then(|guard| guard.clone());
        if cache.is_none() {
            if let Ok(models) = self.client.groq_list_models().await {
                let names: Vec<String> = models.into_iter().map(|m| m.id).collect();
                if let Ok(mut guard) = self.client.model_cache.groq.write() {
                    *guard = Some(names.clone());
                }
                cache = Some(names);
            }
        }

        if let Some(valid_models) = cache {
            if !valid_models.contains(&model_to_use) {
                return Err(LLMError::InvalidModel(format!(
                    "Model '{}' not found in Groq available models",
                    model_to_use
                )));
            }
        }

        let response = self
            .client
            .call_groq(
                model_to_use,
                self.messages,
                self.temperature,
                self.json_mode,
            )
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LLMError::InvalidResponse("No content in response".to_string()))
    }
}

/// Model information from Groq
#[derive(Debug, Deserialize)]
pub struct GroqModel {
    pub id: String,
}

#[derive(Debug, Deserialize)]
struct GroqModelsResponse {
    pub data: Vec<GroqModel>,
}

impl<S> Client<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// List available models from Groq
    pub async fn groq_list_models(&self) -> Result<Vec<GroqModel>, LLMError> {
        let config = self.groq_config.as_ref().ok_or_else(|| {
            LLMError::ProviderNotConfigured("Groq not configured".to_string())
        })?;

        let response = self
            .client
            .get(format!("{}/v1/models", config.base_url))
            .bearer_auth(&config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LLMError::GroqError(format!(
                "Failed to list models: HTTP {}",
                response.status()
            )));
        }

        let res: GroqModelsResponse = response.json().await?;
        Ok(res.data)
    }

    /// Call Groq's chat completion API
    pub async fn call_groq(
        &self,
        model: impl Into<String>,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
        json_mode: bool,
    ) -> Result<GroqResponse, LLMError> {
        let config = self.groq_config.as_ref().ok_or_else(|| {
            LLMError::ProviderNotConfigured("Groq not configured".to_string())
        })?;

        let response_format = json_mode.then(|| GroqResponseFormat {
            format_type: "json_object".to_string(),
        });

        let request = GroqRequest {
            model: model.into(),
            messages,
            temperature,
            response_format,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", config.base_url))
            .bearer_auth(&config.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(LLMError::GroqError(format!("HTTP {}: {}", status, error_text)));
        }

        let groq_response: GroqResponse = response.json().await?;
        Ok(groq_response)
    }

}
