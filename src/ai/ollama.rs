//! Ollama local LLM integration.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_plan_prompt, parse_plan_response, status_to_error};
use super::{AIError, GeneratedPlan, PlanProvider, PlanRequest};
use crate::core::OllamaConfig;

/// Ollama API provider for local LLM.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    model: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider with default settings.
    ///
    /// Uses localhost:11434 by default; `OLLAMA_HOST` and `OLLAMA_MODEL` override.
    pub fn new() -> Self {
        Self::from_config(&OllamaConfig::default())
    }

    /// Create from configuration. Environment variables still win.
    pub fn from_config(config: &OllamaConfig) -> Self {
        // Local models can be slow on the first request while loading
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: std::env::var("OLLAMA_HOST").unwrap_or_else(|_| config.base_url.clone()),
            model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| config.model.clone()),
        }
    }

    /// Create with a specific base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Create with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Make a request to the Ollama API.
    async fn request(&self, prompt: &str) -> Result<String, AIError> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            format: "json",
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url.trim_end_matches('/')))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    AIError::ProviderNotAvailable(format!("Ollama not reachable at {}", self.base_url))
                } else {
                    AIError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_to_error(status.as_u16(), &body));
        }

        let response: OllamaResponse = response.json().await?;
        Ok(response.response)
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlanProvider for OllamaProvider {
    async fn generate_plan(&self, request: &PlanRequest) -> Result<GeneratedPlan, AIError> {
        let text = self.request(&build_plan_prompt(request)).await?;
        parse_plan_response(&text)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

/// Ollama API request structure.
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: &'static str,
}

/// Ollama API response structure.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}
