//! Claude API integration.
//!
//! Implements the PlanProvider trait for Claude.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{build_plan_prompt, parse_plan_response, status_to_error};
use super::{AIError, GeneratedPlan, PlanProvider, PlanRequest};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Claude API provider.
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    model: String,
}

impl ClaudeProvider {
    /// Create a new Claude provider.
    ///
    /// Reads API key from ANTHROPIC_API_KEY environment variable.
    pub fn new() -> Result<Self, AIError> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AIError::ProviderNotAvailable("ANTHROPIC_API_KEY not set".to_string()))?;

        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;

        Ok(Self { client, api_key, model: DEFAULT_MODEL.to_string() })
    }

    /// Create with a specific model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Make a request to the Claude API.
    async fn request(&self, user_message: &str) -> Result<String, AIError> {
        let request = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: 2048,
            messages: vec![Message { role: "user".to_string(), content: user_message.to_string() }],
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response.text().await.unwrap_or_default();

            return Err(match status_to_error(status.as_u16(), &body) {
                AIError::RateLimited(_) => AIError::RateLimited(retry_after),
                other => other,
            });
        }

        let response: ClaudeResponse = response.json().await?;

        response
            .content
            .into_iter()
            .find_map(|c| c.text)
            .ok_or_else(|| AIError::MalformedResponse("No text in Claude response".to_string()))
    }
}

#[async_trait]
impl PlanProvider for ClaudeProvider {
    async fn generate_plan(&self, request: &PlanRequest) -> Result<GeneratedPlan, AIError> {
        let text = self.request(&build_plan_prompt(request)).await?;
        parse_plan_response(&text)
    }

    fn name(&self) -> &str {
        "claude"
    }
}

/// Claude API request structure.
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

/// Message in a Claude request.
#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

/// Claude API response structure.
#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

/// Content block in a Claude response. Non-text blocks carry no `text`.
#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}
