//! AI plan generation backends.
//!
//! A [`PlanProvider`] turns a goal into a structured plan description.
//! Failures are reported as [`AIError`] so the generator can classify them
//! as retryable or fatal.
//!
//! ## Providers
//!
//! - **Claude** - Anthropic messages API (`ANTHROPIC_API_KEY`)
//! - **Ollama** - local LLM (`OLLAMA_HOST`, `OLLAMA_MODEL`)
//! - **Offline** - never answers, so the generator uses its starter plan

#[cfg(feature = "ai")]
mod claude;
mod offline;
#[cfg(feature = "ai")]
mod ollama;
mod response;

#[cfg(feature = "ai")]
pub use claude::ClaudeProvider;
pub use offline::OfflineProvider;
#[cfg(feature = "ai")]
pub use ollama::OllamaProvider;
pub use response::{build_plan_prompt, parse_plan_response};

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::core::{AiConfig, ErrorKind};
use crate::plan::{TaskItemDraft, TaskPlan, TimeScope};

/// Errors reported by AI backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AIError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limited{}", retry_hint(.0))]
    RateLimited(Option<u64>),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Provider not available: {0}")]
    ProviderNotAvailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    retry_after.map(|secs| format!(", retry after {secs}s")).unwrap_or_default()
}

impl AIError {
    /// Position in the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::AiService
    }
}

#[cfg(feature = "ai")]
impl From<reqwest::Error> for AIError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            status_to_error(status.as_u16(), &e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

/// Map a non-success HTTP status onto an [`AIError`].
pub fn status_to_error(status: u16, body: &str) -> AIError {
    let message = body.trim().to_string();
    match status {
        401 | 403 => AIError::Unauthorized(message),
        408 => AIError::Timeout,
        429 => AIError::RateLimited(None),
        500..=599 => AIError::Server { status, message },
        _ => AIError::InvalidRequest(format!("HTTP {status}: {message}")),
    }
}

/// What to plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanRequest {
    pub goal_title: String,
    pub goal_description: String,
    /// Free-form horizon, e.g. "3 months"
    pub timeframe: Option<String>,
}

impl PlanRequest {
    pub fn new(
        goal_title: impl Into<String>,
        goal_description: impl Into<String>,
        timeframe: Option<&str>,
    ) -> Self {
        Self {
            goal_title: goal_title.into(),
            goal_description: goal_description.into(),
            timeframe: timeframe.map(str::trim).filter(|t| !t.is_empty()).map(String::from),
        }
    }
}

/// Structured plan description returned by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    #[serde(default, alias = "total_duration", alias = "duration")]
    pub total_duration: Option<String>,

    #[serde(default)]
    pub tasks: Vec<GeneratedTask>,
}

/// One task as described by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedTask {
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default = "default_scope", alias = "time_scope")]
    pub time_scope: String,

    #[serde(default, alias = "estimated_duration", alias = "durationMinutes")]
    pub estimated_duration: u32,

    #[serde(default, alias = "execution_tips", alias = "tips")]
    pub execution_tips: Option<String>,
}

fn default_scope() -> String {
    TimeScope::Daily.as_str().to_string()
}

impl GeneratedPlan {
    /// Convert into an AI-generated [`TaskPlan`] for `branch_id`.
    ///
    /// `default_duration` is used when the backend left the overall duration
    /// out. A plan without tasks, or with a blank title or an unknown time
    /// scope, is rejected as malformed.
    pub fn into_task_plan(self, branch_id: Uuid, default_duration: &str) -> Result<TaskPlan, AIError> {
        if self.tasks.is_empty() {
            return Err(AIError::MalformedResponse("plan contains no tasks".to_string()));
        }

        let drafts = self
            .tasks
            .into_iter()
            .map(GeneratedTask::into_draft)
            .collect::<Result<Vec<_>, _>>()?;

        let total_duration = self
            .total_duration
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| default_duration.to_string());

        Ok(TaskPlan::new(branch_id, total_duration, true, drafts))
    }
}

impl GeneratedTask {
    fn into_draft(self) -> Result<TaskItemDraft, AIError> {
        if self.title.trim().is_empty() {
            return Err(AIError::MalformedResponse("task without a title".to_string()));
        }

        let scope: TimeScope = self
            .time_scope
            .parse()
            .map_err(|_| AIError::MalformedResponse(format!("unknown time scope '{}'", self.time_scope)))?;

        let mut draft =
            TaskItemDraft::new(self.title.trim(), self.description.trim(), scope, self.estimated_duration);
        if let Some(tips) = self.execution_tips.filter(|t| !t.trim().is_empty()) {
            draft = draft.with_tips(tips);
        }
        Ok(draft)
    }
}

/// A backend that can decompose a goal into tasks.
#[async_trait]
pub trait PlanProvider: Send + Sync {
    /// Ask the backend for a plan.
    async fn generate_plan(&self, request: &PlanRequest) -> Result<GeneratedPlan, AIError>;

    /// Get the provider name.
    fn name(&self) -> &str;
}

/// Pick a provider from configuration.
///
/// Anything that cannot be set up (disabled AI, missing API key, unknown
/// provider, binary built without the `ai` feature) yields an
/// [`OfflineProvider`], which makes every generation use the starter plan.
pub fn provider_from_config(config: &AiConfig) -> Arc<dyn PlanProvider> {
    if !config.enabled {
        return Arc::new(OfflineProvider::new("AI is disabled in configuration"));
    }

    match config.provider.as_str() {
        #[cfg(feature = "ai")]
        "claude" => match ClaudeProvider::new() {
            Ok(provider) => match &config.model {
                Some(model) => Arc::new(provider.with_model(model)),
                None => Arc::new(provider),
            },
            Err(e) => {
                tracing::warn!(error = %e, "Claude provider unavailable");
                Arc::new(OfflineProvider::new(e.to_string()))
            }
        },
        #[cfg(feature = "ai")]
        "ollama" => Arc::new(OllamaProvider::from_config(&config.ollama)),
        other => {
            tracing::warn!(provider = other, "Unknown or disabled AI provider");
            Arc::new(OfflineProvider::new(format!("provider '{other}' is not available")))
        }
    }
}
