//! AI failure classification.
//!
//! The classifier decides whether an AI backend failure is worth retrying,
//! produces a user-facing message, and owns the attempt counter for one
//! generation call chain.

use std::time::Duration;

use crate::ai::AIError;

use super::RetryConfig;

/// Outcome of classifying a single failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorAssessment {
    /// Whether another attempt may succeed
    pub retryable: bool,
    /// Message suitable for showing to the user
    pub message: String,
}

/// Classifies AI errors and tracks attempts for one generation request.
///
/// Create one per request; the counter must never be shared between
/// unrelated generations.
#[derive(Debug, Clone)]
pub struct ErrorClassifier {
    config: RetryConfig,
    attempts: u32,
}

impl Default for ErrorClassifier {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

impl ErrorClassifier {
    /// Create a classifier with the given retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config, attempts: 0 }
    }

    /// Record a failed attempt and classify `error`.
    pub fn handle(&mut self, error: &AIError) -> ErrorAssessment {
        self.attempts = self.attempts.saturating_add(1);

        let retryable = Self::is_retryable(error);
        let message = Self::user_message(error);

        tracing::debug!(
            attempts = self.attempts,
            max_attempts = self.config.max_attempts,
            retryable,
            error = %error,
            "Classified AI failure"
        );

        ErrorAssessment { retryable, message }
    }

    /// Whether the retry budget allows another attempt.
    pub fn should_retry(&self) -> bool {
        self.attempts < self.config.max_attempts
    }

    /// Backoff to wait before the next attempt.
    pub fn retry_delay(&self) -> Duration {
        self.config.delay_for_attempt(self.attempts)
    }

    /// Forget all recorded attempts.
    pub fn reset_retry_count(&mut self) {
        self.attempts = 0;
    }

    /// Failed attempts recorded since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The retry policy in use.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Transient failures are retryable; request/credential problems are not.
    pub fn is_retryable(error: &AIError) -> bool {
        match error {
            AIError::Network(_)
            | AIError::Timeout
            | AIError::RateLimited(_)
            | AIError::Server { .. }
            | AIError::MalformedResponse(_) => true,
            AIError::ProviderNotAvailable(_)
            | AIError::Unauthorized(_)
            | AIError::InvalidRequest(_)
            | AIError::UnsupportedInput(_) => false,
        }
    }

    fn user_message(error: &AIError) -> String {
        match error {
            AIError::Network(_) => "Could not reach the AI service.".to_string(),
            AIError::Timeout => "The AI service took too long to respond.".to_string(),
            AIError::RateLimited(Some(secs)) => {
                format!("The AI service is busy, try again in {secs}s.")
            }
            AIError::RateLimited(None) => "The AI service is busy right now.".to_string(),
            AIError::Server { status, .. } => {
                format!("The AI service had an internal problem ({status}).")
            }
            AIError::MalformedResponse(_) => {
                "The AI service returned a plan that could not be read.".to_string()
            }
            AIError::ProviderNotAvailable(name) => {
                format!("No AI provider is available ({name}); a starter plan will be used.")
            }
            AIError::Unauthorized(_) => "The AI service rejected the credentials.".to_string(),
            AIError::InvalidRequest(_) => "The AI service rejected the request.".to_string(),
            AIError::UnsupportedInput(reason) => format!("This goal cannot be planned by AI: {reason}"),
        }
    }
}
