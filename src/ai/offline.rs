//! Provider used when no AI backend is configured.

use async_trait::async_trait;

use super::{AIError, GeneratedPlan, PlanProvider, PlanRequest};

/// Always fails with a fatal error, so the generator falls back immediately.
#[derive(Debug, Clone)]
pub struct OfflineProvider {
    reason: String,
}

impl OfflineProvider {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    /// Why AI is unavailable.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl Default for OfflineProvider {
    fn default() -> Self {
        Self::new("offline mode")
    }
}

#[async_trait]
impl PlanProvider for OfflineProvider {
    async fn generate_plan(&self, _request: &PlanRequest) -> Result<GeneratedPlan, AIError> {
        Err(AIError::ProviderNotAvailable(self.reason.clone()))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
