//! Task plan generation with retry and a deterministic fallback.
//!
//! The AI backend is called in a bounded loop. Each failure goes through an
//! [`ErrorClassifier`] which decides whether to wait and try again. When the
//! failure is fatal or the retry budget is spent, a one-task starter plan is
//! stored instead, so first-time generation always yields a plan.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

use crate::ai::{PlanProvider, PlanRequest};
use crate::core::{ErrorClassifier, RetryConfig};
use crate::storage::{BranchStore, TaskPlanStore};

use super::{calculate_progress, PlanError, TaskItemDraft, TaskPlan, TimeScope};

/// `total_duration` of a plan generated without a timeframe.
pub const UNDECIDED_DURATION: &str = "To be decided";

/// Estimated minutes of the starter task.
pub const FALLBACK_TASK_MINUTES: u32 = 60;

/// Orchestrates AI plan generation for branches.
pub struct TaskPlanGenerator {
    provider: Arc<dyn PlanProvider>,
    plans: Arc<dyn TaskPlanStore>,
    branches: Arc<dyn BranchStore>,
    retry: RetryConfig,
    in_flight: Mutex<HashSet<Uuid>>,
}

impl std::fmt::Debug for TaskPlanGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPlanGenerator")
            .field("provider", &self.provider.name())
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// Marks a branch as having a generation in flight until dropped.
struct InFlight<'a> {
    branches: &'a Mutex<HashSet<Uuid>>,
    branch_id: Uuid,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.branches.lock().remove(&self.branch_id);
    }
}

impl TaskPlanGenerator {
    /// Create a generator with the default retry policy.
    pub fn new(
        provider: Arc<dyn PlanProvider>,
        plans: Arc<dyn TaskPlanStore>,
        branches: Arc<dyn BranchStore>,
    ) -> Self {
        Self { provider, plans, branches, retry: RetryConfig::default(), in_flight: Mutex::new(HashSet::new()) }
    }

    /// Replace the retry policy.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The retry policy in use.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Name of the AI provider.
    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Whether a generation for `branch_id` is running.
    pub fn is_generating(&self, branch_id: Uuid) -> bool {
        self.in_flight.lock().contains(&branch_id)
    }

    /// Generate and store the plan for a branch.
    ///
    /// AI failures never reach the caller: after retries the starter plan is
    /// stored and returned. Errors are limited to validation (unknown branch,
    /// branch already planned), a concurrent generation for the same branch,
    /// and storage failures.
    pub async fn generate(
        &self,
        goal_title: &str,
        goal_description: &str,
        branch_id: Uuid,
        timeframe: Option<&str>,
    ) -> Result<TaskPlan, PlanError> {
        let mut classifier = ErrorClassifier::new(self.retry.clone());
        self.generate_with(&mut classifier, goal_title, goal_description, branch_id, timeframe).await
    }

    /// [`TaskPlanGenerator::generate`] with a caller-supplied classifier.
    ///
    /// The classifier is reset first; after a successful AI call its
    /// counter is zero again, after a fallback it holds the failed attempts.
    pub async fn generate_with(
        &self,
        classifier: &mut ErrorClassifier,
        goal_title: &str,
        goal_description: &str,
        branch_id: Uuid,
        timeframe: Option<&str>,
    ) -> Result<TaskPlan, PlanError> {
        let _guard = self.claim(branch_id)?;
        let request = PlanRequest::new(goal_title, goal_description, timeframe);
        self.generate_locked(classifier, &request, branch_id).await
    }

    /// Delete `existing` and generate a new plan from its branch.
    ///
    /// Unlike first-time generation every failure is reported, wrapped in
    /// [`PlanError::RegenerationFailed`]. An unresolvable branch is
    /// [`PlanError::InvalidTaskPlan`].
    ///
    /// The old plan is deleted first, so after a failed regeneration the
    /// branch has no plan.
    pub async fn regenerate(&self, existing: &TaskPlan) -> Result<TaskPlan, PlanError> {
        let _guard = self.claim(existing.branch_id)?;

        let branch = self
            .branches
            .find_branch(existing.branch_id)
            .map_err(|e| PlanError::RegenerationFailed(Box::new(e.into())))?
            .ok_or_else(|| {
                PlanError::InvalidTaskPlan(format!(
                    "plan {} references unknown branch {}",
                    existing.id, existing.branch_id
                ))
            })?;

        tracing::info!(plan = %existing.id, branch = %branch.id, "Regenerating task plan");

        self.plans
            .delete_plan(existing.id)
            .map_err(|e| PlanError::RegenerationFailed(Box::new(e.into())))?;

        let request = PlanRequest::new(&branch.name, &branch.description, None);
        let mut classifier = ErrorClassifier::new(self.retry.clone());
        self.generate_locked(&mut classifier, &request, branch.id)
            .await
            .map_err(|e| PlanError::RegenerationFailed(Box::new(e)))
    }

    /// The starter plan stored when the AI backend cannot help.
    pub fn fallback_plan(request: &PlanRequest, branch_id: Uuid) -> TaskPlan {
        let description = if request.goal_description.trim().is_empty() {
            format!("Spend an hour on the first concrete step towards \"{}\".", request.goal_title)
        } else {
            format!("Spend an hour on the first concrete step. Goal: {}", request.goal_description)
        };

        let draft = TaskItemDraft::new(
            format!("Get started: {}", request.goal_title),
            description,
            TimeScope::Daily,
            FALLBACK_TASK_MINUTES,
        )
        .with_tips("Break the goal into smaller steps and add them to this plan as you go.");

        TaskPlan::new(branch_id, Self::total_duration(request), false, [draft])
    }

    fn total_duration(request: &PlanRequest) -> String {
        request.timeframe.clone().unwrap_or_else(|| UNDECIDED_DURATION.to_string())
    }

    fn claim(&self, branch_id: Uuid) -> Result<InFlight<'_>, PlanError> {
        if !self.in_flight.lock().insert(branch_id) {
            tracing::warn!(branch = %branch_id, "Rejected generation, one is already running");
            return Err(PlanError::GenerationInProgress(branch_id));
        }
        Ok(InFlight { branches: &self.in_flight, branch_id })
    }

    async fn generate_locked(
        &self,
        classifier: &mut ErrorClassifier,
        request: &PlanRequest,
        branch_id: Uuid,
    ) -> Result<TaskPlan, PlanError> {
        if self.branches.find_branch(branch_id)?.is_none() {
            return Err(PlanError::InvalidTaskPlan(format!("unknown branch {branch_id}")));
        }
        if let Some(plan) = self.plans.plan_for_branch(branch_id)? {
            return Err(PlanError::InvalidTaskPlan(format!(
                "branch {branch_id} already has plan {}, regenerate it instead",
                plan.id
            )));
        }

        classifier.reset_retry_count();
        let default_duration = Self::total_duration(request);

        let plan = loop {
            let attempt = classifier.attempts() + 1;
            tracing::debug!(branch = %branch_id, provider = self.provider.name(), attempt, "Requesting task plan");

            let result = self
                .provider
                .generate_plan(request)
                .await
                .and_then(|generated| generated.into_task_plan(branch_id, &default_duration));

            match result {
                Ok(plan) => {
                    classifier.reset_retry_count();
                    break plan;
                }
                Err(e) => {
                    let assessment = classifier.handle(&e);
                    if assessment.retryable && classifier.should_retry() {
                        let delay = classifier.retry_delay();
                        tracing::warn!(
                            branch = %branch_id,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %e,
                            "Plan generation failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    tracing::warn!(
                        branch = %branch_id,
                        attempts = classifier.attempts(),
                        reason = %assessment.message,
                        "Using starter plan"
                    );
                    break Self::fallback_plan(request, branch_id);
                }
            }
        };

        self.plans.create_plan(&plan)?;

        let progress = calculate_progress(&plan);
        tracing::info!(
            branch = %branch_id,
            plan = %plan.id,
            ai = plan.is_ai_generated,
            tasks = progress.total_tasks,
            minutes = progress.total_estimated_duration,
            "Stored task plan"
        );

        Ok(plan)
    }
}
