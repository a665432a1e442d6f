//! Task plan manager surface.
//!
//! Front door for callers (CLI, UI). Wraps the generator and the task item
//! store, and publishes a [`ManagerState`] over a `watch` channel so callers
//! can observe busy flags and the last error without polling.

use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

use crate::ai::PlanProvider;
use crate::core::RetryConfig;
use crate::storage::{BranchStore, TaskPlanStore};

use super::{
    calculate_progress, PlanError, TaskItem, TaskItemDraft, TaskItemStore, TaskPlan,
    TaskPlanGenerator, TaskPlanProgress,
};

/// Observable manager state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManagerState {
    pub is_generating: bool,
    pub is_editing: bool,
    pub is_loading: bool,
    /// Message of the most recent failure, kept until [`TaskPlanManager::clear_error`]
    pub last_error: Option<String>,
    /// Plan touched by the most recent successful operation
    pub current_plan: Option<TaskPlan>,
}

impl ManagerState {
    /// Any operation in progress.
    pub fn is_busy(&self) -> bool {
        self.is_generating || self.is_editing || self.is_loading
    }
}

#[derive(Debug, Clone, Copy)]
enum Activity {
    Generating,
    Editing,
    Loading,
}

impl Activity {
    fn set(self, state: &mut ManagerState, on: bool) {
        match self {
            Self::Generating => state.is_generating = on,
            Self::Editing => state.is_editing = on,
            Self::Loading => state.is_loading = on,
        }
    }
}

/// Clears its busy flag when dropped, including on early return.
struct Busy<'a> {
    state: &'a watch::Sender<ManagerState>,
    activity: Activity,
}

impl<'a> Busy<'a> {
    fn start(state: &'a watch::Sender<ManagerState>, activity: Activity) -> Self {
        state.send_modify(|s| activity.set(s, true));
        Self { state, activity }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        let activity = self.activity;
        self.state.send_modify(|s| activity.set(s, false));
    }
}

/// Generates, edits and reads task plans.
pub struct TaskPlanManager {
    generator: TaskPlanGenerator,
    items: TaskItemStore,
    plans: Arc<dyn TaskPlanStore>,
    state: watch::Sender<ManagerState>,
}

impl std::fmt::Debug for TaskPlanManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPlanManager")
            .field("generator", &self.generator)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl TaskPlanManager {
    pub fn new(
        provider: Arc<dyn PlanProvider>,
        plans: Arc<dyn TaskPlanStore>,
        branches: Arc<dyn BranchStore>,
    ) -> Self {
        let (state, _) = watch::channel(ManagerState::default());
        Self {
            generator: TaskPlanGenerator::new(provider, plans.clone(), branches),
            items: TaskItemStore::new(plans.clone()),
            plans,
            state,
        }
    }

    /// Replace the generator's retry policy.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.generator = self.generator.with_retry_config(retry);
        self
    }

    pub fn generator(&self) -> &TaskPlanGenerator {
        &self.generator
    }

    /// Receive every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<ManagerState> {
        self.state.subscribe()
    }

    /// Current state.
    pub fn state(&self) -> ManagerState {
        self.state.borrow().clone()
    }

    /// Forget the last error.
    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.last_error.take().is_some());
    }

    pub async fn generate(
        &self,
        goal_title: &str,
        goal_description: &str,
        branch_id: Uuid,
        timeframe: Option<&str>,
    ) -> Result<TaskPlan, PlanError> {
        let _busy = Busy::start(&self.state, Activity::Generating);
        let result =
            self.generator.generate(goal_title, goal_description, branch_id, timeframe).await;
        self.record_plan(result)
    }

    pub async fn regenerate(&self, existing: &TaskPlan) -> Result<TaskPlan, PlanError> {
        let _busy = Busy::start(&self.state, Activity::Generating);
        let result = self.generator.regenerate(existing).await;
        self.record_plan(result)
    }

    /// Change the plan's overall duration.
    pub fn update_task_plan(&self, plan: &mut TaskPlan, total_duration: &str) -> Result<(), PlanError> {
        let _busy = Busy::start(&self.state, Activity::Editing);

        let mut next = plan.clone();
        next.total_duration = total_duration.trim().to_string();
        next.touch();

        let result = self.plans.update_plan(&next).map_err(PlanError::from);
        self.record(result.map(|()| *plan = next), plan)
    }

    pub fn add_task_item(&self, plan: &mut TaskPlan, draft: TaskItemDraft) -> Result<TaskItem, PlanError> {
        let _busy = Busy::start(&self.state, Activity::Editing);
        let result = self.items.add(plan, draft);
        self.record(result, plan)
    }

    pub fn update_task_item(&self, plan: &mut TaskPlan, item: TaskItem) -> Result<(), PlanError> {
        let _busy = Busy::start(&self.state, Activity::Editing);
        let result = self.items.update(plan, item);
        self.record(result, plan)
    }

    pub fn remove_task_item(&self, plan: &mut TaskPlan, task_id: Uuid) -> Result<TaskItem, PlanError> {
        let _busy = Busy::start(&self.state, Activity::Editing);
        let result = self.items.remove(plan, task_id);
        self.record(result, plan)
    }

    pub fn reorder_task_items(&self, plan: &mut TaskPlan, ordered: Vec<TaskItem>) -> Result<(), PlanError> {
        let _busy = Busy::start(&self.state, Activity::Editing);
        let result = self.items.reorder(plan, ordered);
        self.record(result, plan)
    }

    /// Flip a task's completion; returns its updated plan.
    pub fn toggle_task_completion(&self, task_id: Uuid) -> Result<TaskPlan, PlanError> {
        let _busy = Busy::start(&self.state, Activity::Editing);
        let result = self.items.toggle_completion(task_id);
        self.record_plan(result)
    }

    /// The plan of a branch, if it has one.
    pub fn get_task_plan(&self, branch_id: Uuid) -> Result<Option<TaskPlan>, PlanError> {
        let _busy = Busy::start(&self.state, Activity::Loading);
        match self.plans.plan_for_branch(branch_id) {
            Ok(plan) => {
                self.state.send_modify(|s| s.current_plan = plan.clone());
                Ok(plan)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    /// The plan of a branch, failing with [`PlanError::PlanNotFound`] when it has none.
    pub fn require_task_plan(&self, branch_id: Uuid) -> Result<TaskPlan, PlanError> {
        self.get_task_plan(branch_id)?
            .ok_or_else(|| self.fail(PlanError::PlanNotFound(branch_id)))
    }

    pub fn calculate_progress(&self, plan: &TaskPlan) -> TaskPlanProgress {
        calculate_progress(plan)
    }

    fn record<T>(&self, result: Result<T, PlanError>, plan: &TaskPlan) -> Result<T, PlanError> {
        match result {
            Ok(value) => {
                self.state.send_modify(|s| s.current_plan = Some(plan.clone()));
                Ok(value)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn record_plan(&self, result: Result<TaskPlan, PlanError>) -> Result<TaskPlan, PlanError> {
        match result {
            Ok(plan) => {
                self.state.send_modify(|s| s.current_plan = Some(plan.clone()));
                Ok(plan)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn fail(&self, error: PlanError) -> PlanError {
        tracing::error!(kind = %error.kind(), error = %error, "Task plan operation failed");
        self.state.send_modify(|s| s.last_error = Some(error.to_string()));
        error
    }
}
