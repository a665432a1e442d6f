//! Task item lifecycle within a plan.
//!
//! Every mutation is applied to a copy of the plan, persisted, and only then
//! written back to the caller's plan. A failed write leaves the caller's
//! plan untouched, so `order_index` stays dense at every observable point.

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::storage::TaskPlanStore;

use super::{PlanError, TaskItem, TaskItemDraft, TaskPlan};

/// Adds, edits, removes, reorders and completes task items.
#[derive(Clone)]
pub struct TaskItemStore {
    plans: Arc<dyn TaskPlanStore>,
}

impl std::fmt::Debug for TaskItemStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskItemStore").finish_non_exhaustive()
    }
}

impl TaskItemStore {
    /// Create a store persisting through `plans`.
    pub fn new(plans: Arc<dyn TaskPlanStore>) -> Self {
        Self { plans }
    }

    /// Append a new task at the end of the plan.
    pub fn add(&self, plan: &mut TaskPlan, draft: TaskItemDraft) -> Result<TaskItem, PlanError> {
        let mut next = plan.clone();
        let item = TaskItem::from_draft(draft, next.tasks.len());
        next.tasks.push(item.clone());
        next.touch();

        self.plans.update_plan(&next).map_err(PlanError::AddFailed)?;
        tracing::debug!(plan = %plan.id, task = %item.id, index = item.order_index, "Added task");

        *plan = next;
        Ok(item)
    }

    /// Replace a task's content in place.
    ///
    /// The task keeps its position; completion is normalised so that
    /// `completed_at` is set exactly when `is_completed`.
    pub fn update(&self, plan: &mut TaskPlan, item: TaskItem) -> Result<(), PlanError> {
        let position = plan.position(item.id).ok_or(PlanError::TaskNotFound(item.id))?;

        let mut next = plan.clone();
        let mut item = item;
        item.order_index = position;
        if item.is_completed {
            item.completed_at = item.completed_at.or(next.tasks[position].completed_at);
        }
        item.set_completed(item.is_completed);
        next.tasks[position] = item;
        next.touch();

        self.plans.update_plan(&next)?;
        *plan = next;
        Ok(())
    }

    /// Remove a task and close the gap in `order_index`.
    pub fn remove(&self, plan: &mut TaskPlan, task_id: Uuid) -> Result<TaskItem, PlanError> {
        let position = plan.position(task_id).ok_or(PlanError::TaskNotFound(task_id))?;

        let mut next = plan.clone();
        let removed = next.tasks.remove(position);
        next.reindex();
        next.touch();

        self.plans.update_plan(&next)?;
        tracing::debug!(plan = %plan.id, task = %task_id, remaining = next.len(), "Removed task");

        *plan = next;
        Ok(removed)
    }

    /// Replace the plan's task sequence with `ordered`.
    ///
    /// `ordered` must contain exactly the plan's current tasks (by id), each
    /// once. Each task's `order_index` becomes its position in `ordered`.
    pub fn reorder(&self, plan: &mut TaskPlan, ordered: Vec<TaskItem>) -> Result<(), PlanError> {
        Self::check_permutation(plan, &ordered)?;

        let mut next = plan.clone();
        next.tasks = ordered;
        next.reindex();
        next.touch();

        self.plans.update_plan(&next)?;
        *plan = next;
        Ok(())
    }

    /// Reorder by task ids; convenience over [`TaskItemStore::reorder`].
    pub fn reorder_by_ids(&self, plan: &mut TaskPlan, ids: &[Uuid]) -> Result<(), PlanError> {
        let ordered = ids
            .iter()
            .map(|id| plan.task(*id).cloned().ok_or(PlanError::TaskNotFound(*id)))
            .collect::<Result<Vec<_>, _>>()?;
        self.reorder(plan, ordered)
    }

    /// Flip a task's completion and persist its plan.
    ///
    /// Task items carry no plan reference, so the owning plan is looked up
    /// through storage. Returns the updated plan.
    pub fn toggle_completion(&self, task_id: Uuid) -> Result<TaskPlan, PlanError> {
        let mut plan =
            self.plans.plan_containing_task(task_id)?.ok_or(PlanError::TaskNotFound(task_id))?;

        let position = plan.position(task_id).ok_or(PlanError::TaskNotFound(task_id))?;
        plan.tasks[position].toggle_completion();
        plan.touch();

        self.plans.update_plan(&plan)?;
        tracing::debug!(
            plan = %plan.id,
            task = %task_id,
            completed = plan.tasks[position].is_completed,
            "Toggled task completion"
        );

        Ok(plan)
    }

    fn check_permutation(plan: &TaskPlan, ordered: &[TaskItem]) -> Result<(), PlanError> {
        if ordered.len() != plan.tasks.len() {
            return Err(PlanError::InvalidOrder(format!(
                "expected {} tasks, got {}",
                plan.tasks.len(),
                ordered.len()
            )));
        }

        let mut seen = HashSet::with_capacity(ordered.len());
        for item in ordered {
            if plan.task(item.id).is_none() {
                return Err(PlanError::InvalidOrder(format!("task {} is not in this plan", item.id)));
            }
            if !seen.insert(item.id) {
                return Err(PlanError::InvalidOrder(format!("task {} appears twice", item.id)));
            }
        }

        Ok(())
    }
}
