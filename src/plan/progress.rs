//! Progress statistics for a task plan.

use serde::Serialize;

use super::TaskPlan;

/// Snapshot of how far along a plan is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPlanProgress {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// `completed_tasks / total_tasks`, 0.0 for an empty plan
    pub progress_ratio: f64,
    /// Minutes
    pub total_estimated_duration: u64,
    /// Minutes
    pub completed_duration: u64,
}

impl TaskPlanProgress {
    pub fn remaining_tasks(&self) -> usize {
        self.total_tasks - self.completed_tasks
    }

    pub fn remaining_duration(&self) -> u64 {
        self.total_estimated_duration - self.completed_duration
    }

    /// Every task done. An empty plan is never complete.
    pub fn is_completed(&self) -> bool {
        self.progress_ratio >= 1.0
    }

    /// Ratio as a whole percentage.
    pub fn percent(&self) -> u32 {
        (self.progress_ratio * 100.0).round() as u32
    }
}

/// Compute progress statistics for `plan`.
pub fn calculate_progress(plan: &TaskPlan) -> TaskPlanProgress {
    let total_tasks = plan.tasks.len();
    let completed_tasks = plan.tasks.iter().filter(|t| t.is_completed).count();

    let total_estimated_duration: u64 =
        plan.tasks.iter().map(|t| u64::from(t.estimated_duration)).sum();
    let completed_duration: u64 = plan
        .tasks
        .iter()
        .filter(|t| t.is_completed)
        .map(|t| u64::from(t.estimated_duration))
        .sum();

    let progress_ratio =
        if total_tasks == 0 { 0.0 } else { completed_tasks as f64 / total_tasks as f64 };

    TaskPlanProgress {
        total_tasks,
        completed_tasks,
        progress_ratio,
        total_estimated_duration,
        completed_duration,
    }
}
