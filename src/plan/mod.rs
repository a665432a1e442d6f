//! Task plans: the ordered breakdown of a branch's goal.
//!
//! - [`TaskPlanGenerator`] asks an AI provider for a plan, retries transient
//!   failures and falls back to a starter plan.
//! - [`TaskItemStore`] edits the tasks of a stored plan while keeping
//!   `order_index` dense.
//! - [`calculate_progress`] summarises how far a plan is.
//! - [`TaskPlanManager`] ties these together for callers.

mod error;
mod generator;
mod items;
mod manager;
mod progress;
mod types;

pub use error::PlanError;
pub use generator::{TaskPlanGenerator, FALLBACK_TASK_MINUTES, UNDECIDED_DURATION};
pub use items::TaskItemStore;
pub use manager::{ManagerState, TaskPlanManager};
pub use progress::{calculate_progress, TaskPlanProgress};
pub use types::{TaskItem, TaskItemDraft, TaskPlan, TimeScope};
