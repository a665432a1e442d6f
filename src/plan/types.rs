//! Task plan and task item types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PlanError;

/// How often a task is meant to be worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeScope {
    Daily,
    Weekly,
    Monthly,
}

impl TimeScope {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl fmt::Display for TimeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeScope {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            other => Err(PlanError::InvalidTaskPlan(format!("unknown time scope '{other}'"))),
        }
    }
}

/// Input for a new task item. Position and completion are assigned by the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItemDraft {
    pub title: String,
    pub description: String,
    pub time_scope: TimeScope,
    /// Minutes
    pub estimated_duration: u32,
    pub execution_tips: Option<String>,
}

impl TaskItemDraft {
    /// Create a draft without execution tips.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        time_scope: TimeScope,
        estimated_duration: u32,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            time_scope,
            estimated_duration,
            execution_tips: None,
        }
    }

    /// Attach execution tips.
    pub fn with_tips(mut self, tips: impl Into<String>) -> Self {
        self.execution_tips = Some(tips.into());
        self
    }
}

/// One actionable step of a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskItem {
    /// Unique identifier
    pub id: Uuid,

    /// Short title
    pub title: String,

    /// What to do
    pub description: String,

    /// How often to work on it
    pub time_scope: TimeScope,

    /// Estimated minutes
    pub estimated_duration: u32,

    /// Zero-based position within the owning plan
    pub order_index: usize,

    /// Whether the task is done
    pub is_completed: bool,

    /// When the task was completed; set exactly when `is_completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Practical hints for doing the task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_tips: Option<String>,
}

impl TaskItem {
    /// Create an open task at `order_index`.
    pub fn from_draft(draft: TaskItemDraft, order_index: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            time_scope: draft.time_scope,
            estimated_duration: draft.estimated_duration,
            order_index,
            is_completed: false,
            completed_at: None,
            execution_tips: draft.execution_tips,
        }
    }

    /// Set completion, keeping `completed_at` in step with `is_completed`.
    pub fn set_completed(&mut self, completed: bool) {
        self.is_completed = completed;
        self.completed_at = if completed { Some(self.completed_at.unwrap_or_else(Utc::now)) } else { None };
    }

    /// Flip completion.
    pub fn toggle_completion(&mut self) {
        self.completed_at = None;
        self.set_completed(!self.is_completed);
    }
}

/// The ordered decomposition of a branch's goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPlan {
    /// Unique identifier
    pub id: Uuid,

    /// Owning branch (one plan per branch)
    pub branch_id: Uuid,

    /// Free-form overall duration, e.g. "3 months"
    pub total_duration: String,

    /// Whether the plan came from the AI backend
    #[serde(rename = "isAIGenerated")]
    pub is_ai_generated: bool,

    /// Tasks in order; `tasks[i].order_index == i`
    pub tasks: Vec<TaskItem>,

    /// Creation time
    pub created_at: DateTime<Utc>,

    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl TaskPlan {
    /// Build a plan from drafts, assigning positions in order.
    pub fn new(
        branch_id: Uuid,
        total_duration: impl Into<String>,
        is_ai_generated: bool,
        drafts: impl IntoIterator<Item = TaskItemDraft>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            branch_id,
            total_duration: total_duration.into(),
            is_ai_generated,
            tasks: drafts
                .into_iter()
                .enumerate()
                .map(|(i, draft)| TaskItem::from_draft(draft, i))
                .collect(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Find a task by id.
    pub fn task(&self, id: Uuid) -> Option<&TaskItem> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Position of a task by id.
    pub fn position(&self, id: Uuid) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the plan has no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Rewrite every `order_index` to its position.
    pub fn reindex(&mut self) {
        for (i, task) in self.tasks.iter_mut().enumerate() {
            task.order_index = i;
        }
    }

    /// Whether `order_index` values are exactly `0..len` in position order.
    pub fn has_dense_order(&self) -> bool {
        self.tasks.iter().enumerate().all(|(i, t)| t.order_index == i)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
