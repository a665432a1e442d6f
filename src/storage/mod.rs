//! Storage collaborator.
//!
//! One trait per entity type. Components receive the store they need at
//! construction time (`Arc<dyn TaskPlanStore>` and friends), so tests can
//! swap in doubles. [`LocalStore`] implements all of them.
//!
//! `all_*` methods return entities newest first.

mod local;

pub use local::{LocalStore, Snapshot};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::core::ErrorKind;
use crate::plan::TaskPlan;
use crate::version::{Branch, BranchStatus, Commit, CommitType, Tag, TagType};

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage failures. Every variant carries the underlying cause as text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to create {entity}: {message}")]
    CreationFailed { entity: &'static str, message: String },

    #[error("Failed to update {entity}: {message}")]
    UpdateFailed { entity: &'static str, message: String },

    #[error("Failed to delete {entity}: {message}")]
    DeletionFailed { entity: &'static str, message: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Uuid },

    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl StorageError {
    /// Position in the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Persistence,
        }
    }
}

/// Branch persistence.
pub trait BranchStore: Send + Sync {
    /// Fails if the owner already has a master branch and `branch` is one.
    fn create_branch(&self, branch: &Branch) -> StorageResult<()>;
    fn update_branch(&self, branch: &Branch) -> StorageResult<()>;
    fn delete_branch(&self, id: Uuid) -> StorageResult<()>;
    fn find_branch(&self, id: Uuid) -> StorageResult<Option<Branch>>;
    fn all_branches(&self) -> StorageResult<Vec<Branch>>;
    fn branches_by_status(&self, status: BranchStatus) -> StorageResult<Vec<Branch>>;
    fn branches_for_user(&self, owner: &str) -> StorageResult<Vec<Branch>>;
    fn master_branch(&self, owner: &str) -> StorageResult<Option<Branch>>;
}

/// Commit persistence.
pub trait CommitStore: Send + Sync {
    fn create_commit(&self, commit: &Commit) -> StorageResult<()>;
    fn update_commit(&self, commit: &Commit) -> StorageResult<()>;
    fn delete_commit(&self, id: Uuid) -> StorageResult<()>;
    fn find_commit(&self, id: Uuid) -> StorageResult<Option<Commit>>;
    fn all_commits(&self) -> StorageResult<Vec<Commit>>;
    fn commits_for_branch(&self, branch_id: Uuid) -> StorageResult<Vec<Commit>>;
    fn commits_by_type(&self, commit_type: CommitType) -> StorageResult<Vec<Commit>>;
    /// Commits created in `[from, to]`.
    fn commits_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StorageResult<Vec<Commit>>;
    /// Case-insensitive substring search on the message.
    fn search_commits(&self, text: &str) -> StorageResult<Vec<Commit>>;

    /// The `limit` newest commits.
    fn recent_commits(&self, limit: usize) -> StorageResult<Vec<Commit>> {
        let mut commits = self.all_commits()?;
        commits.truncate(limit);
        Ok(commits)
    }
}

/// Task plan persistence. Task items are stored inside their plan.
pub trait TaskPlanStore: Send + Sync {
    /// Fails if the branch already has a plan.
    fn create_plan(&self, plan: &TaskPlan) -> StorageResult<()>;
    fn update_plan(&self, plan: &TaskPlan) -> StorageResult<()>;
    /// Deletes the plan together with all of its task items.
    fn delete_plan(&self, id: Uuid) -> StorageResult<()>;
    fn find_plan(&self, id: Uuid) -> StorageResult<Option<TaskPlan>>;
    fn all_plans(&self) -> StorageResult<Vec<TaskPlan>>;
    fn plan_for_branch(&self, branch_id: Uuid) -> StorageResult<Option<TaskPlan>>;
    /// The plan owning the task item `task_id`.
    fn plan_containing_task(&self, task_id: Uuid) -> StorageResult<Option<TaskPlan>>;
}

/// Tag persistence.
pub trait TagStore: Send + Sync {
    fn create_tag(&self, tag: &Tag) -> StorageResult<()>;
    fn update_tag(&self, tag: &Tag) -> StorageResult<()>;
    fn delete_tag(&self, id: Uuid) -> StorageResult<()>;
    fn find_tag(&self, id: Uuid) -> StorageResult<Option<Tag>>;
    fn all_tags(&self) -> StorageResult<Vec<Tag>>;
    fn tags_by_type(&self, tag_type: TagType) -> StorageResult<Vec<Tag>>;
    fn important_tags(&self) -> StorageResult<Vec<Tag>>;
    /// Tags pointing at `version`.
    fn tags_for_version(&self, version: &str) -> StorageResult<Vec<Tag>>;
    /// Case-insensitive substring search on the title.
    fn search_tags(&self, text: &str) -> StorageResult<Vec<Tag>>;
}
