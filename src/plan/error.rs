//! Task plan error types.

use uuid::Uuid;

use crate::core::ErrorKind;
use crate::storage::StorageError;

/// Errors returned by task plan operations.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// The plan (or its input) violates a model rule, e.g. its branch cannot be resolved.
    #[error("Invalid task plan: {0}")]
    InvalidTaskPlan(String),

    /// Deleting or regenerating an existing plan failed.
    #[error("Failed to regenerate task plan: {0}")]
    RegenerationFailed(#[source] Box<PlanError>),

    /// Persisting a newly added task failed.
    #[error("Failed to add task item: {0}")]
    AddFailed(#[source] StorageError),

    /// No task with this id in the plan.
    #[error("Task item not found: {0}")]
    TaskNotFound(Uuid),

    /// No plan for this branch.
    #[error("No task plan for branch {0}")]
    PlanNotFound(Uuid),

    /// Reorder input is not a permutation of the plan's tasks.
    #[error("Invalid task order: {0}")]
    InvalidOrder(String),

    /// Another generation for the same branch has not finished yet.
    #[error("A task plan is already being generated for branch {0}")]
    GenerationInProgress(Uuid),

    /// Storage collaborator failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PlanError {
    /// Position in the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTaskPlan(_) | Self::InvalidOrder(_) => ErrorKind::Validation,
            Self::TaskNotFound(_) | Self::PlanNotFound(_) => ErrorKind::NotFound,
            Self::GenerationInProgress(_) => ErrorKind::Conflict,
            Self::AddFailed(_) => ErrorKind::Persistence,
            Self::RegenerationFailed(inner) => inner.kind(),
            Self::Storage(e) => e.kind(),
        }
    }
}
