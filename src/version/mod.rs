//! Goal versioning model.
//!
//! Git-like vocabulary for a life: branches are goals, commits are typed
//! progress records, tags mark milestones. Entities refer to each other by
//! id only; inverse relations are answered by the storage finders.

mod branch;
mod commit;
mod display;
mod recommend;
mod tag;

pub use branch::{Branch, BranchStatus, MASTER_BRANCH_NAME};
pub use commit::{category_breakdown, Commit, CommitCategory, CommitType};
pub use display::{CommitTypeInfo, COMMIT_TYPE_INFO};
pub use recommend::{
    recommend_commit_types, recommend_from_types, DEFAULT_RECOMMENDATIONS, MAX_FREQUENT_TYPES,
    MAX_RECOMMENDATIONS,
};
pub use tag::{Tag, TagType};

use uuid::Uuid;

use crate::core::ErrorKind;
use crate::storage::{BranchStore, StorageError};

/// Errors raised by the versioning model.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// Status machine has no such edge.
    #[error("Cannot move branch from {from} to {to}")]
    IllegalTransition { from: BranchStatus, to: BranchStatus },

    /// Master branches are never abandoned.
    #[error("Master branch {0} cannot be abandoned")]
    MasterAbandoned(Uuid),

    /// Branch id did not resolve.
    #[error("Branch not found: {0}")]
    BranchNotFound(Uuid),

    /// Unparseable enum value.
    #[error("Unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// Storage collaborator failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl VersionError {
    /// Position in the error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalTransition { .. }
            | Self::MasterAbandoned(_)
            | Self::UnknownVariant { .. } => ErrorKind::Validation,
            Self::BranchNotFound(_) => ErrorKind::NotFound,
            Self::Storage(e) => e.kind(),
        }
    }
}

/// Return the user's master branch, creating it on first use.
pub fn ensure_master_branch(store: &dyn BranchStore, owner: &str) -> Result<Branch, VersionError> {
    if let Some(master) = store.master_branch(owner)? {
        return Ok(master);
    }

    let master = Branch::master(owner);
    store.create_branch(&master)?;
    tracing::info!(owner, branch = %master.id, "Created master branch");
    Ok(master)
}

/// Load a branch, move it to `next` and persist it.
pub fn transition_branch(
    store: &dyn BranchStore,
    id: Uuid,
    next: BranchStatus,
) -> Result<Branch, VersionError> {
    let mut branch = store.find_branch(id)?.ok_or(VersionError::BranchNotFound(id))?;
    branch.transition(next)?;
    store.update_branch(&branch)?;
    Ok(branch)
}
