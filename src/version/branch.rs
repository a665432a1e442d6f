//! Branches - tracked long-term goals.
//!
//! Every user owns exactly one master branch (their main life line) and any
//! number of goal branches. A branch only ever changes through its status
//! machine: `active -> completed` or `active -> abandoned`, both terminal.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VersionError;

/// Name given to every user's master branch.
pub const MASTER_BRANCH_NAME: &str = "master";

/// Lifecycle status of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    /// Goal is being worked on
    Active,
    /// Goal was reached
    Completed,
    /// Goal was given up
    Abandoned,
}

impl BranchStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Active, Self::Completed, Self::Abandoned];

    /// Whether the status machine has an edge from `self` to `next`.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!((self, next), (Self::Active, Self::Completed) | (Self::Active, Self::Abandoned))
    }

    /// Terminal statuses have no outgoing edges.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchStatus {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VersionError::UnknownVariant { kind: "branch status", value: s.to_string() })
    }
}

/// A tracked long-term goal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Branch {
    /// Unique identifier
    pub id: Uuid,

    /// Goal name
    pub name: String,

    /// Longer goal description
    pub description: String,

    /// Lifecycle status
    pub status: BranchStatus,

    /// Whether this is the owner's master branch
    pub is_master: bool,

    /// Owning user
    pub owner_user_id: String,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Branch {
    /// Create a new active goal branch.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        owner_user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            status: BranchStatus::Active,
            is_master: false,
            owner_user_id: owner_user_id.into(),
            created_at: Utc::now(),
        }
    }

    /// Create the master branch for a user.
    pub fn master(owner_user_id: impl Into<String>) -> Self {
        Self {
            is_master: true,
            ..Self::new(MASTER_BRANCH_NAME, "Main life line", owner_user_id)
        }
    }

    /// Move the branch to `next`, enforcing the status machine.
    ///
    /// Master branches can be completed but never abandoned.
    pub fn transition(&mut self, next: BranchStatus) -> Result<(), VersionError> {
        if self.is_master && next == BranchStatus::Abandoned {
            return Err(VersionError::MasterAbandoned(self.id));
        }

        if !self.status.can_transition_to(next) {
            return Err(VersionError::IllegalTransition { from: self.status, to: next });
        }

        tracing::debug!(branch = %self.id, from = %self.status, to = %next, "Branch status changed");
        self.status = next;
        Ok(())
    }

    /// Mark the goal as reached.
    pub fn complete(&mut self) -> Result<(), VersionError> {
        self.transition(BranchStatus::Completed)
    }

    /// Give up on the goal.
    pub fn abandon(&mut self) -> Result<(), VersionError> {
        self.transition(BranchStatus::Abandoned)
    }

    /// Whether the branch is still being worked on.
    pub fn is_active(&self) -> bool {
        self.status == BranchStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_branch_is_active() {
        let branch = Branch::new("Run a marathon", "Finish 42km", "alice");
        assert_eq!(branch.status, BranchStatus::Active);
        assert!(!branch.is_master);
        assert!(branch.is_active());
    }

    #[test]
    fn test_legal_transitions() {
        let mut branch = Branch::new("Learn Rust", "", "alice");
        branch.complete().unwrap();
        assert_eq!(branch.status, BranchStatus::Completed);

        let mut branch = Branch::new("Learn Go", "", "alice");
        branch.abandon().unwrap();
        assert_eq!(branch.status, BranchStatus::Abandoned);
    }

    #[test]
    fn test_terminal_states_reject_reactivation() {
        for terminal in [BranchStatus::Completed, BranchStatus::Abandoned] {
            let mut branch = Branch::new("Goal", "", "alice");
            branch.transition(terminal).unwrap();

            let err = branch.transition(BranchStatus::Active).unwrap_err();
            assert!(matches!(err, VersionError::IllegalTransition { from, to }
                if from == terminal && to == BranchStatus::Active));
            assert_eq!(branch.status, terminal);
        }
    }

    #[test]
    fn test_terminal_states_reject_each_other() {
        let mut branch = Branch::new("Goal", "", "alice");
        branch.complete().unwrap();
        assert!(branch.abandon().is_err());
        assert!(branch.complete().is_err());
    }

    #[test]
    fn test_active_to_active_rejected() {
        let mut branch = Branch::new("Goal", "", "alice");
        assert!(branch.transition(BranchStatus::Active).is_err());
    }

    #[test]
    fn test_master_never_abandoned() {
        let mut master = Branch::master("alice");
        assert!(master.is_master);
        assert_eq!(master.name, MASTER_BRANCH_NAME);

        let err = master.abandon().unwrap_err();
        assert!(matches!(err, VersionError::MasterAbandoned(_)));
        assert_eq!(master.status, BranchStatus::Active);

        master.complete().unwrap();
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Completed".parse::<BranchStatus>().unwrap(), BranchStatus::Completed);
        assert_eq!(" active ".parse::<BranchStatus>().unwrap(), BranchStatus::Active);
        assert!("merged".parse::<BranchStatus>().is_err());
    }

    #[test]
    fn test_branch_serializes_camel_case() {
        let branch = Branch::master("alice");
        let json = serde_json::to_string(&branch).unwrap();
        assert!(json.contains("\"isMaster\":true"));
        assert!(json.contains("\"status\":\"active\""));
    }
}
