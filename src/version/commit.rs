//! Commits - typed progress records attached to a branch.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VersionError;

/// The fixed commit taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitType {
    TaskComplete,
    Milestone,
    Goal,
    Learning,
    Reading,
    Course,
    Reflection,
    Meditation,
    Journal,
    Habit,
    Exercise,
    Health,
    Social,
    Family,
    Travel,
    Hobby,
    Work,
    Project,
    Challenge,
    Insight,
    Other,
}

/// Analytics bucket for commit types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitCategory {
    Achievement,
    Learning,
    Personal,
    Lifestyle,
    Social,
    Experience,
    Professional,
    Growth,
    Other,
}

impl CommitType {
    /// Every commit type, in declaration order.
    pub const ALL: [Self; 21] = [
        Self::TaskComplete,
        Self::Milestone,
        Self::Goal,
        Self::Learning,
        Self::Reading,
        Self::Course,
        Self::Reflection,
        Self::Meditation,
        Self::Journal,
        Self::Habit,
        Self::Exercise,
        Self::Health,
        Self::Social,
        Self::Family,
        Self::Travel,
        Self::Hobby,
        Self::Work,
        Self::Project,
        Self::Challenge,
        Self::Insight,
        Self::Other,
    ];

    /// The category this type counts towards.
    pub fn category(self) -> CommitCategory {
        match self {
            Self::TaskComplete | Self::Milestone | Self::Goal => CommitCategory::Achievement,
            Self::Learning | Self::Reading | Self::Course => CommitCategory::Learning,
            Self::Reflection | Self::Meditation | Self::Journal => CommitCategory::Personal,
            Self::Habit | Self::Exercise | Self::Health => CommitCategory::Lifestyle,
            Self::Social | Self::Family => CommitCategory::Social,
            Self::Travel | Self::Hobby => CommitCategory::Experience,
            Self::Work | Self::Project => CommitCategory::Professional,
            Self::Challenge | Self::Insight => CommitCategory::Growth,
            Self::Other => CommitCategory::Other,
        }
    }

    /// Stable camelCase key, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TaskComplete => "taskComplete",
            Self::Milestone => "milestone",
            Self::Goal => "goal",
            Self::Learning => "learning",
            Self::Reading => "reading",
            Self::Course => "course",
            Self::Reflection => "reflection",
            Self::Meditation => "meditation",
            Self::Journal => "journal",
            Self::Habit => "habit",
            Self::Exercise => "exercise",
            Self::Health => "health",
            Self::Social => "social",
            Self::Family => "family",
            Self::Travel => "travel",
            Self::Hobby => "hobby",
            Self::Work => "work",
            Self::Project => "project",
            Self::Challenge => "challenge",
            Self::Insight => "insight",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitType {
    type Err = VersionError;

    /// Accepts the camelCase key case-insensitively, with or without
    /// separators (`task-complete`, `task_complete`, `TaskComplete`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String =
            s.chars().filter(|c| *c != '-' && *c != '_' && !c.is_whitespace()).collect();

        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| VersionError::UnknownVariant { kind: "commit type", value: s.to_string() })
    }
}

impl CommitCategory {
    /// All categories, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::Achievement,
        Self::Learning,
        Self::Personal,
        Self::Lifestyle,
        Self::Social,
        Self::Experience,
        Self::Professional,
        Self::Growth,
        Self::Other,
    ];

    /// Human-readable name.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Achievement => "Achievement",
            Self::Learning => "Learning",
            Self::Personal => "Personal",
            Self::Lifestyle => "Lifestyle",
            Self::Social => "Social",
            Self::Experience => "Experience",
            Self::Professional => "Professional",
            Self::Growth => "Growth",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for CommitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A progress record on a branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commit {
    /// Unique identifier
    pub id: Uuid,

    /// Branch this commit belongs to
    pub branch_id: Uuid,

    /// Commit type
    #[serde(rename = "type")]
    pub commit_type: CommitType,

    /// Commit message
    pub message: String,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Commit {
    /// Create a new commit on `branch_id`.
    pub fn new(branch_id: Uuid, commit_type: CommitType, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            branch_id,
            commit_type,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    /// Category of this commit's type.
    pub fn category(&self) -> CommitCategory {
        self.commit_type.category()
    }
}

/// Count commits per category, most frequent first.
///
/// Categories with equal counts keep declaration order.
pub fn category_breakdown(commits: &[Commit]) -> Vec<(CommitCategory, usize)> {
    let mut counts: Vec<(CommitCategory, usize)> = CommitCategory::ALL
        .into_iter()
        .map(|category| (category, commits.iter().filter(|c| c.category() == category).count()))
        .filter(|(_, count)| *count > 0)
        .collect();

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
