//! Tags - labelled milestone markers.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::VersionError;

/// Kind of life event a tag marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Milestone,
    Birthday,
    Career,
    Relationship,
    Education,
    Achievement,
}

impl TagType {
    /// All tag types.
    pub const ALL: [Self; 6] = [
        Self::Milestone,
        Self::Birthday,
        Self::Career,
        Self::Relationship,
        Self::Education,
        Self::Achievement,
    ];

    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Milestone => "milestone",
            Self::Birthday => "birthday",
            Self::Career => "career",
            Self::Relationship => "relationship",
            Self::Education => "education",
            Self::Achievement => "achievement",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagType {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VersionError::UnknownVariant { kind: "tag type", value: s.to_string() })
    }
}

/// A labelled marker, optionally pinned to a branch/version identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    /// Unique identifier
    pub id: Uuid,

    /// Tag title
    pub title: String,

    /// Tag description
    pub description: String,

    /// Tag type
    #[serde(rename = "type")]
    pub tag_type: TagType,

    /// Version identifier this tag points at
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub associated_version: Option<String>,

    /// Whether the tag is highlighted
    pub is_important: bool,

    /// Owning user
    pub owner_user_id: String,

    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Tag {
    /// Create a new, unassociated tag.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        tag_type: TagType,
        owner_user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            tag_type,
            associated_version: None,
            is_important: false,
            owner_user_id: owner_user_id.into(),
            created_at: Utc::now(),
        }
    }

    /// Mark the tag as important.
    pub fn important(mut self) -> Self {
        self.is_important = true;
        self
    }

    /// Whether the tag points at a version, i.e. the identifier is non-empty.
    pub fn is_version_associated(&self) -> bool {
        self.associated_version.as_deref().is_some_and(|v| !v.is_empty())
    }

    /// Point the tag at `version`. Blank identifiers clear the association.
    pub fn associate_version(&mut self, version: impl Into<String>) {
        let version = version.into();
        self.associated_version = if version.trim().is_empty() { None } else { Some(version) };
    }

    /// Remove the version association.
    pub fn clear_version(&mut self) {
        self.associated_version = None;
    }
}
