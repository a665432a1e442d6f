//! Presentation metadata for commit types.
//!
//! Kept out of the core types: nothing here affects storage keys,
//! categories or recommendation.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::commit::{CommitCategory, CommitType};

/// How a commit type is shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitTypeInfo {
    pub emoji: &'static str,
    /// Hex color, `#RRGGBB`
    pub color: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub category: CommitCategory,
}

const fn info(
    emoji: &'static str,
    color: &'static str,
    display_name: &'static str,
    description: &'static str,
    category: CommitCategory,
) -> CommitTypeInfo {
    CommitTypeInfo { emoji, color, display_name, description, category }
}

/// Lookup table for every commit type.
pub static COMMIT_TYPE_INFO: Lazy<HashMap<CommitType, CommitTypeInfo>> = Lazy::new(|| {
    use CommitCategory as C;
    use CommitType as T;

    HashMap::from([
        (T::TaskComplete, info("✅", "#34C759", "Task complete", "Finished a planned task", C::Achievement)),
        (T::Milestone, info("🏁", "#FF9500", "Milestone", "Reached a significant checkpoint", C::Achievement)),
        (T::Goal, info("🎯", "#FF3B30", "Goal", "Achieved a goal", C::Achievement)),
        (T::Learning, info("📚", "#007AFF", "Learning", "Learned something new", C::Learning)),
        (T::Reading, info("📖", "#5AC8FA", "Reading", "Read a book or article", C::Learning)),
        (T::Course, info("🎓", "#5856D6", "Course", "Progressed through a course", C::Learning)),
        (T::Reflection, info("💭", "#AF52DE", "Reflection", "Looked back and took stock", C::Personal)),
        (T::Meditation, info("🧘", "#A2845E", "Meditation", "Took time to be mindful", C::Personal)),
        (T::Journal, info("📝", "#8E8E93", "Journal", "Wrote a journal entry", C::Personal)),
        (T::Habit, info("🔁", "#30B0C7", "Habit", "Kept up a habit", C::Lifestyle)),
        (T::Exercise, info("🏃", "#FF2D55", "Exercise", "Worked out", C::Lifestyle)),
        (T::Health, info("🍎", "#32D74B", "Health", "Looked after your health", C::Lifestyle)),
        (T::Social, info("🤝", "#FFCC00", "Social", "Spent time with people", C::Social)),
        (T::Family, info("👪", "#FF9F0A", "Family", "Spent time with family", C::Social)),
        (T::Travel, info("✈️", "#64D2FF", "Travel", "Went somewhere new", C::Experience)),
        (T::Hobby, info("🎨", "#BF5AF2", "Hobby", "Enjoyed a hobby", C::Experience)),
        (T::Work, info("💼", "#636366", "Work", "Made progress at work", C::Professional)),
        (T::Project, info("🛠️", "#0A84FF", "Project", "Shipped part of a project", C::Professional)),
        (T::Challenge, info("⛰️", "#FF453A", "Challenge", "Took on something hard", C::Growth)),
        (T::Insight, info("💡", "#FFD60A", "Insight", "Had a realisation", C::Growth)),
        (T::Other, info("📌", "#AEAEB2", "Other", "Anything else", C::Other)),
    ])
});

impl CommitType {
    /// Presentation metadata for this type.
    pub fn info(self) -> &'static CommitTypeInfo {
        &COMMIT_TYPE_INFO[&self]
    }
}
