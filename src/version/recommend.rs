//! Commit-type recommendation.
//!
//! Ranks the types a user commits most often and pads the list with a fixed
//! set of defaults, so a new user still gets sensible suggestions.

use super::commit::{Commit, CommitType};

/// Number of history-derived types kept before the defaults are appended.
pub const MAX_FREQUENT_TYPES: usize = 6;

/// Upper bound on the recommendation list.
pub const MAX_RECOMMENDATIONS: usize = 8;

/// Always offered, in this order, when not already ranked.
pub const DEFAULT_RECOMMENDATIONS: [CommitType; 4] = [
    CommitType::TaskComplete,
    CommitType::Learning,
    CommitType::Reflection,
    CommitType::Milestone,
];

/// Recommend commit types from recent history.
///
/// Types are counted and sorted by count, descending. The sort is stable and
/// counting preserves first-appearance order, so ties rank the type seen
/// first in `recent` ahead. The top [`MAX_FREQUENT_TYPES`] are followed by
/// any missing [`DEFAULT_RECOMMENDATIONS`], capped at [`MAX_RECOMMENDATIONS`].
pub fn recommend_commit_types(recent: &[Commit]) -> Vec<CommitType> {
    let types: Vec<CommitType> = recent.iter().map(|c| c.commit_type).collect();
    recommend_from_types(&types)
}

/// Same as [`recommend_commit_types`], over bare types.
pub fn recommend_from_types(recent: &[CommitType]) -> Vec<CommitType> {
    let mut counts: Vec<(CommitType, usize)> = Vec::new();
    for &commit_type in recent {
        match counts.iter_mut().find(|(t, _)| *t == commit_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((commit_type, 1)),
        }
    }

    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let mut recommended: Vec<CommitType> =
        counts.into_iter().take(MAX_FREQUENT_TYPES).map(|(t, _)| t).collect();

    for default in DEFAULT_RECOMMENDATIONS {
        if !recommended.contains(&default) {
            recommended.push(default);
        }
    }

    recommended.truncate(MAX_RECOMMENDATIONS);
    recommended
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use CommitType as T;

    fn commits(types: &[CommitType]) -> Vec<Commit> {
        let branch = Uuid::new_v4();
        types.iter().map(|&t| Commit::new(branch, t, "entry")).collect()
    }

    #[test]
    fn test_no_history_yields_defaults() {
        assert_eq!(recommend_commit_types(&[]), DEFAULT_RECOMMENDATIONS.to_vec());
    }

    #[test]
    fn test_frequency_ranking_with_defaults() {
        let mut history = vec![T::Learning; 5];
        history.extend([T::Habit; 3]);
        history.push(T::Learning);

        let recommended = recommend_commit_types(&commits(&history));
        assert_eq!(
            recommended,
            vec![T::Learning, T::Habit, T::TaskComplete, T::Reflection, T::Milestone]
        );
    }

    #[test]
    fn test_ties_keep_first_appearance_order() {
        let recommended = recommend_from_types(&[T::Travel, T::Work, T::Work, T::Travel, T::Hobby]);
        assert_eq!(&recommended[..3], &[T::Travel, T::Work, T::Hobby]);
    }

    #[test]
    fn test_only_six_frequent_types_kept() {
        let history = [
            T::Exercise, T::Exercise, T::Exercise, T::Exercise, T::Exercise, T::Exercise, T::Exercise,
            T::Work, T::Work, T::Work, T::Work, T::Work, T::Work,
            T::Travel, T::Travel, T::Travel, T::Travel, T::Travel,
            T::Hobby, T::Hobby, T::Hobby, T::Hobby,
            T::Family, T::Family, T::Family,
            T::Insight, T::Insight,
            T::Health,
        ];

        let recommended = recommend_from_types(&history);
        assert_eq!(recommended.len(), MAX_RECOMMENDATIONS);
        assert_eq!(
            recommended,
            vec![
                T::Exercise,
                T::Work,
                T::Travel,
                T::Hobby,
                T::Family,
                T::Insight,
                T::TaskComplete,
                T::Learning
            ]
        );
        assert!(!recommended.contains(&T::Health));
    }

    #[test]
    fn test_no_duplicates_when_defaults_are_frequent() {
        let recommended = recommend_from_types(&[T::Milestone, T::TaskComplete, T::Milestone]);
        assert_eq!(recommended, vec![T::Milestone, T::TaskComplete, T::Learning, T::Reflection]);
    }
}
