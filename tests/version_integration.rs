//! Versioning model integration tests.
//!
//! Branch lifecycle, commit recommendation and tags, backed by a real data file.

use chrono::{Duration, Utc};

use lifebranch::storage::{BranchStore, CommitStore, LocalStore, StorageError, TagStore};
use lifebranch::version::{
    ensure_master_branch, recommend_commit_types, transition_branch, Branch, BranchStatus, Commit,
    CommitCategory, CommitType, Tag, TagType, VersionError, DEFAULT_RECOMMENDATIONS,
};
use lifebranch::ErrorKind;

#[test]
fn test_master_branch_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    let master = {
        let store = LocalStore::open(&path).unwrap();
        ensure_master_branch(&store, "alice").unwrap()
    };

    let store = LocalStore::open(&path).unwrap();
    let again = ensure_master_branch(&store, "alice").unwrap();
    assert_eq!(master.id, again.id);
    assert_eq!(store.branches_for_user("alice").unwrap().len(), 1);

    let err = store.create_branch(&Branch::master("alice")).unwrap_err();
    assert!(matches!(err, StorageError::CreationFailed { .. }));
}

#[test]
fn test_status_machine_through_storage() {
    let store = LocalStore::in_memory();
    let goal = Branch::new("Learn to swim", "", "alice");
    let other = Branch::new("Learn to dive", "", "alice");
    store.create_branch(&goal).unwrap();
    store.create_branch(&other).unwrap();

    let done = transition_branch(&store, goal.id, BranchStatus::Completed).unwrap();
    assert_eq!(done.status, BranchStatus::Completed);

    for next in BranchStatus::ALL {
        let err = transition_branch(&store, goal.id, next).unwrap_err();
        assert!(matches!(err, VersionError::IllegalTransition { .. }));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    transition_branch(&store, other.id, BranchStatus::Abandoned).unwrap();
    let err = transition_branch(&store, other.id, BranchStatus::Active).unwrap_err();
    assert!(matches!(err, VersionError::IllegalTransition { .. }));

    assert_eq!(store.find_branch(goal.id).unwrap().unwrap().status, BranchStatus::Completed);
    assert_eq!(store.branches_by_status(BranchStatus::Abandoned).unwrap().len(), 1);
}

#[test]
fn test_master_can_complete_but_not_abandon() {
    let store = LocalStore::in_memory();
    let master = ensure_master_branch(&store, "bob").unwrap();

    let err = transition_branch(&store, master.id, BranchStatus::Abandoned).unwrap_err();
    assert!(matches!(err, VersionError::MasterAbandoned(_)));
    assert!(store.find_branch(master.id).unwrap().unwrap().is_active());

    transition_branch(&store, master.id, BranchStatus::Completed).unwrap();
}

#[test]
fn test_transition_unknown_branch() {
    let store = LocalStore::in_memory();
    let err = transition_branch(&store, uuid::Uuid::new_v4(), BranchStatus::Completed).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_recommendations_from_stored_history() {
    let store = LocalStore::in_memory();
    let branch = ensure_master_branch(&store, "alice").unwrap();

    assert_eq!(recommend_commit_types(&store.recent_commits(20).unwrap()), DEFAULT_RECOMMENDATIONS);

    let history = [
        (CommitType::Learning, 5),
        (CommitType::Habit, 3),
        (CommitType::Learning, 1),
    ];
    let mut offset = 0;
    for (commit_type, count) in history {
        for _ in 0..count {
            let mut commit = Commit::new(branch.id, commit_type, "entry");
            commit.created_at = Utc::now() - Duration::minutes(60 - offset);
            offset += 1;
            store.create_commit(&commit).unwrap();
        }
    }

    let recommended = recommend_commit_types(&store.recent_commits(20).unwrap());
    assert_eq!(
        recommended,
        vec![
            CommitType::Learning,
            CommitType::Habit,
            CommitType::TaskComplete,
            CommitType::Reflection,
            CommitType::Milestone,
        ]
    );
    assert!(recommended.len() <= 8);
}

#[test]
fn test_commit_queries() {
    let store = LocalStore::in_memory();
    let branch = ensure_master_branch(&store, "alice").unwrap();

    let mut old = Commit::new(branch.id, CommitType::Travel, "Lisbon trip");
    old.created_at = Utc::now() - Duration::days(30);
    store.create_commit(&old).unwrap();
    store.create_commit(&Commit::new(branch.id, CommitType::Work, "Shipped v2")).unwrap();

    let last_week = store.commits_between(Utc::now() - Duration::days(7), Utc::now()).unwrap();
    assert_eq!(last_week.len(), 1);
    assert_eq!(last_week[0].category(), CommitCategory::Professional);

    assert_eq!(store.search_commits("lisbon").unwrap()[0].id, old.id);
    assert_eq!(store.all_commits().unwrap()[1].id, old.id);
}

#[test]
fn test_tag_version_association() {
    let store = LocalStore::in_memory();
    let mut tag = Tag::new("Graduated", "BSc", TagType::Education, "alice");
    assert!(!tag.is_version_associated());

    tag.associate_version("v3");
    assert!(tag.is_version_associated());
    store.create_tag(&tag).unwrap();
    assert_eq!(store.tags_for_version("v3").unwrap().len(), 1);

    tag.associate_version("");
    assert!(!tag.is_version_associated());
    store.update_tag(&tag).unwrap();
    assert!(store.tags_for_version("v3").unwrap().is_empty());
}
