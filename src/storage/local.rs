//! Local storage backed by a single JSON file.
//!
//! The whole data set lives in memory behind a lock and is written back to
//! disk after every mutation. A failed write restores the previous state,
//! so memory never runs ahead of the file.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    BranchStore, CommitStore, StorageError, StorageResult, TagStore, TaskPlanStore,
};
use crate::plan::TaskPlan;
use crate::version::{Branch, BranchStatus, Commit, CommitType, Tag, TagType};

/// Current on-disk format version.
const SNAPSHOT_VERSION: u32 = 1;

/// Everything the store holds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version for future migrations
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub plans: Vec<TaskPlan>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// In-memory store, optionally mirrored to a JSON file.
#[derive(Debug)]
pub struct LocalStore {
    path: Option<PathBuf>,
    data: RwLock<Snapshot>,
}

impl LocalStore {
    /// Create a store that never touches disk.
    pub fn in_memory() -> Self {
        Self { path: None, data: RwLock::new(Snapshot { version: SNAPSHOT_VERSION, ..Default::default() }) }
    }

    /// Open (or start) a store at `path`.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let snapshot = Self::load(&path)?;
        tracing::debug!(
            path = %path.display(),
            branches = snapshot.branches.len(),
            plans = snapshot.plans.len(),
            "Opened data file"
        );
        Ok(Self { path: Some(path), data: RwLock::new(snapshot) })
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Copy of the current data.
    pub fn snapshot(&self) -> Snapshot {
        self.data.read().clone()
    }

    fn load(path: &Path) -> StorageResult<Snapshot> {
        if !path.exists() {
            return Ok(Snapshot { version: SNAPSHOT_VERSION, ..Default::default() });
        }

        let content = fs::read_to_string(path)
            .map_err(|e| StorageError::QueryFailed(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| StorageError::QueryFailed(format!("{}: {e}", path.display())))
    }

    fn save(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(snapshot)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash never leaves a truncated file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read<T>(&self, op: impl FnOnce(&Snapshot) -> T) -> StorageResult<T> {
        Ok(op(&self.data.read()))
    }

    fn write<T>(
        &self,
        on_save_error: impl FnOnce(String) -> StorageError,
        op: impl FnOnce(&mut Snapshot) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut data = self.data.write();
        let backup = self.path.as_ref().map(|_| data.clone());

        let out = op(&mut data)?;

        if let (Some(path), Some(backup)) = (&self.path, backup) {
            if let Err(e) = Self::save(path, &data) {
                *data = backup;
                tracing::error!(path = %path.display(), error = %e, "Failed to write data file");
                return Err(on_save_error(e.to_string()));
            }
        }

        Ok(out)
    }
}

/// Common shape of stored entities.
trait Record: Clone {
    const ENTITY: &'static str;
    fn id(&self) -> Uuid;
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_record {
    ($ty:ty, $name:literal) => {
        impl Record for $ty {
            const ENTITY: &'static str = $name;

            fn id(&self) -> Uuid {
                self.id
            }

            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        }
    };
}

impl_record!(Branch, "branch");
impl_record!(Commit, "commit");
impl_record!(TaskPlan, "task plan");
impl_record!(Tag, "tag");

fn creation_failed<T: Record>(message: String) -> StorageError {
    StorageError::CreationFailed { entity: T::ENTITY, message }
}

fn update_failed<T: Record>(message: String) -> StorageError {
    StorageError::UpdateFailed { entity: T::ENTITY, message }
}

fn deletion_failed<T: Record>(message: String) -> StorageError {
    StorageError::DeletionFailed { entity: T::ENTITY, message }
}

fn insert<T: Record>(items: &mut Vec<T>, item: &T) -> StorageResult<()> {
    if items.iter().any(|e| e.id() == item.id()) {
        return Err(creation_failed::<T>(format!("{} already exists", item.id())));
    }
    items.push(item.clone());
    Ok(())
}

fn replace<T: Record>(items: &mut [T], item: &T) -> StorageResult<()> {
    let slot = items
        .iter_mut()
        .find(|e| e.id() == item.id())
        .ok_or_else(|| update_failed::<T>(format!("{} does not exist", item.id())))?;
    *slot = item.clone();
    Ok(())
}

fn remove<T: Record>(items: &mut Vec<T>, id: Uuid) -> StorageResult<()> {
    let position = items
        .iter()
        .position(|e| e.id() == id)
        .ok_or(StorageError::NotFound { entity: T::ENTITY, id })?;
    items.remove(position);
    Ok(())
}

fn find<T: Record>(items: &[T], id: Uuid) -> Option<T> {
    items.iter().find(|e| e.id() == id).cloned()
}

fn newest_first<'a, T: Record + 'a>(items: impl Iterator<Item = &'a T>) -> Vec<T> {
    let mut items: Vec<T> = items.cloned().collect();
    items.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
    items
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl BranchStore for LocalStore {
    fn create_branch(&self, branch: &Branch) -> StorageResult<()> {
        self.write(creation_failed::<Branch>, |data| {
            if branch.is_master
                && data.branches.iter().any(|b| b.is_master && b.owner_user_id == branch.owner_user_id)
            {
                return Err(creation_failed::<Branch>(format!(
                    "user '{}' already has a master branch",
                    branch.owner_user_id
                )));
            }
            insert(&mut data.branches, branch)
        })
    }

    fn update_branch(&self, branch: &Branch) -> StorageResult<()> {
        self.write(update_failed::<Branch>, |data| {
            let existing = find(&data.branches, branch.id)
                .ok_or_else(|| update_failed::<Branch>(format!("{} does not exist", branch.id)))?;
            if existing.is_master != branch.is_master {
                return Err(update_failed::<Branch>("master flag cannot change".to_string()));
            }
            replace(&mut data.branches, branch)
        })
    }

    fn delete_branch(&self, id: Uuid) -> StorageResult<()> {
        self.write(deletion_failed::<Branch>, |data| remove(&mut data.branches, id))
    }

    fn find_branch(&self, id: Uuid) -> StorageResult<Option<Branch>> {
        self.read(|data| find(&data.branches, id))
    }

    fn all_branches(&self) -> StorageResult<Vec<Branch>> {
        self.read(|data| newest_first(data.branches.iter()))
    }

    fn branches_by_status(&self, status: BranchStatus) -> StorageResult<Vec<Branch>> {
        self.read(|data| newest_first(data.branches.iter().filter(|b| b.status == status)))
    }

    fn branches_for_user(&self, owner: &str) -> StorageResult<Vec<Branch>> {
        self.read(|data| newest_first(data.branches.iter().filter(|b| b.owner_user_id == owner)))
    }

    fn master_branch(&self, owner: &str) -> StorageResult<Option<Branch>> {
        self.read(|data| {
            data.branches.iter().find(|b| b.is_master && b.owner_user_id == owner).cloned()
        })
    }
}

impl CommitStore for LocalStore {
    fn create_commit(&self, commit: &Commit) -> StorageResult<()> {
        self.write(creation_failed::<Commit>, |data| insert(&mut data.commits, commit))
    }

    fn update_commit(&self, commit: &Commit) -> StorageResult<()> {
        self.write(update_failed::<Commit>, |data| replace(&mut data.commits, commit))
    }

    fn delete_commit(&self, id: Uuid) -> StorageResult<()> {
        self.write(deletion_failed::<Commit>, |data| remove(&mut data.commits, id))
    }

    fn find_commit(&self, id: Uuid) -> StorageResult<Option<Commit>> {
        self.read(|data| find(&data.commits, id))
    }

    fn all_commits(&self) -> StorageResult<Vec<Commit>> {
        self.read(|data| newest_first(data.commits.iter()))
    }

    fn commits_for_branch(&self, branch_id: Uuid) -> StorageResult<Vec<Commit>> {
        self.read(|data| newest_first(data.commits.iter().filter(|c| c.branch_id == branch_id)))
    }

    fn commits_by_type(&self, commit_type: CommitType) -> StorageResult<Vec<Commit>> {
        self.read(|data| newest_first(data.commits.iter().filter(|c| c.commit_type == commit_type)))
    }

    fn commits_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> StorageResult<Vec<Commit>> {
        if from > to {
            return Err(StorageError::QueryFailed(format!("empty date range {from} > {to}")));
        }
        self.read(|data| {
            newest_first(data.commits.iter().filter(|c| c.created_at >= from && c.created_at <= to))
        })
    }

    fn search_commits(&self, text: &str) -> StorageResult<Vec<Commit>> {
        self.read(|data| {
            newest_first(data.commits.iter().filter(|c| contains_ignore_case(&c.message, text)))
        })
    }
}

impl TaskPlanStore for LocalStore {
    fn create_plan(&self, plan: &TaskPlan) -> StorageResult<()> {
        self.write(creation_failed::<TaskPlan>, |data| {
            if data.plans.iter().any(|p| p.branch_id == plan.branch_id) {
                return Err(creation_failed::<TaskPlan>(format!(
                    "branch {} already has a task plan",
                    plan.branch_id
                )));
            }
            if !plan.has_dense_order() {
                return Err(creation_failed::<TaskPlan>("task order is not dense".to_string()));
            }
            insert(&mut data.plans, plan)
        })
    }

    fn update_plan(&self, plan: &TaskPlan) -> StorageResult<()> {
        self.write(update_failed::<TaskPlan>, |data| {
            if !plan.has_dense_order() {
                return Err(update_failed::<TaskPlan>("task order is not dense".to_string()));
            }
            let existing = find(&data.plans, plan.id)
                .ok_or_else(|| update_failed::<TaskPlan>(format!("{} does not exist", plan.id)))?;
            if existing.branch_id != plan.branch_id {
                return Err(update_failed::<TaskPlan>(
                    "a plan cannot move to another branch".to_string(),
                ));
            }
            replace(&mut data.plans, plan)
        })
    }

    fn delete_plan(&self, id: Uuid) -> StorageResult<()> {
        self.write(deletion_failed::<TaskPlan>, |data| remove(&mut data.plans, id))
    }

    fn find_plan(&self, id: Uuid) -> StorageResult<Option<TaskPlan>> {
        self.read(|data| find(&data.plans, id))
    }

    fn all_plans(&self) -> StorageResult<Vec<TaskPlan>> {
        self.read(|data| newest_first(data.plans.iter()))
    }

    fn plan_for_branch(&self, branch_id: Uuid) -> StorageResult<Option<TaskPlan>> {
        self.read(|data| data.plans.iter().find(|p| p.branch_id == branch_id).cloned())
    }

    fn plan_containing_task(&self, task_id: Uuid) -> StorageResult<Option<TaskPlan>> {
        self.read(|data| data.plans.iter().find(|p| p.task(task_id).is_some()).cloned())
    }
}

impl TagStore for LocalStore {
    fn create_tag(&self, tag: &Tag) -> StorageResult<()> {
        self.write(creation_failed::<Tag>, |data| insert(&mut data.tags, tag))
    }

    fn update_tag(&self, tag: &Tag) -> StorageResult<()> {
        self.write(update_failed::<Tag>, |data| replace(&mut data.tags, tag))
    }

    fn delete_tag(&self, id: Uuid) -> StorageResult<()> {
        self.write(deletion_failed::<Tag>, |data| remove(&mut data.tags, id))
    }

    fn find_tag(&self, id: Uuid) -> StorageResult<Option<Tag>> {
        self.read(|data| find(&data.tags, id))
    }

    fn all_tags(&self) -> StorageResult<Vec<Tag>> {
        self.read(|data| newest_first(data.tags.iter()))
    }

    fn tags_by_type(&self, tag_type: TagType) -> StorageResult<Vec<Tag>> {
        self.read(|data| newest_first(data.tags.iter().filter(|t| t.tag_type == tag_type)))
    }

    fn important_tags(&self) -> StorageResult<Vec<Tag>> {
        self.read(|data| newest_first(data.tags.iter().filter(|t| t.is_important)))
    }

    fn tags_for_version(&self, version: &str) -> StorageResult<Vec<Tag>> {
        self.read(|data| {
            newest_first(
                data.tags
                    .iter()
                    .filter(|t| t.is_version_associated())
                    .filter(|t| t.associated_version.as_deref() == Some(version)),
            )
        })
    }

    fn search_tags(&self, text: &str) -> StorageResult<Vec<Tag>> {
        self.read(|data| newest_first(data.tags.iter().filter(|t| contains_ignore_case(&t.title, text))))
    }
}
