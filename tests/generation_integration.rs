//! Task plan generation integration tests.
//!
//! Drives the generator and manager with scripted AI providers and storage
//! doubles to cover retry, fallback, regeneration and concurrency.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;
use uuid::Uuid;

use lifebranch::ai::{AIError, GeneratedPlan, GeneratedTask, PlanProvider, PlanRequest};
use lifebranch::core::{ErrorClassifier, RetryConfig};
use lifebranch::plan::{PlanError, TaskItemDraft, TaskPlan, TaskPlanGenerator, TaskPlanManager, TimeScope};
use lifebranch::storage::{BranchStore, LocalStore, StorageError, StorageResult, TaskPlanStore};
use lifebranch::version::Branch;

// ============================================================================
// Doubles
// ============================================================================

/// Replays a fixed list of replies, then times out forever.
struct Scripted {
    replies: Mutex<VecDeque<Result<GeneratedPlan, AIError>>>,
    calls: AtomicUsize,
}

impl Scripted {
    fn new(replies: Vec<Result<GeneratedPlan, AIError>>) -> Arc<Self> {
        Arc::new(Self { replies: Mutex::new(replies.into()), calls: AtomicUsize::new(0) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlanProvider for Scripted {
    async fn generate_plan(&self, _request: &PlanRequest) -> Result<GeneratedPlan, AIError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies.lock().pop_front().unwrap_or(Err(AIError::Timeout))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Blocks inside the AI call until released.
struct Gated {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl PlanProvider for Gated {
    async fn generate_plan(&self, _request: &PlanRequest) -> Result<GeneratedPlan, AIError> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(plan_with(&["Only task"]))
    }

    fn name(&self) -> &str {
        "gated"
    }
}

/// Plan store that can be told to fail individual operations.
struct Flaky {
    inner: LocalStore,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
    fail_delete: AtomicBool,
}

impl Flaky {
    fn new(inner: LocalStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            fail_create: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
        })
    }
}

fn disk_full(entity: &'static str) -> StorageError {
    StorageError::UpdateFailed { entity, message: "disk full".to_string() }
}

impl TaskPlanStore for Flaky {
    fn create_plan(&self, plan: &TaskPlan) -> StorageResult<()> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(StorageError::CreationFailed { entity: "task plan", message: "disk full".into() });
        }
        self.inner.create_plan(plan)
    }

    fn update_plan(&self, plan: &TaskPlan) -> StorageResult<()> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(disk_full("task plan"));
        }
        self.inner.update_plan(plan)
    }

    fn delete_plan(&self, id: Uuid) -> StorageResult<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(StorageError::DeletionFailed { entity: "task plan", message: "locked".into() });
        }
        self.inner.delete_plan(id)
    }

    fn find_plan(&self, id: Uuid) -> StorageResult<Option<TaskPlan>> {
        self.inner.find_plan(id)
    }

    fn all_plans(&self) -> StorageResult<Vec<TaskPlan>> {
        self.inner.all_plans()
    }

    fn plan_for_branch(&self, branch_id: Uuid) -> StorageResult<Option<TaskPlan>> {
        self.inner.plan_for_branch(branch_id)
    }

    fn plan_containing_task(&self, task_id: Uuid) -> StorageResult<Option<TaskPlan>> {
        self.inner.plan_containing_task(task_id)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn plan_with(titles: &[&str]) -> GeneratedPlan {
    GeneratedPlan {
        total_duration: Some("3 months".to_string()),
        tasks: titles
            .iter()
            .map(|title| GeneratedTask {
                title: (*title).to_string(),
                description: String::new(),
                time_scope: "weekly".to_string(),
                estimated_duration: 45,
                execution_tips: Some("Keep it small".to_string()),
            })
            .collect(),
    }
}

fn store_with_branch(name: &str) -> (Arc<LocalStore>, Branch) {
    let store = Arc::new(LocalStore::in_memory());
    let branch = Branch::new(name, "Described goal", "alice");
    store.create_branch(&branch).unwrap();
    (store, branch)
}

fn generator(provider: Arc<dyn PlanProvider>, store: &Arc<LocalStore>) -> TaskPlanGenerator {
    TaskPlanGenerator::new(provider, store.clone(), store.clone())
        .with_retry_config(RetryConfig::immediate(3))
}

// ============================================================================
// Retry & Fallback
// ============================================================================

#[tokio::test]
async fn test_always_fatal_returns_fallback_plan() {
    let provider = Scripted::new(vec![
        Err(AIError::InvalidRequest("bad".into())),
        Ok(plan_with(&["never reached"])),
    ]);
    let (store, branch) = store_with_branch("Learn Go");
    let generator = generator(provider.clone(), &store);

    let plan = generator.generate("Learn Go", "Build a CLI", branch.id, None).await.unwrap();

    assert!(!plan.is_ai_generated);
    assert_eq!(plan.len(), 1);
    assert_eq!(plan.tasks[0].estimated_duration, 60);
    assert_eq!(plan.tasks[0].time_scope, TimeScope::Daily);
    assert_eq!(plan.tasks[0].order_index, 0);
    assert_eq!(provider.calls(), 1);
    assert_eq!(store.plan_for_branch(branch.id).unwrap().unwrap(), plan);
}

#[tokio::test]
async fn test_two_retryable_failures_then_success() {
    let provider = Scripted::new(vec![
        Err(AIError::Network("connection reset".into())),
        Err(AIError::RateLimited(Some(1))),
        Ok(plan_with(&["Read the book", "Do the exercises"])),
    ]);
    let (store, branch) = store_with_branch("Learn Go");
    let generator = generator(provider.clone(), &store);
    let mut classifier = ErrorClassifier::new(RetryConfig::immediate(3));

    let plan = generator
        .generate_with(&mut classifier, "Learn Go", "", branch.id, Some("3 months"))
        .await
        .unwrap();

    assert!(plan.is_ai_generated);
    assert_eq!(plan.len(), 2);
    assert!(plan.has_dense_order());
    assert_eq!(classifier.attempts(), 0);
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_budget_is_per_request() {
    let provider = Scripted::new(vec![
        // First branch exhausts its three attempts
        Err(AIError::Timeout),
        Err(AIError::Timeout),
        Err(AIError::Timeout),
        // Second branch still gets a full budget
        Err(AIError::Timeout),
        Err(AIError::Timeout),
        Ok(plan_with(&["Step"])),
    ]);
    let store = Arc::new(LocalStore::in_memory());
    let first = Branch::new("First", "", "alice");
    let second = Branch::new("Second", "", "alice");
    store.create_branch(&first).unwrap();
    store.create_branch(&second).unwrap();
    let generator = generator(provider.clone(), &store);

    let a = generator.generate("First", "", first.id, None).await.unwrap();
    let b = generator.generate("Second", "", second.id, None).await.unwrap();

    assert!(!a.is_ai_generated);
    assert!(b.is_ai_generated);
    assert_eq!(provider.calls(), 6);
}

#[tokio::test]
async fn test_backoff_waits_between_attempts() {
    let provider = Scripted::new(vec![
        Err(AIError::Server { status: 503, message: "busy".into() }),
        Err(AIError::Server { status: 503, message: "busy".into() }),
        Ok(plan_with(&["Step"])),
    ]);
    let (store, branch) = store_with_branch("Goal");
    let generator = TaskPlanGenerator::new(provider, store.clone(), store.clone()).with_retry_config(
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
        },
    );

    let started = tokio::time::Instant::now();
    let plan = generator.generate("Goal", "", branch.id, None).await.unwrap();

    assert!(plan.is_ai_generated);
    assert!(started.elapsed() >= Duration::from_millis(30));
}

#[tokio::test]
async fn test_storage_failure_is_not_absorbed() {
    let (branches, branch) = store_with_branch("Goal");
    let plans = Flaky::new(LocalStore::in_memory());
    plans.fail_create.store(true, Ordering::SeqCst);

    let generator = TaskPlanGenerator::new(
        Scripted::new(vec![Ok(plan_with(&["Step"]))]),
        plans,
        branches,
    );

    let err = generator.generate("Goal", "", branch.id, None).await.unwrap_err();
    assert!(matches!(err, PlanError::Storage(StorageError::CreationFailed { .. })));
    assert!(!generator.is_generating(branch.id));
}

// ============================================================================
// Regeneration
// ============================================================================

#[tokio::test]
async fn test_regenerate_uses_branch_text() {
    struct Recording(Mutex<Vec<PlanRequest>>);

    #[async_trait]
    impl PlanProvider for Recording {
        async fn generate_plan(&self, request: &PlanRequest) -> Result<GeneratedPlan, AIError> {
            self.0.lock().push(request.clone());
            Ok(plan_with(&["Step"]))
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    let recording = Arc::new(Recording(Mutex::new(Vec::new())));
    let (store, branch) = store_with_branch("Write a book");
    let generator = generator(recording.clone(), &store);

    let first = generator.generate("Custom title", "Custom text", branch.id, Some("1 year")).await.unwrap();
    let second = generator.regenerate(&first).await.unwrap();

    assert_ne!(first.id, second.id);
    let requests = recording.0.lock();
    assert_eq!(requests[1].goal_title, "Write a book");
    assert_eq!(requests[1].goal_description, "Described goal");
    assert_eq!(requests[1].timeframe, None);
}

#[tokio::test]
async fn test_regenerate_deletion_failure_is_reported() {
    let (branches, branch) = store_with_branch("Goal");
    let plans = Flaky::new(LocalStore::in_memory());
    let generator = TaskPlanGenerator::new(
        Scripted::new(vec![Ok(plan_with(&["Step"]))]),
        plans.clone(),
        branches,
    )
    .with_retry_config(RetryConfig::immediate(1));

    let existing = generator.generate("Goal", "", branch.id, None).await.unwrap();
    plans.fail_delete.store(true, Ordering::SeqCst);

    let err = generator.regenerate(&existing).await.unwrap_err();
    assert!(matches!(err, PlanError::RegenerationFailed(_)));
    assert!(err.to_string().contains("locked"));
    assert_eq!(plans.plan_for_branch(branch.id).unwrap().unwrap().id, existing.id);
}

#[tokio::test]
async fn test_regenerate_creation_failure_leaves_branch_without_plan() {
    let (branches, branch) = store_with_branch("Goal");
    let plans = Flaky::new(LocalStore::in_memory());
    let generator = TaskPlanGenerator::new(
        Scripted::new(vec![Ok(plan_with(&["Step"]))]),
        plans.clone(),
        branches,
    )
    .with_retry_config(RetryConfig::immediate(1));

    let existing = generator.generate("Goal", "", branch.id, None).await.unwrap();
    plans.fail_create.store(true, Ordering::SeqCst);

    let err = generator.regenerate(&existing).await.unwrap_err();
    assert!(matches!(err, PlanError::RegenerationFailed(_)));
    assert!(plans.plan_for_branch(branch.id).unwrap().is_none());
    assert!(!generator.is_generating(branch.id));
}

#[tokio::test]
async fn test_regenerate_unresolvable_branch() {
    let (store, branch) = store_with_branch("Goal");
    let generator = generator(Scripted::new(vec![]), &store);
    let existing = generator.generate("Goal", "", branch.id, None).await.unwrap();

    store.delete_branch(branch.id).unwrap();
    let err = generator.regenerate(&existing).await.unwrap_err();
    assert!(matches!(err, PlanError::InvalidTaskPlan(_)));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test]
async fn test_concurrent_generation_for_same_branch_is_rejected() {
    let gated = Arc::new(Gated { entered: Notify::new(), release: Notify::new() });
    let (store, branch) = store_with_branch("Goal");
    let other = Branch::new("Other", "", "alice");
    store.create_branch(&other).unwrap();
    let generator = generator(gated.clone(), &store);

    let (first, (second, unrelated)) = tokio::join!(
        generator.generate("Goal", "", branch.id, None),
        async {
            gated.entered.notified().await;
            let second = generator.generate("Goal", "", branch.id, None).await;
            assert!(generator.is_generating(branch.id));
            // An unrelated branch is not blocked; release both calls
            gated.release.notify_one();
            let unrelated = async {
                gated.entered.notified().await;
                gated.release.notify_one();
            };
            let (unrelated, ()) =
                tokio::join!(generator.generate("Other", "", other.id, None), unrelated);
            (second, unrelated)
        }
    );

    assert!(first.unwrap().is_ai_generated);
    assert!(matches!(second, Err(PlanError::GenerationInProgress(id)) if id == branch.id));
    assert!(unrelated.is_ok());
    assert_eq!(store.all_plans().unwrap().len(), 2);
    assert!(!generator.is_generating(branch.id));
}

// ============================================================================
// Manager
// ============================================================================

#[tokio::test]
async fn test_failed_add_keeps_plan_and_surfaces_error() {
    let (branches, branch) = store_with_branch("Goal");
    let plans = Flaky::new(LocalStore::in_memory());
    let manager = TaskPlanManager::new(Scripted::new(vec![Ok(plan_with(&["A", "B"]))]), plans.clone(), branches);

    let mut plan = manager.generate("Goal", "", branch.id, None).await.unwrap();
    plans.fail_update.store(true, Ordering::SeqCst);

    let err = manager
        .add_task_item(&mut plan, TaskItemDraft::new("C", "", TimeScope::Monthly, 10))
        .unwrap_err();
    assert!(matches!(err, PlanError::AddFailed(_)));
    assert_eq!(plan.len(), 2);

    let first_id = plan.tasks[0].id;
    let err = manager.remove_task_item(&mut plan, first_id).unwrap_err();
    assert!(matches!(err, PlanError::Storage(_)));
    assert_eq!(plan.len(), 2);
    assert!(plan.has_dense_order());

    let state = manager.state();
    assert!(!state.is_busy());
    assert!(state.last_error.unwrap().contains("disk full"));

    plans.fail_update.store(false, Ordering::SeqCst);
    manager.clear_error();
    manager.remove_task_item(&mut plan, first_id).unwrap();
    assert_eq!(plan.tasks[0].title, "B");
    assert_eq!(plan.tasks[0].order_index, 0);
}

#[tokio::test]
async fn test_state_changes_are_observable() {
    let (store, branch) = store_with_branch("Goal");
    let manager = TaskPlanManager::new(Scripted::new(vec![Ok(plan_with(&["A"]))]), store.clone(), store);
    let mut rx = manager.subscribe();

    let plan = manager.generate("Goal", "", branch.id, None).await.unwrap();
    rx.changed().await.unwrap();

    let state = rx.borrow_and_update().clone();
    assert!(!state.is_generating);
    assert_eq!(state.current_plan.unwrap().id, plan.id);

    let toggled = manager.toggle_task_completion(plan.tasks[0].id).unwrap();
    let progress = manager.calculate_progress(&toggled);
    assert!(progress.is_completed());
    assert_eq!(progress.remaining_duration(), 0);
}
