#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]

//! # Lifebranch
//!
//! Version your life goals like a git repository.
//!
//! Goals are **branches**, progress is recorded as typed **commits**, and
//! milestones are marked with **tags**. Each branch can carry a **task plan**:
//! an ordered list of tasks, generated by an AI provider when one is
//! configured and by a simple starter template otherwise.
//!
//! ## Features
//!
//! - **Branch lifecycle**: active branches end as completed or abandoned, never reopened
//! - **Commit taxonomy**: 21 commit types grouped into 9 categories
//! - **Recommendations**: suggests the commit types you use most
//! - **AI task plans**: Claude or Ollama, with retry, backoff and fallback
//! - **Local storage**: everything in one JSON file
//!
//! ## Quick Start
//!
//! ```bash
//! lifebranch branch create "Run a marathon" --description "Sub 4 hours"
//! lifebranch plan generate <branch-id> --timeframe "6 months"
//! lifebranch commit add <branch-id> exercise "First 10k"
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::ref_option)]

pub mod ai;
pub mod core;
pub mod plan;
pub mod storage;
pub mod version;

pub use ai::{AIError, GeneratedPlan, OfflineProvider, PlanProvider, PlanRequest};
#[cfg(feature = "ai")]
pub use ai::{ClaudeProvider, OllamaProvider};
pub use core::{Config, ErrorClassifier, ErrorKind, RetryConfig};
pub use plan::{
    calculate_progress, ManagerState, PlanError, TaskItem, TaskItemDraft, TaskItemStore, TaskPlan,
    TaskPlanGenerator, TaskPlanManager, TaskPlanProgress, TimeScope,
};
pub use storage::{
    BranchStore, CommitStore, LocalStore, StorageError, TagStore, TaskPlanStore,
};
pub use version::{
    recommend_commit_types, Branch, BranchStatus, Commit, CommitCategory, CommitType, Tag, TagType,
    VersionError,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "lifebranch";
