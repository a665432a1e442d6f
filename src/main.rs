//! Lifebranch - version your life goals like a git repository.
//!
//! Command line front end over the library: branches, commits, tags and
//! task plans stored in a local JSON file.

#![allow(clippy::single_match_else)]

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

use lifebranch::ai::{provider_from_config, OfflineProvider, PlanProvider};
use lifebranch::core::Config;
use lifebranch::plan::{
    calculate_progress, PlanError, TaskItemDraft, TaskPlan, TaskPlanManager, TimeScope,
};
use lifebranch::storage::{BranchStore, CommitStore, LocalStore, TagStore, TaskPlanStore};
use lifebranch::version::{
    category_breakdown, ensure_master_branch, recommend_commit_types, transition_branch, Branch,
    BranchStatus, Commit, CommitType, Tag, TagType,
};

/// Version your life goals like a git repository
#[derive(Parser)]
#[command(name = "lifebranch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Data file to use instead of the configured one
    #[arg(long, global = true, env = "LIFEBRANCH_DATA")]
    data: Option<PathBuf>,

    /// User id owning new branches and tags
    #[arg(long, global = true, env = "LIFEBRANCH_USER")]
    user: Option<String>,

    /// Never call an AI provider; plans use the starter template
    #[arg(long, global = true)]
    offline: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage branches (goals)
    Branch {
        #[command(subcommand)]
        operation: BranchOperation,
    },

    /// Record and inspect commits (progress entries)
    Commit {
        #[command(subcommand)]
        operation: CommitOperation,
    },

    /// Mark milestones with tags
    Tag {
        #[command(subcommand)]
        operation: TagOperation,
    },

    /// Generate and edit task plans
    Plan {
        #[command(subcommand)]
        operation: PlanOperation,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum BranchOperation {
    /// List branches, newest first
    List {
        /// Only branches with this status (active, completed, abandoned)
        #[arg(short, long)]
        status: Option<BranchStatus>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Start a new goal
    Create {
        /// Goal name
        name: String,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Show a branch with its commits and plan progress
    Show {
        /// Branch id, id prefix or name
        branch: String,
    },

    /// Mark a branch as completed
    Complete {
        /// Branch id, id prefix or name
        branch: String,
    },

    /// Give up on a branch
    Abandon {
        /// Branch id, id prefix or name
        branch: String,
    },
}

#[derive(Subcommand)]
enum CommitOperation {
    /// Record progress on a branch
    Add {
        /// Branch id, id prefix or name
        branch: String,

        /// Commit type (e.g. learning, habit, taskComplete)
        commit_type: CommitType,

        /// What happened
        message: String,
    },

    /// Show commits, newest first
    Log {
        /// Only commits on this branch
        branch: Option<String>,

        /// Only commits of this type
        #[arg(short = 't', long = "type")]
        commit_type: Option<CommitType>,

        /// Only commits whose message contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Maximum number of commits
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Suggest commit types based on recent history
    Recommend {
        /// Number of recent commits to consider
        #[arg(short = 'n', long, default_value = "50")]
        recent: usize,
    },
}

#[derive(Subcommand)]
enum TagOperation {
    /// Create a tag
    Add {
        /// Tag title
        title: String,

        /// Tag type (milestone, birthday, career, relationship, education, achievement)
        #[arg(short = 't', long = "type", default_value = "milestone")]
        tag_type: TagType,

        /// Longer description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Version or branch this tag belongs to
        #[arg(long = "for", id = "for_version")]
        version: Option<String>,

        /// Mark as important
        #[arg(short, long)]
        important: bool,
    },

    /// List tags, newest first
    List {
        /// Only important tags
        #[arg(short, long)]
        important: bool,

        /// Only tags for this version
        #[arg(long = "for", id = "for_version")]
        version: Option<String>,
    },
}

#[derive(Subcommand)]
enum PlanOperation {
    /// Generate the task plan for a branch
    Generate {
        /// Branch id, id prefix or name
        branch: String,

        /// Desired timeframe, e.g. "3 months"
        #[arg(short, long)]
        timeframe: Option<String>,
    },

    /// Throw away the branch's plan and generate a new one
    Regenerate {
        /// Branch id, id prefix or name
        branch: String,
    },

    /// Show the plan and its progress
    Show {
        /// Branch id, id prefix or name
        branch: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Append a task
    Add {
        /// Branch id, id prefix or name
        branch: String,

        /// Task title
        title: String,

        /// What to do
        #[arg(short, long, default_value = "")]
        description: String,

        /// How often (daily, weekly, monthly)
        #[arg(short, long, default_value = "daily")]
        scope: String,

        /// Estimated minutes
        #[arg(short, long, default_value = "30")]
        minutes: u32,

        /// Practical hints
        #[arg(long)]
        tips: Option<String>,
    },

    /// Remove a task
    Remove {
        /// Branch id, id prefix or name
        branch: String,

        /// Task id or id prefix
        task: String,
    },

    /// Put tasks in a new order
    Reorder {
        /// Branch id, id prefix or name
        branch: String,

        /// Every task id (or prefix), in the desired order
        #[arg(required = true)]
        tasks: Vec<String>,
    },

    /// Mark a task done, or not done
    Toggle {
        /// Branch id, id prefix or name
        branch: String,

        /// Task id or id prefix
        task: String,
    },

    /// Change the plan's overall duration
    Duration {
        /// Branch id, id prefix or name
        branch: String,

        /// New duration, e.g. "6 weeks"
        duration: String,
    },
}

/// Everything a command needs.
struct Context {
    config: Config,
    store: Arc<LocalStore>,
    user: String,
    offline: bool,
}

impl Context {
    fn open(cli: &Cli) -> Result<Self> {
        let config = Config::load()?;
        let path = match &cli.data {
            Some(path) => path.clone(),
            None => config.data_file()?,
        };

        let store = Arc::new(
            LocalStore::open(&path)
                .with_context(|| format!("Could not open data file {}", path.display()))?,
        );
        let user = cli.user.clone().unwrap_or_else(|| config.general.user.clone());

        ensure_master_branch(&*store, &user)?;

        Ok(Self { config, store, user, offline: cli.offline })
    }

    fn provider(&self) -> Arc<dyn PlanProvider> {
        if self.offline {
            return Arc::new(OfflineProvider::new("--offline"));
        }
        provider_from_config(&self.config.ai)
    }

    fn manager(&self) -> TaskPlanManager {
        TaskPlanManager::new(self.provider(), self.store.clone(), self.store.clone())
            .with_retry_config(self.config.retry.to_retry_config())
    }

    /// Resolve a branch by full id, unique id prefix, or exact name.
    fn branch(&self, reference: &str) -> Result<Branch> {
        if let Ok(id) = Uuid::parse_str(reference) {
            return self
                .store
                .find_branch(id)?
                .ok_or_else(|| anyhow::anyhow!("No branch with id {id}"));
        }

        let branches = self.store.all_branches()?;
        if let Some(branch) = branches.iter().find(|b| b.name == reference) {
            return Ok(branch.clone());
        }

        let needle = reference.to_lowercase();
        let mut matches = branches.into_iter().filter(|b| b.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(branch), None) => Ok(branch),
            (Some(_), Some(_)) => anyhow::bail!("Branch reference '{reference}' is ambiguous"),
            (None, _) => anyhow::bail!("No branch matches '{reference}'"),
        }
    }

    fn plan(&self, branch: &Branch) -> Result<TaskPlan> {
        self.store
            .plan_for_branch(branch.id)?
            .ok_or(PlanError::PlanNotFound(branch.id))
            .with_context(|| {
                format!(
                    "Branch '{}' has no task plan yet. Run: lifebranch plan generate {}",
                    branch.name,
                    short_id(branch.id)
                )
            })
    }
}

fn main() -> Result<()> {
    // Pick up API keys from a local .env
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry().with(fmt::layer().with_target(false)).with(filter).init();

    match &cli.command {
        Commands::Config { path } => cmd_config(*path),
        Commands::Completions { shell } => {
            cmd_completions(*shell);
            Ok(())
        }
        Commands::Branch { operation } => cmd_branch(&Context::open(&cli)?, operation),
        Commands::Commit { operation } => cmd_commit(&Context::open(&cli)?, operation),
        Commands::Tag { operation } => cmd_tag(&Context::open(&cli)?, operation),
        Commands::Plan { operation } => cmd_plan(&Context::open(&cli)?, operation),
    }
}

/// First 8 characters of an id, enough to refer to it on the command line.
fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Handle branch commands.
fn cmd_branch(ctx: &Context, operation: &BranchOperation) -> Result<()> {
    match operation {
        BranchOperation::List { status, format } => {
            let branches = match status {
                Some(status) => ctx.store.branches_by_status(*status)?,
                None => ctx.store.branches_for_user(&ctx.user)?,
            };

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&branches)?);
                return Ok(());
            }

            for branch in &branches {
                let marker = if branch.is_master { "*" } else { " " };
                println!(
                    "{marker} {} {:<10} {}",
                    short_id(branch.id),
                    branch.status.to_string(),
                    branch.name
                );
            }
            println!("\nTotal: {} branches", branches.len());
        }

        BranchOperation::Create { name, description } => {
            let name = name.trim();
            if name.is_empty() {
                anyhow::bail!("Branch name cannot be empty");
            }

            let branch = Branch::new(name, description.trim(), ctx.user.as_str());
            ctx.store.create_branch(&branch)?;
            println!("Created branch {} '{}'", short_id(branch.id), branch.name);
        }

        BranchOperation::Show { branch } => {
            let branch = ctx.branch(branch)?;
            println!("{} {}", short_id(branch.id), branch.name);
            println!("Status:  {}", branch.status);
            println!("Created: {}", branch.created_at.format("%Y-%m-%d"));
            if !branch.description.is_empty() {
                println!("\n{}", branch.description);
            }

            let commits = ctx.store.commits_for_branch(branch.id)?;
            println!("\nCommits: {}", commits.len());
            for (category, count) in category_breakdown(&commits) {
                println!("  {:<14} {count}", category.display_name());
            }

            if let Some(plan) = ctx.store.plan_for_branch(branch.id)? {
                let progress = calculate_progress(&plan);
                println!(
                    "\nPlan: {}/{} tasks done ({}%)",
                    progress.completed_tasks,
                    progress.total_tasks,
                    progress.percent()
                );
            }
        }

        BranchOperation::Complete { branch } => {
            let branch = ctx.branch(branch)?;
            let branch = transition_branch(&*ctx.store, branch.id, BranchStatus::Completed)?;
            println!("Completed '{}'", branch.name);
        }

        BranchOperation::Abandon { branch } => {
            let branch = ctx.branch(branch)?;
            let branch = transition_branch(&*ctx.store, branch.id, BranchStatus::Abandoned)?;
            println!("Abandoned '{}'", branch.name);
        }
    }

    Ok(())
}

/// Handle commit commands.
fn cmd_commit(ctx: &Context, operation: &CommitOperation) -> Result<()> {
    match operation {
        CommitOperation::Add { branch, commit_type, message } => {
            let branch = ctx.branch(branch)?;
            if !branch.is_active() {
                tracing::warn!(branch = %branch.id, status = %branch.status, "Committing to a closed branch");
            }

            let commit = Commit::new(branch.id, *commit_type, message.trim());
            ctx.store.create_commit(&commit)?;

            let info = commit.commit_type.info();
            println!("{} [{}] {} {}", info.emoji, short_id(commit.id), info.display_name, commit.message);
        }

        CommitOperation::Log { branch, commit_type, search, limit } => {
            let mut commits = match (branch, search) {
                (Some(branch), _) => ctx.store.commits_for_branch(ctx.branch(branch)?.id)?,
                (None, Some(text)) => ctx.store.search_commits(text)?,
                (None, None) => ctx.store.all_commits()?,
            };

            if let Some(commit_type) = commit_type {
                commits.retain(|c| c.commit_type == *commit_type);
            }
            if let (Some(_), Some(text)) = (branch, search) {
                let text = text.to_lowercase();
                commits.retain(|c| c.message.to_lowercase().contains(&text));
            }
            commits.truncate(*limit);

            for commit in &commits {
                let info = commit.commit_type.info();
                println!(
                    "{} {} {} {:<14} {}",
                    short_id(commit.id),
                    commit.created_at.format("%Y-%m-%d"),
                    info.emoji,
                    info.display_name,
                    commit.message
                );
            }
            if commits.is_empty() {
                println!("No commits");
            }
        }

        CommitOperation::Recommend { recent } => {
            let commits = ctx.store.recent_commits(*recent)?;
            for commit_type in recommend_commit_types(&commits) {
                let info = commit_type.info();
                println!("{} {:<14} {}", info.emoji, commit_type.as_str(), info.description);
            }
        }
    }

    Ok(())
}

/// Handle tag commands.
fn cmd_tag(ctx: &Context, operation: &TagOperation) -> Result<()> {
    match operation {
        TagOperation::Add { title, tag_type, description, version, important } => {
            let mut tag = Tag::new(title.trim(), description.trim(), *tag_type, ctx.user.as_str());
            if *important {
                tag = tag.important();
            }
            if let Some(version) = version {
                tag.associate_version(version.as_str());
            }

            ctx.store.create_tag(&tag)?;
            println!("Created tag {} '{}'", short_id(tag.id), tag.title);
        }

        TagOperation::List { important, version } => {
            let mut tags = match version {
                Some(version) => ctx.store.tags_for_version(version)?,
                None => ctx.store.all_tags()?,
            };
            if *important {
                tags.retain(|t| t.is_important);
            }

            for tag in &tags {
                let star = if tag.is_important { "!" } else { " " };
                let version = tag.associated_version.as_deref().unwrap_or("-");
                println!("{star} {} {:<12} {:<10} {}", short_id(tag.id), tag.tag_type.to_string(), version, tag.title);
            }
            println!("\nTotal: {} tags", tags.len());
        }
    }

    Ok(())
}

/// Resolve a task by full id or unique id prefix.
fn task_id(plan: &TaskPlan, reference: &str) -> Result<Uuid> {
    let needle = reference.to_lowercase();
    let mut matches = plan.tasks.iter().filter(|t| t.id.to_string().starts_with(&needle));
    match (matches.next(), matches.next()) {
        (Some(task), None) => Ok(task.id),
        (Some(_), Some(_)) => anyhow::bail!("Task reference '{reference}' is ambiguous"),
        (None, _) => anyhow::bail!("No task matches '{reference}'"),
    }
}

fn print_plan(plan: &TaskPlan) {
    let progress = calculate_progress(plan);
    let origin = if plan.is_ai_generated { "AI generated" } else { "starter plan" };

    println!("Duration: {} ({origin})", plan.total_duration);
    println!(
        "Progress: {}/{} tasks ({}%), {}/{} min\n",
        progress.completed_tasks,
        progress.total_tasks,
        progress.percent(),
        progress.completed_duration,
        progress.total_estimated_duration
    );

    for task in &plan.tasks {
        let check = if task.is_completed { "x" } else { " " };
        println!(
            "  [{check}] {}. {} {} ({}, {} min)",
            task.order_index + 1,
            short_id(task.id),
            task.title,
            task.time_scope,
            task.estimated_duration
        );
        if !task.description.is_empty() {
            println!("         {}", task.description);
        }
        if let Some(tips) = &task.execution_tips {
            println!("         tip: {tips}");
        }
    }
}

/// Handle plan commands.
fn cmd_plan(ctx: &Context, operation: &PlanOperation) -> Result<()> {
    let manager = ctx.manager();

    match operation {
        PlanOperation::Generate { branch, timeframe } => {
            let branch = ctx.branch(branch)?;
            println!("Generating plan for '{}' with {}...\n", branch.name, manager.generator().provider_name());

            // Create tokio runtime for async operations
            let rt = tokio::runtime::Runtime::new()?;
            let plan = rt.block_on(manager.generate(
                &branch.name,
                &branch.description,
                branch.id,
                timeframe.as_deref(),
            ))?;
            print_plan(&plan);
        }

        PlanOperation::Regenerate { branch } => {
            let branch = ctx.branch(branch)?;
            let existing = ctx.plan(&branch)?;
            println!("Regenerating plan for '{}'...\n", branch.name);

            let rt = tokio::runtime::Runtime::new()?;
            let plan = rt.block_on(manager.regenerate(&existing))?;
            print_plan(&plan);
        }

        PlanOperation::Show { branch, format } => {
            let branch = ctx.branch(branch)?;
            let plan = manager
                .require_task_plan(branch.id)
                .with_context(|| format!("Branch '{}' has no task plan yet", branch.name))?;

            if format == "json" {
                let json = serde_json::json!({
                    "plan": plan,
                    "progress": manager.calculate_progress(&plan),
                });
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                println!("{}\n", branch.name);
                print_plan(&plan);
            }
        }

        PlanOperation::Add { branch, title, description, scope, minutes, tips } => {
            let mut plan = ctx.plan(&ctx.branch(branch)?)?;
            let scope: TimeScope = scope.parse()?;

            let mut draft = TaskItemDraft::new(title.trim(), description.trim(), scope, *minutes);
            if let Some(tips) = tips {
                draft = draft.with_tips(tips.as_str());
            }

            let task = manager.add_task_item(&mut plan, draft)?;
            println!("Added task {} at position {}", short_id(task.id), task.order_index + 1);
        }

        PlanOperation::Remove { branch, task } => {
            let mut plan = ctx.plan(&ctx.branch(branch)?)?;
            let id = task_id(&plan, task)?;
            let removed = manager.remove_task_item(&mut plan, id)?;
            println!("Removed '{}'", removed.title);
        }

        PlanOperation::Reorder { branch, tasks } => {
            let mut plan = ctx.plan(&ctx.branch(branch)?)?;
            let ordered = tasks
                .iter()
                .map(|reference| {
                    let id = task_id(&plan, reference)?;
                    plan.task(id).cloned().ok_or_else(|| anyhow::anyhow!("No task {id}"))
                })
                .collect::<Result<Vec<_>>>()?;

            manager.reorder_task_items(&mut plan, ordered)?;
            print_plan(&plan);
        }

        PlanOperation::Toggle { branch, task } => {
            let plan = ctx.plan(&ctx.branch(branch)?)?;
            let id = task_id(&plan, task)?;
            let plan = manager.toggle_task_completion(id)?;

            if let Some(task) = plan.task(id) {
                let state = if task.is_completed { "done" } else { "not done" };
                println!("'{}' is {state}", task.title);
            }
        }

        PlanOperation::Duration { branch, duration } => {
            let mut plan = ctx.plan(&ctx.branch(branch)?)?;
            manager.update_task_plan(&mut plan, duration)?;
            println!("Plan duration set to {}", plan.total_duration);
        }
    }

    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "lifebranch", &mut io::stdout());
}

/// Show configuration.
fn cmd_config(show_path: bool) -> Result<()> {
    if show_path {
        if let Some(path) = Config::config_dir() {
            println!("{}", path.join("config.toml").display());
        }
        return Ok(());
    }

    let config = Config::load()?;
    let toml = toml::to_string_pretty(&config)?;
    println!("{toml}");

    Ok(())
}
