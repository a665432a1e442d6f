//! Performance benchmarks for Lifebranch.
//!
//! This module contains benchmarks for:
//! - Progress calculation over large task plans
//! - Commit-type recommendation over long histories
//! - Parsing AI plan responses
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lifebranch::ai::parse_plan_response;
use lifebranch::plan::{calculate_progress, TaskItemDraft, TaskPlan, TimeScope};
use lifebranch::version::{recommend_commit_types, Commit, CommitType};
use uuid::Uuid;

// ============================================================================
// Fixtures
// ============================================================================

mod fixtures {
    use super::*;

    /// A plan with `num_tasks` tasks, every third one completed.
    pub fn plan(num_tasks: usize) -> TaskPlan {
        let scopes = [TimeScope::Daily, TimeScope::Weekly, TimeScope::Monthly];
        let drafts = (0..num_tasks).map(|i| {
            TaskItemDraft::new(
                format!("Task {i}"),
                "Something to do",
                scopes[i % scopes.len()],
                15 + (i % 8) as u32 * 15,
            )
        });

        let mut plan = TaskPlan::new(Uuid::new_v4(), "3 months", true, drafts);
        for task in plan.tasks.iter_mut().step_by(3) {
            task.set_completed(true);
        }
        plan
    }

    /// `len` commits cycling through a skewed mix of types.
    pub fn history(len: usize) -> Vec<Commit> {
        let mix = [
            CommitType::Exercise,
            CommitType::Exercise,
            CommitType::Exercise,
            CommitType::Learning,
            CommitType::Learning,
            CommitType::Journal,
            CommitType::Work,
            CommitType::Travel,
            CommitType::Habit,
        ];
        let branch = Uuid::new_v4();
        (0..len).map(|i| Commit::new(branch, mix[i % mix.len()], "entry")).collect()
    }

    /// A fenced model reply with `num_tasks` tasks.
    pub fn response(num_tasks: usize) -> String {
        let tasks: Vec<String> = (0..num_tasks)
            .map(|i| {
                format!(
                    r#"{{"title": "Task {i}", "description": "Do it", "timeScope": "weekly", "estimatedDuration": 30, "executionTips": "Go"}}"#
                )
            })
            .collect();
        format!(
            "Here is your plan:\n```json\n{{\"totalDuration\": \"2 months\", \"tasks\": [{}]}}\n```",
            tasks.join(",")
        )
    }
}

// ============================================================================
// Progress Benchmarks
// ============================================================================

fn bench_progress(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan/progress");

    for num_tasks in &[10, 100, 1000] {
        let plan = fixtures::plan(*num_tasks);
        group.throughput(Throughput::Elements(*num_tasks as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_tasks), &plan, |b, plan| {
            b.iter(|| calculate_progress(black_box(plan)));
        });
    }

    group.finish();
}

// ============================================================================
// Recommendation Benchmarks
// ============================================================================

fn bench_recommend(c: &mut Criterion) {
    let mut group = c.benchmark_group("version/recommend");

    for len in &[0, 20, 500] {
        let history = fixtures::history(*len);
        group.throughput(Throughput::Elements(*len as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &history, |b, history| {
            b.iter(|| recommend_commit_types(black_box(history)));
        });
    }

    group.finish();
}

// ============================================================================
// Parsing Benchmarks
// ============================================================================

fn bench_response_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("ai/parse_response");

    for num_tasks in &[3, 8, 50] {
        let text = fixtures::response(*num_tasks);
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(num_tasks), &text, |b, text| {
            b.iter(|| parse_plan_response(black_box(text)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_progress, bench_recommend, bench_response_parsing);
criterion_main!(benches);
