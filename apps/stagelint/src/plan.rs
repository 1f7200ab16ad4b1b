//! Dispatch planning and strategy execution for one file group.
//!
//! A group's `LintPlan` is an ordered strategy list. `first_success` walks it
//! and stops at the first strategy that lints clean. Within a strategy, a
//! failing multi-file batch is retried file by file before moving on, which
//! separates real per-file violations from batch-wide failures.

use crate::models::{Attempt, AttemptScope, LintPlan, ProjectRef, RunResult, Strategy};
use crate::runner::{CommandRunner, CommandSpec, ExecError};
use crate::workspace::{self, Engine, Tool};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Strategies applicable to `project`, in the order they are tried.
///
/// Workspace-root files never use the native project lint. Direct engine
/// invocation comes before the workspace-wide run for every group.
pub fn plan_for(project: &ProjectRef, tool_usable: bool) -> LintPlan {
    let mut strategies = Vec::with_capacity(3);
    if tool_usable && !project.is_workspace_root() {
        strategies.push(Strategy::NativeProject);
    }
    strategies.push(Strategy::DirectEngine);
    strategies.push(Strategy::WorkspaceWide);
    LintPlan { strategies }
}

/// Result of running one strategy to completion.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub success: bool,
    pub failed_files: Vec<String>,
    pub diagnostics: String,
    pub attempts: Vec<Attempt>,
}

/// Attempt `items` in order until one succeeds.
///
/// `attempt` returns `None` when an item does not apply and is skipped.
/// Returns every outcome produced, ending with the first success or with the
/// last failure when nothing succeeded.
pub async fn first_success<T, F, Fut>(items: &[T], mut attempt: F) -> Vec<(T, Outcome)>
where
    T: Copy,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Option<Outcome>>,
{
    let mut tried = Vec::new();
    for &item in items {
        let Some(outcome) = attempt(item).await else {
            continue;
        };
        let done = outcome.success;
        tried.push((item, outcome));
        if done {
            break;
        }
    }
    tried
}

/// Run-scoped knowledge about the orchestration tool.
///
/// Shared by all groups of a run; starts usable only when the workspace
/// manifest exists and flips off the first time the tool cannot be spawned.
/// Also guards the working tree: file-scoped runs share it, a workspace-wide
/// run holds it alone.
#[derive(Debug)]
pub struct ToolState {
    usable: AtomicBool,
    lint_targets: Mutex<HashMap<String, bool>>,
    tree: RwLock<()>,
}

impl ToolState {
    pub fn new(manifest_present: bool) -> Self {
        Self {
            usable: AtomicBool::new(manifest_present),
            lint_targets: Mutex::new(HashMap::new()),
            tree: RwLock::new(()),
        }
    }

    pub fn usable(&self) -> bool {
        self.usable.load(Ordering::Acquire)
    }

    fn mark_unusable(&self) {
        if self.usable.swap(false, Ordering::AcqRel) {
            warn!("Orchestration tool unavailable; falling back to the lint engine");
        }
    }

    fn cached(&self, name: &str) -> Option<bool> {
        self.lint_targets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(name)
            .copied()
    }

    fn remember(&self, name: &str, has_lint: bool) {
        self.lint_targets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), has_lint);
    }
}

struct Invocation {
    success: bool,
    not_found: bool,
    diagnostics: String,
}

/// Executes lint plans against the engine and the orchestration tool.
pub struct Planner {
    runner: Arc<dyn CommandRunner>,
    engine: Engine,
    tool: Tool,
    state: ToolState,
}

impl Planner {
    pub fn new(runner: Arc<dyn CommandRunner>, engine: Engine, tool: Tool, state: ToolState) -> Self {
        Self {
            runner,
            engine,
            tool,
            state,
        }
    }

    pub fn tool_state(&self) -> &ToolState {
        &self.state
    }

    /// Run the plan for one group to completion.
    pub async fn run_group(&self, project: &ProjectRef, files: &[String]) -> RunResult {
        let plan = plan_for(project, self.state.usable());
        debug!(project = %project, files = files.len(), plan = ?plan.strategies, "Planned group");

        let tried = first_success(&plan.strategies, move |s| self.run_strategy(s, project, files)).await;

        let attempts: Vec<Attempt> = tried
            .iter()
            .flat_map(|(_, o)| o.attempts.iter().cloned())
            .collect();
        // A failed workspace-wide run names no files; keep the latest
        // per-file attribution from an earlier strategy instead.
        let attributed = tried
            .iter()
            .rev()
            .skip(1)
            .find(|(_, o)| !o.failed_files.is_empty())
            .map(|(_, o)| (o.failed_files.clone(), o.diagnostics.clone()));
        match tried.into_iter().last() {
            Some((strategy, mut outcome)) => {
                info!(project = %project, strategy = strategy.as_str(), success = outcome.success, "Group finished");
                if !outcome.success && outcome.failed_files.is_empty() {
                    if let Some((failed, earlier)) = attributed {
                        outcome.failed_files = failed;
                        outcome.diagnostics = join_notes(earlier, outcome.diagnostics);
                    }
                }
                RunResult {
                    project: project.clone(),
                    files: files.to_vec(),
                    strategy: Some(strategy),
                    success: outcome.success,
                    failed_files: outcome.failed_files,
                    diagnostics: outcome.diagnostics,
                    attempts,
                }
            }
            None => RunResult {
                project: project.clone(),
                files: files.to_vec(),
                strategy: None,
                success: false,
                failed_files: files.to_vec(),
                diagnostics: "no applicable lint strategy".to_string(),
                attempts,
            },
        }
    }

    async fn run_strategy(
        &self,
        strategy: Strategy,
        project: &ProjectRef,
        files: &[String],
    ) -> Option<Outcome> {
        match strategy {
            Strategy::NativeProject => {
                let name = project.name.as_deref()?;
                if !self.state.usable() || !self.has_lint_target(name).await {
                    debug!(project = %project, "Skipping native project lint");
                    return None;
                }
                let tool = &self.tool;
                Some(
                    self.run_with_retry(strategy, files, true, |batch| tool.lint_project(name, batch))
                        .await,
                )
            }
            Strategy::DirectEngine => {
                let engine = &self.engine;
                Some(
                    self.run_with_retry(strategy, files, false, |batch| engine.fix_files(batch))
                        .await,
                )
            }
            Strategy::WorkspaceWide => Some(self.run_workspace_wide().await),
        }
    }

    /// Ask the tool whether `name` has a `lint` target. Answers are cached
    /// for the run.
    async fn has_lint_target(&self, name: &str) -> bool {
        if let Some(known) = self.state.cached(name) {
            return known;
        }
        let has_lint = match self.runner.run(&self.tool.show_project(name)).await {
            Ok(out) if out.success => workspace::parse_project_details(&out.stdout)
                .map(|d| d.has_lint_target())
                .unwrap_or(false),
            Ok(_) => false,
            Err(ExecError::NotFound { .. }) => {
                self.state.mark_unusable();
                return false;
            }
            Err(e) => {
                warn!(project = %name, error = %e, "Project query failed");
                false
            }
        };
        debug!(project = %name, has_lint, "Queried lint target");
        self.state.remember(name, has_lint);
        has_lint
    }

    /// Run `build(files)` as one batch; on failure of a multi-file batch
    /// rerun it once per file with the same strategy.
    async fn run_with_retry<B>(
        &self,
        strategy: Strategy,
        files: &[String],
        uses_tool: bool,
        build: B,
    ) -> Outcome
    where
        B: Fn(&[String]) -> CommandSpec,
    {
        let mut outcome = Outcome::default();
        let scope = if files.len() > 1 {
            AttemptScope::Batch
        } else {
            AttemptScope::File
        };
        let batch = self.invoke_scoped(&build(files)).await;
        outcome.attempts.push(Attempt {
            strategy,
            scope,
            files: files.to_vec(),
            success: batch.success,
        });
        if batch.success {
            outcome.success = true;
            return outcome;
        }
        if batch.not_found {
            if uses_tool {
                self.state.mark_unusable();
            }
            outcome.failed_files = files.to_vec();
            outcome.diagnostics = batch.diagnostics;
            return outcome;
        }
        if files.len() <= 1 {
            outcome.failed_files = files.to_vec();
            outcome.diagnostics = batch.diagnostics;
            return outcome;
        }

        debug!(strategy = strategy.as_str(), files = files.len(), "Batch failed; retrying per file");
        let mut notes = Vec::new();
        for file in files {
            let single = std::slice::from_ref(file);
            let run = self.invoke_scoped(&build(single)).await;
            outcome.attempts.push(Attempt {
                strategy,
                scope: AttemptScope::File,
                files: single.to_vec(),
                success: run.success,
            });
            if !run.success {
                outcome.failed_files.push(file.clone());
                if !run.diagnostics.is_empty() {
                    notes.push(run.diagnostics);
                }
            }
        }
        outcome.success = outcome.failed_files.is_empty();
        outcome.diagnostics = notes.join("\n");
        outcome
    }

    async fn run_workspace_wide(&self) -> Outcome {
        let _whole_tree = self.state.tree.write().await;
        let mut outcome = Outcome::default();
        let mut run = if self.state.usable() {
            let r = self.invoke(&self.tool.lint_all()).await;
            outcome.attempts.push(workspace_attempt(r.success));
            if r.not_found {
                self.state.mark_unusable();
            }
            Some(r)
        } else {
            None
        };
        if run.as_ref().map_or(true, |r| r.not_found) {
            let r = self.invoke(&self.engine.fix_everything()).await;
            outcome.attempts.push(workspace_attempt(r.success));
            run = Some(r);
        }
        if let Some(r) = run {
            outcome.success = r.success;
            outcome.diagnostics = r.diagnostics;
        }
        outcome
    }

    async fn invoke_scoped(&self, cmd: &CommandSpec) -> Invocation {
        let _files = self.state.tree.read().await;
        self.invoke(cmd).await
    }

    async fn invoke(&self, cmd: &CommandSpec) -> Invocation {
        match self.runner.run(cmd).await {
            Ok(out) if out.success => Invocation {
                success: true,
                not_found: false,
                diagnostics: String::new(),
            },
            Ok(out) => Invocation {
                success: false,
                not_found: false,
                diagnostics: workspace::diagnostics(&out.stdout, &out.stderr),
            },
            Err(e) => {
                warn!(cmd = %cmd, error = %e, "Command did not complete");
                Invocation {
                    success: false,
                    not_found: matches!(e, ExecError::NotFound { .. }),
                    diagnostics: e.to_string(),
                }
            }
        }
    }
}

fn join_notes(first: String, second: String) -> String {
    match (first.is_empty(), second.is_empty()) {
        (_, true) => first,
        (true, false) => second,
        (false, false) => format!("{}\n{}", first, second),
    }
}

fn workspace_attempt(success: bool) -> Attempt {
    Attempt {
        strategy: Strategy::WorkspaceWide,
        scope: AttemptScope::Workspace,
        files: Vec::new(),
        success,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::runner::CommandOutput;

    fn argv(s: &str) -> Vec<String> {
        s.split_whitespace().map(str::to_string).collect()
    }

    fn planner(runner: Arc<FakeRunner>, manifest_present: bool) -> Planner {
        Planner::new(
            runner,
            Engine::new(argv("eslint")),
            Tool::new(argv("nx")),
            ToolState::new(manifest_present),
        )
    }

    fn files(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_plan_shapes() {
        let web = ProjectRef::application("web");
        assert_eq!(
            plan_for(&web, true).strategies,
            vec![
                Strategy::NativeProject,
                Strategy::DirectEngine,
                Strategy::WorkspaceWide
            ]
        );
        assert_eq!(
            plan_for(&web, false).strategies,
            vec![Strategy::DirectEngine, Strategy::WorkspaceWide]
        );
        assert_eq!(
            plan_for(&ProjectRef::workspace_root(), true).strategies,
            vec![Strategy::DirectEngine, Strategy::WorkspaceWide]
        );
    }

    #[tokio::test]
    async fn test_first_success_stops_and_skips() {
        let tried = first_success(&[1, 2, 3, 4], |n| async move {
            match n {
                1 => None,
                2 => Some(Outcome::default()),
                3 => Some(Outcome {
                    success: true,
                    ..Default::default()
                }),
                _ => panic!("must stop after first success"),
            }
        })
        .await;
        let ids: Vec<i32> = tried.iter().map(|(n, _)| *n).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_native_lint_used_when_target_exists() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            if has_arg(c, "show") {
                lint_target_json()
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), true);
        let res = p
            .run_group(&ProjectRef::application("web"), &files(&["apps/web/a.ts"]))
            .await;
        assert!(res.success);
        assert_eq!(res.strategy, Some(Strategy::NativeProject));
        assert_eq!(
            runner.calls(),
            vec![
                "nx show project web --json",
                "nx lint web --fix --files=apps/web/a.ts"
            ]
        );
    }

    #[tokio::test]
    async fn test_no_lint_target_never_invokes_native_lint() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            if has_arg(c, "show") {
                no_lint_target_json()
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), true);
        let res = p
            .run_group(
                &ProjectRef::library("shared"),
                &files(&["libs/shared/a.ts", "libs/shared/b.ts"]),
            )
            .await;
        assert!(res.success);
        assert_eq!(res.strategy, Some(Strategy::DirectEngine));
        assert!(runner.calls_matching("nx lint").is_empty());
        assert_eq!(
            runner.calls_matching("eslint"),
            vec!["eslint --fix libs/shared/a.ts libs/shared/b.ts"]
        );
    }

    #[tokio::test]
    async fn test_batch_failure_retries_each_file_once() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            // Batch (more than one file after --fix) fails; single files pass.
            if c.program == "eslint" && c.args.len() > 2 {
                Some(Ok(CommandOutput::failed("", "batch blew up")))
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), false);
        let group = files(&["scripts/a.ts", "scripts/b.ts", "scripts/c.ts"]);
        let res = p.run_group(&ProjectRef::workspace_root(), &group).await;

        let engine_calls = runner.calls_matching("eslint");
        assert_eq!(engine_calls.len(), 4);
        assert_eq!(
            &engine_calls[1..],
            &[
                "eslint --fix scripts/a.ts",
                "eslint --fix scripts/b.ts",
                "eslint --fix scripts/c.ts"
            ]
        );
        assert!(res.success);
        assert_eq!(res.strategy, Some(Strategy::DirectEngine));
        assert_eq!(res.attempts.len(), 4);
    }

    #[tokio::test]
    async fn test_per_file_failures_accumulate_then_fall_to_workspace_wide() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            if c.program == "eslint" && has_arg(c, "scripts/bad.ts") {
                Some(Ok(CommandOutput::failed(
                    "scripts/bad.ts\n  1:1  error  Unexpected var  no-var",
                    "DeprecationWarning: x",
                )))
            } else if c.program == "eslint" && has_arg(c, ".") {
                Some(Ok(CommandOutput::failed("still bad", "")))
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), false);
        let res = p
            .run_group(
                &ProjectRef::workspace_root(),
                &files(&["scripts/bad.ts", "scripts/good.ts"]),
            )
            .await;
        assert!(!res.success);
        assert_eq!(res.strategy, Some(Strategy::WorkspaceWide));
        assert_eq!(
            runner.calls(),
            vec![
                "eslint --fix scripts/bad.ts scripts/good.ts",
                "eslint --fix scripts/bad.ts",
                "eslint --fix scripts/good.ts",
                "eslint --fix ."
            ]
        );
        assert_eq!(res.failed_files, vec!["scripts/bad.ts"]);
        assert!(res.diagnostics.contains("1:1  error  Unexpected var  no-var"));
        assert!(res.diagnostics.ends_with("still bad"));
        assert!(!res.diagnostics.contains("DeprecationWarning"));
        // Direct-engine attempts are kept alongside the final verdict.
        assert!(res
            .attempts
            .iter()
            .any(|a| a.strategy == Strategy::DirectEngine && !a.success));
    }

    #[tokio::test]
    async fn test_native_failure_retries_per_file_then_direct() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            if has_arg(c, "show") {
                lint_target_json()
            } else if c.program == "nx" && has_arg(c, "lint") {
                Some(Ok(CommandOutput::failed("", "nx lint failed")))
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), true);
        let res = p
            .run_group(
                &ProjectRef::application("web"),
                &files(&["apps/web/a.ts", "apps/web/b.ts"]),
            )
            .await;
        assert!(res.success);
        assert_eq!(res.strategy, Some(Strategy::DirectEngine));
        assert_eq!(
            runner.calls(),
            vec![
                "nx show project web --json",
                "nx lint web --fix --files=apps/web/a.ts,apps/web/b.ts",
                "nx lint web --fix --files=apps/web/a.ts",
                "nx lint web --fix --files=apps/web/b.ts",
                "eslint --fix apps/web/a.ts apps/web/b.ts",
            ]
        );
    }

    #[tokio::test]
    async fn test_tool_not_found_short_circuits_to_engine() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            if c.program == "nx" {
                Some(Err(ExecError::NotFound {
                    program: "nx".into(),
                }))
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), true);
        let res = p
            .run_group(&ProjectRef::application("web"), &files(&["apps/web/a.ts"]))
            .await;
        assert!(res.success);
        assert_eq!(res.strategy, Some(Strategy::DirectEngine));
        assert!(!p.tool_state().usable());

        // Later groups no longer consult the tool.
        let res = p
            .run_group(&ProjectRef::application("admin"), &files(&["apps/admin/a.ts"]))
            .await;
        assert!(res.success);
        assert_eq!(runner.calls_matching("nx").len(), 1);
    }

    #[tokio::test]
    async fn test_lint_target_queries_are_cached() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            if has_arg(c, "show") {
                lint_target_json()
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), true);
        let web = ProjectRef::application("web");
        p.run_group(&web, &files(&["apps/web/a.ts"])).await;
        p.run_group(&web, &files(&["apps/web/b.ts"])).await;
        assert_eq!(runner.calls_matching("show project").len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_strategy_failure() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            if c.program == "eslint" && has_arg(c, "apps/web/slow.ts") {
                Some(Err(ExecError::Timeout {
                    program: "eslint".into(),
                    secs: 300,
                }))
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), false);
        let res = p
            .run_group(&ProjectRef::application("web"), &files(&["apps/web/slow.ts"]))
            .await;
        // Single file: no split retry, falls to workspace-wide which passes.
        assert!(res.success);
        assert_eq!(res.strategy, Some(Strategy::WorkspaceWide));
        assert_eq!(
            runner.calls(),
            vec!["eslint --fix apps/web/slow.ts", "eslint --fix ."]
        );
    }

    #[tokio::test]
    async fn test_workspace_wide_uses_tool_when_usable() {
        let runner = Arc::new(FakeRunner::default().on(|c| {
            if c.program == "eslint" && !has_arg(c, ".") {
                Some(Ok(CommandOutput::failed("x", "")))
            } else {
                None
            }
        }));
        let p = planner(runner.clone(), true);
        let res = p
            .run_group(&ProjectRef::workspace_root(), &files(&["tools/a.ts"]))
            .await;
        assert!(res.success);
        assert_eq!(res.strategy, Some(Strategy::WorkspaceWide));
        assert_eq!(
            runner.calls_matching("nx"),
            vec!["nx run-many --target=lint --all --fix"]
        );
    }
}
