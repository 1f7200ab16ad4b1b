//! Stagelint core library.
//!
//! This crate exposes programmatic APIs for turning a list of staged files
//! into per-project lint runs inside a JS/TS monorepo.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `classify`: Staged path filtering and project classification.
//! - `plan`: Per-group strategy planning with batch/per-file retry.
//! - `executor`: Runs all groups and aggregates the verdict.
//! - `runner`: Subprocess capability with timeouts.
//! - `workspace`: Engine/tool command lines and output parsing.
//! - `models`: Data models for groups, plans, and reports.
//! - `output`: Human/JSON printers for run reports.
//! - `utils`: Supporting helpers.
//! - `error`: Configuration error taxonomy.
pub mod classify;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod models;
pub mod output;
pub mod plan;
pub mod runner;
pub mod utils;
pub mod workspace;

use crate::classify::{Classifier, Platform, Selection};
use crate::config::Effective;
use crate::executor::Executor;
use crate::models::RunReport;
use crate::plan::{Planner, ToolState};
use crate::runner::CommandRunner;
use crate::workspace::{Engine, Tool};
use std::future::Future;
use std::sync::Arc;

pub const EXIT_LINT_FAILED: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;
pub const EXIT_INTERRUPTED: u8 = 130;

/// Filter and group staged `files` under the effective settings.
pub fn select(eff: &Effective, platform: Platform, files: &[String]) -> Selection {
    Classifier::from_effective(eff, platform).select(files)
}

/// Lint every group in `selection` with `runner`.
pub async fn dispatch(
    eff: &Effective,
    runner: Arc<dyn CommandRunner>,
    selection: Selection,
) -> RunReport {
    let planner = Planner::new(
        runner,
        Engine::new(eff.engine.clone()),
        Tool::new(eff.tool.clone()),
        ToolState::new(eff.manifest_present()),
    );
    Executor::new(planner, eff.jobs).run(selection).await
}

/// How a lint run ended.
#[derive(Debug)]
pub enum RunEnd {
    Finished(RunReport),
    /// A shutdown signal arrived first; carries the signal name.
    Interrupted(&'static str),
}

impl RunEnd {
    /// Process exit status for this ending.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunEnd::Finished(report) if report.success => 0,
            RunEnd::Finished(_) => EXIT_LINT_FAILED,
            RunEnd::Interrupted(_) => EXIT_INTERRUPTED,
        }
    }
}

/// Drive `run` unless `shutdown` resolves first. An interrupted run is
/// dropped, which kills the child processes it still owns.
pub async fn until_shutdown<R, S>(run: R, shutdown: S) -> RunEnd
where
    R: Future<Output = RunReport>,
    S: Future<Output = &'static str>,
{
    tokio::select! {
        report = run => RunEnd::Finished(report),
        signal = shutdown => RunEnd::Interrupted(signal),
    }
}
