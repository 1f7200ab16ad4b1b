//! Shared data models for classification, planning, and run reports.

pub mod project;

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
/// Kind of monorepo unit a staged file belongs to.
///
/// Variant order is the dispatch order: applications, then libraries, then
/// the workspace root.
pub enum ProjectKind {
    Application,
    Library,
    WorkspaceRoot,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Application => "application",
            ProjectKind::Library => "library",
            ProjectKind::WorkspaceRoot => "workspace-root",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
/// Identifies a monorepo unit. `name` is `None` only for the workspace root.
pub struct ProjectRef {
    pub kind: ProjectKind,
    pub name: Option<String>,
}

impl ProjectRef {
    pub fn application(name: &str) -> Self {
        Self {
            kind: ProjectKind::Application,
            name: Some(name.to_string()),
        }
    }

    pub fn library(name: &str) -> Self {
        Self {
            kind: ProjectKind::Library,
            name: Some(name.to_string()),
        }
    }

    pub fn workspace_root() -> Self {
        Self {
            kind: ProjectKind::WorkspaceRoot,
            name: None,
        }
    }

    pub fn is_workspace_root(&self) -> bool {
        self.kind == ProjectKind::WorkspaceRoot
    }
}

impl fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}:{}", self.kind.as_str(), name),
            None => f.write_str(self.kind.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
/// A staged path that survived filtering.
pub struct StagedFile {
    /// Path exactly as supplied on the command line.
    pub raw: String,
    /// Repository-relative path with `/` separators.
    pub normalized: String,
}

/// Per-project partition of staged files.
///
/// Keyed by `ProjectRef`, so iteration yields project groups first and the
/// workspace-root group last. Members are keyed by normalized path, so the
/// same file staged twice collapses to one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileGroups {
    groups: BTreeMap<ProjectRef, BTreeSet<String>>,
}

impl FileGroups {
    pub fn insert(&mut self, project: ProjectRef, file: &StagedFile) {
        self.groups
            .entry(project)
            .or_default()
            .insert(file.normalized.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn get(&self, project: &ProjectRef) -> Option<&BTreeSet<String>> {
        self.groups.get(project)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProjectRef, &BTreeSet<String>)> {
        self.groups.iter()
    }

    /// Total number of files across all groups.
    pub fn file_count(&self) -> usize {
        self.groups.values().map(|s| s.len()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
/// A way of linting one group.
pub enum Strategy {
    /// The orchestration tool's own per-project lint target.
    #[serde(rename = "native-project-lint")]
    NativeProject,
    /// The lint engine invoked directly on the group's files.
    DirectEngine,
    /// Lint the whole workspace in place with no file scoping.
    WorkspaceWide,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::NativeProject => "native-project-lint",
            Strategy::DirectEngine => "direct-engine",
            Strategy::WorkspaceWide => "workspace-wide",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Ordered strategies to try for one group. Never empty.
pub struct LintPlan {
    pub strategies: Vec<Strategy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptScope {
    Batch,
    File,
    Workspace,
}

#[derive(Debug, Clone, Serialize)]
/// One invocation made while executing a plan.
pub struct Attempt {
    pub strategy: Strategy,
    pub scope: AttemptScope,
    /// Files passed to the command; empty for workspace-wide runs.
    pub files: Vec<String>,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
/// Outcome of one group after running its plan.
pub struct RunResult {
    pub project: ProjectRef,
    pub files: Vec<String>,
    /// Strategy that produced the verdict; `None` when every strategy was
    /// skipped before running.
    pub strategy: Option<Strategy>,
    pub success: bool,
    /// Files that still failed after per-file retry of the last strategy.
    pub failed_files: Vec<String>,
    /// Engine/tool output for the failing invocations, noise removed.
    pub diagnostics: String,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Clone, Serialize)]
/// A file removed from the run by the exclusion list.
pub struct ExcludedFile {
    pub file: String,
    pub project: String,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Everything one invocation produced.
pub struct RunReport {
    pub results: Vec<RunResult>,
    pub excluded: Vec<ExcludedFile>,
    /// Staged paths absent from disk or outside the repository.
    pub missing: Vec<String>,
    /// Staged paths without a lintable extension.
    pub unlintable: Vec<String>,
    pub success: bool,
}

impl RunReport {
    pub fn failed_groups(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}
