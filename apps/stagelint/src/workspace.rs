//! Command lines for the lint engine and the orchestration tool.
//!
//! Also owns the reading of tool output: the `show project` JSON and the
//! stderr noise filter applied before diagnostics reach the user.

use crate::models::project::ProjectDetails;
use crate::runner::CommandSpec;
use regex::Regex;
use std::sync::OnceLock;

/// Lint engine invocation, e.g. `npx eslint`.
#[derive(Debug, Clone)]
pub struct Engine {
    argv: Vec<String>,
}

impl Engine {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    /// `<engine> --fix <file...>`
    pub fn fix_files(&self, files: &[String]) -> CommandSpec {
        let mut extra = vec!["--fix".to_string()];
        extra.extend(files.iter().cloned());
        CommandSpec::from_argv(&self.argv, extra)
    }

    /// `<engine> --fix .`, the workspace-wide fallback when the tool is unusable.
    pub fn fix_everything(&self) -> CommandSpec {
        CommandSpec::from_argv(&self.argv, ["--fix", "."])
    }
}

/// Monorepo orchestration tool invocation, e.g. `npx nx`.
#[derive(Debug, Clone)]
pub struct Tool {
    argv: Vec<String>,
}

impl Tool {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    /// `<tool> show project <name> --json`
    pub fn show_project(&self, name: &str) -> CommandSpec {
        CommandSpec::from_argv(&self.argv, ["show", "project", name, "--json"])
    }

    /// `<tool> lint <name> --fix --files=<a,b,...>`
    pub fn lint_project(&self, name: &str, files: &[String]) -> CommandSpec {
        CommandSpec::from_argv(
            &self.argv,
            [
                "lint".to_string(),
                name.to_string(),
                "--fix".to_string(),
                format!("--files={}", files.join(",")),
            ],
        )
    }

    /// `<tool> run-many --target=lint --all --fix`
    pub fn lint_all(&self) -> CommandSpec {
        CommandSpec::from_argv(&self.argv, ["run-many", "--target=lint", "--all", "--fix"])
    }
}

/// Parse `show project --json` output.
///
/// Package-manager wrappers sometimes print banners before the JSON, so
/// parsing starts at the first `{`.
pub fn parse_project_details(stdout: &str) -> Option<ProjectDetails> {
    let start = stdout.find('{')?;
    serde_json::from_str(stdout[start..].trim_end()).ok()
}

fn noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)warning|deprecated").expect("noise pattern is valid"))
}

/// Drop stderr lines that mention warnings or deprecations.
pub fn filter_stderr(stderr: &str) -> String {
    stderr
        .lines()
        .filter(|l| !noise_re().is_match(l))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compose user-facing diagnostics from a failed invocation.
///
/// Stdout (engine violation report) passes through unmodified.
pub fn diagnostics(stdout: &str, stderr: &str) -> String {
    let mut out = stdout.trim_end().to_string();
    let err = filter_stderr(stderr);
    let err = err.trim();
    if !err.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(err);
    }
    out
}
