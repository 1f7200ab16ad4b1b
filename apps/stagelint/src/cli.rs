//! CLI argument parsing via `clap`.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "stagelint",
    version,
    about = "Lint staged files per monorepo project",
    long_about = "Stagelint — maps staged files to the monorepo projects they belong to and lints each project with auto-fix, falling back from the orchestration tool's lint target to the lint engine to a workspace-wide run.\n\nConfiguration precedence: CLI > stagelint.toml > defaults.",
    after_help = "Examples:\n  stagelint apps/web/src/main.ts libs/shared/src/index.ts\n  stagelint --output json $(git diff --cached --name-only)\n  stagelint --exclude ui-kit --jobs 4 -- apps/web/src/a.ts"
)]
/// Top-level CLI options. Staged file paths are positional.
pub struct Cli {
    #[arg(help = "Staged file paths, relative to the repository root or absolute")]
    pub files: Vec<String>,
    #[arg(long, help = "Repository root (default: detected from current dir)")]
    pub repo_root: Option<String>,
    #[arg(long, help = "Output mode: human|json (default: human)")]
    pub output: Option<String>,
    #[arg(long, help = "Groups linted concurrently (default: 1)")]
    pub jobs: Option<usize>,
    #[arg(long = "timeout", value_name = "SECS", help = "Per-command timeout in seconds (default: 300)")]
    pub timeout_secs: Option<u64>,
    #[arg(long, value_name = "PROJECT", help = "Exclude a project by name or glob (repeatable)")]
    pub exclude: Vec<String>,
    #[arg(short, long, action = clap::ArgAction::SetTrue, help = "Enable debug logging")]
    pub verbose: bool,
}
