//! Configuration discovery and effective settings resolution.
//!
//! Stagelint reads `stagelint.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `engine`: `npx eslint`
//! - `tool`: `npx nx`
//! - `manifest`: `nx.json`
//! - `extensions`: `js jsx ts tsx mjs cjs mts cts`
//! - `exclude`: none
//! - `timeoutSecs`: 300
//! - `jobs`: 1
//! - `output`: `human`
//! - `[[projects]]`: `apps` → application, `libs` → library
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::classify::ProjectDir;
use crate::error::{Error, Result};
use crate::models::ProjectKind;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILES: [&str; 3] = ["stagelint.toml", "stagelint.yaml", "stagelint.yml"];
const DEFAULT_EXTENSIONS: [&str; 8] = ["js", "jsx", "ts", "tsx", "mjs", "cjs", "mts", "cts"];
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
/// A command given either as one shell-like line or as an argv array.
pub enum CommandCfg {
    Line(String),
    Args(Vec<String>),
}

impl CommandCfg {
    fn into_argv(self) -> Vec<String> {
        match self {
            CommandCfg::Line(s) => s.split_whitespace().map(str::to_string).collect(),
            CommandCfg::Args(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
/// `[[projects]]` entry: a top-level directory whose children are projects.
pub struct ProjectDirCfg {
    pub kind: String,
    pub dir: String,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `stagelint.toml|yaml`.
pub struct StagelintConfig {
    pub engine: Option<CommandCfg>,
    pub tool: Option<CommandCfg>,
    pub manifest: Option<String>,
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub exclude: Vec<String>,
    #[serde(rename = "timeoutSecs")]
    pub timeout_secs: Option<u64>,
    pub jobs: Option<usize>,
    pub output: Option<String>,
    pub projects: Option<Vec<ProjectDirCfg>>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by the dispatcher after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_found: bool,
    pub engine: Vec<String>,
    pub tool: Vec<String>,
    pub manifest: String,
    pub extensions: BTreeSet<String>,
    pub exclude: Vec<String>,
    pub projects: Vec<ProjectDir>,
    pub timeout: Duration,
    pub jobs: usize,
    pub output: String,
}

impl Effective {
    /// Whether the orchestration tool's manifest exists at the repository root.
    pub fn manifest_present(&self) -> bool {
        self.repo_root.join(&self.manifest).is_file()
    }
}

/// Flags from the command line that override the config file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides<'a> {
    pub repo_root: Option<&'a str>,
    pub output: Option<&'a str>,
    pub jobs: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub exclude: &'a [String],
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `stagelint.toml|yaml|yml` or a `.git` entry is found.
/// `start` should be absolute; a relative path cannot climb past itself.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_FILES.iter().any(|f| cur.join(f).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `StagelintConfig` from `stagelint.toml` or `stagelint.yaml|yml` if present.
pub fn load_config(root: &Path) -> Result<Option<StagelintConfig>> {
    let toml_path = root.join(CONFIG_FILES[0]);
    if toml_path.exists() {
        let s = read(&toml_path)?;
        let cfg = toml::from_str(&s).map_err(|source| Error::ParseToml {
            path: toml_path.clone(),
            source,
        })?;
        return Ok(Some(cfg));
    }
    for yml in &CONFIG_FILES[1..] {
        let p = root.join(yml);
        if p.exists() {
            let s = read(&p)?;
            let cfg = serde_yaml::from_str(&s).map_err(|source| Error::ParseYaml {
                path: p.clone(),
                source,
            })?;
            return Ok(Some(cfg));
        }
    }
    Ok(None)
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::ReadConfig {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliOverrides<'_>) -> Result<Effective> {
    let start = absolute_start(cli.repo_root)?;
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root)?;
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();

    let engine = cfg
        .engine
        .map(CommandCfg::into_argv)
        .unwrap_or_else(|| vec!["npx".into(), "eslint".into()]);
    if engine.is_empty() {
        return Err(invalid("engine", "command must not be empty"));
    }
    let tool = cfg
        .tool
        .map(CommandCfg::into_argv)
        .unwrap_or_else(|| vec!["npx".into(), "nx".into()]);
    if tool.is_empty() {
        return Err(invalid("tool", "command must not be empty"));
    }

    let manifest = cfg.manifest.unwrap_or_else(|| "nx.json".to_string());

    let extensions: BTreeSet<String> = match cfg.extensions {
        Some(list) => list
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect(),
        None => DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
    };
    if extensions.is_empty() {
        return Err(invalid("extensions", "at least one extension is required"));
    }

    // Exclusions from the CLI add to the config list.
    let mut exclude = cfg.exclude;
    exclude.extend(cli.exclude.iter().cloned());
    for pat in &exclude {
        if glob::Pattern::new(pat).is_err() {
            return Err(invalid("exclude", &format!("bad pattern '{}'", pat)));
        }
    }

    let projects = match cfg.projects {
        Some(list) => list
            .into_iter()
            .map(|p| {
                let kind = match p.kind.as_str() {
                    "application" | "app" => ProjectKind::Application,
                    "library" | "lib" => ProjectKind::Library,
                    other => {
                        return Err(invalid(
                            "projects.kind",
                            &format!("expected application|library, got '{}'", other),
                        ))
                    }
                };
                let dir = p.dir.trim_matches('/').to_string();
                if dir.is_empty() || dir.contains('/') {
                    return Err(invalid(
                        "projects.dir",
                        &format!("expected a single top-level directory, got '{}'", p.dir),
                    ));
                }
                Ok(ProjectDir { kind, dir })
            })
            .collect::<Result<Vec<_>>>()?,
        None => ProjectDir::defaults(),
    };

    let timeout_secs = cli
        .timeout_secs
        .or(cfg.timeout_secs)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(invalid("timeoutSecs", "must be greater than zero"));
    }

    let jobs = cli.jobs.or(cfg.jobs).unwrap_or(1);
    if jobs == 0 {
        return Err(invalid("jobs", "must be at least 1"));
    }

    let output = cli
        .output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());
    if output != "human" && output != "json" {
        return Err(invalid("output", &format!("expected human|json, got '{}'", output)));
    }

    Ok(Effective {
        repo_root,
        config_found,
        engine,
        tool,
        manifest,
        extensions,
        exclude,
        projects,
        timeout: Duration::from_secs(timeout_secs),
        jobs,
        output,
    })
}

/// Anchor the search start at the working directory.
fn absolute_start(repo_root: Option<&str>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().map_err(Error::CurrentDir)?;
    Ok(match repo_root {
        Some(p) => cwd.join(p),
        None => cwd,
    })
}

fn invalid(key: &str, message: &str) -> Error {
    Error::InvalidSetting {
        key: key.to_string(),
        message: message.to_string(),
    }
}
