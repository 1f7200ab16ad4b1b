//! Staged file classification.
//!
//! Turns the raw paths handed over by the hook manager into `FileGroups`:
//! - paths missing on disk are dropped silently (deleted or renamed since
//!   staging);
//! - paths with a non-lintable extension are dropped;
//! - paths under an excluded project are dropped with a note;
//! - everything else is assigned to exactly one `ProjectRef`.
//!
//! Path handling never consults the host OS directly. The caller passes a
//! `Platform`, which only decides what counts as an absolute path.

use crate::config::Effective;
use crate::models::{ExcludedFile, FileGroups, ProjectKind, ProjectRef, StagedFile};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    /// Platform of the running process. Call this only at the process boundary.
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A top-level directory whose direct children are projects of `kind`.
pub struct ProjectDir {
    pub kind: ProjectKind,
    pub dir: String,
}

impl ProjectDir {
    pub fn defaults() -> Vec<Self> {
        vec![
            ProjectDir {
                kind: ProjectKind::Application,
                dir: "apps".into(),
            },
            ProjectDir {
                kind: ProjectKind::Library,
                dir: "libs".into(),
            },
        ]
    }
}

/// Unify separators to `/`, drop `.` segments and repeated slashes.
///
/// Both separators are unified on every platform, so `apps\web\a.ts` and
/// `apps/web/a.ts` normalize identically. `..` segments are kept for
/// `resolve_relative` to deal with.
pub fn normalize_path(raw: &str, platform: Platform) -> String {
    let unified = raw.replace('\\', "/");
    let unified = match platform {
        // Verbatim prefix (`\\?\C:\...`) carries no meaning for matching.
        Platform::Windows => unified
            .strip_prefix("//?/")
            .map(str::to_string)
            .unwrap_or(unified),
        Platform::Posix => unified,
    };
    let absolute_root = unified.starts_with('/');
    let segments: Vec<&str> = unified
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect();
    let joined = segments.join("/");
    if absolute_root {
        format!("/{}", joined)
    } else {
        joined
    }
}

/// Whether a normalized path is absolute on `platform`.
pub fn is_absolute(normalized: &str, platform: Platform) -> bool {
    match platform {
        Platform::Posix => normalized.starts_with('/'),
        Platform::Windows => {
            let b = normalized.as_bytes();
            normalized.starts_with('/') || (b.len() >= 2 && b[0].is_ascii_alphabetic() && b[1] == b':')
        }
    }
}

/// Resolve `..` segments lexically. Returns `None` when the path climbs
/// above its starting point.
pub fn resolve_relative(normalized: &str) -> Option<String> {
    let mut out: Vec<&str> = Vec::new();
    for seg in normalized.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                out.pop()?;
            }
            s => out.push(s),
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out.join("/"))
    }
}

/// Map a normalized repository-relative path to its project.
///
/// Project directories are tried in order; the first whose `dir` equals the
/// first segment wins, provided the path continues below the project name.
pub fn classify(normalized: &str, dirs: &[ProjectDir]) -> ProjectRef {
    let mut segs = normalized.split('/');
    let (Some(top), Some(name), Some(_rest)) = (segs.next(), segs.next(), segs.next()) else {
        return ProjectRef::workspace_root();
    };
    for d in dirs {
        if d.dir == top {
            return ProjectRef {
                kind: d.kind,
                name: Some(name.to_string()),
            };
        }
    }
    ProjectRef::workspace_root()
}

/// Result of filtering and grouping one staged file list.
#[derive(Debug, Default)]
pub struct Selection {
    pub groups: FileGroups,
    pub excluded: Vec<ExcludedFile>,
    pub missing: Vec<String>,
    pub unlintable: Vec<String>,
}

enum Decision {
    Accept(StagedFile, ProjectRef),
    Missing(String),
    Unlintable(String),
    Excluded(ExcludedFile),
}

/// Filters and classifies staged paths relative to a repository root.
pub struct Classifier {
    repo_root: PathBuf,
    platform: Platform,
    extensions: BTreeSet<String>,
    exclude: Vec<glob::Pattern>,
    dirs: Vec<ProjectDir>,
}

impl Classifier {
    pub fn new(
        repo_root: &Path,
        platform: Platform,
        extensions: BTreeSet<String>,
        exclude: &[String],
        dirs: Vec<ProjectDir>,
    ) -> Self {
        Self {
            repo_root: repo_root.to_path_buf(),
            platform,
            extensions,
            // Patterns are validated when the config is resolved.
            exclude: exclude
                .iter()
                .filter_map(|p| glob::Pattern::new(p).ok())
                .collect(),
            dirs,
        }
    }

    pub fn from_effective(eff: &Effective, platform: Platform) -> Self {
        Self::new(
            &eff.repo_root,
            platform,
            eff.extensions.clone(),
            &eff.exclude,
            eff.projects.clone(),
        )
    }

    /// Filter and group `raw` paths. Output is deterministic for a given input
    /// and file system state.
    pub fn select(&self, raw: &[String]) -> Selection {
        let decisions: Vec<Decision> = raw.par_iter().map(|r| self.decide(r)).collect();
        let mut sel = Selection::default();
        for d in decisions {
            match d {
                Decision::Accept(file, project) => sel.groups.insert(project, &file),
                Decision::Missing(r) => {
                    debug!(file = %r, "Dropping path not present on disk");
                    sel.missing.push(r);
                }
                Decision::Unlintable(r) => {
                    debug!(file = %r, "Dropping path with non-lintable extension");
                    sel.unlintable.push(r);
                }
                Decision::Excluded(ex) => {
                    if !sel.excluded.iter().any(|e| e.file == ex.file) {
                        sel.excluded.push(ex);
                    }
                }
            }
        }
        sel
    }

    fn decide(&self, raw: &str) -> Decision {
        let Some(normalized) = self.to_repo_relative(raw) else {
            return Decision::Missing(raw.to_string());
        };
        if !self.repo_root.join(&normalized).is_file() {
            return Decision::Missing(raw.to_string());
        }
        if !self.is_lintable(&normalized) {
            return Decision::Unlintable(raw.to_string());
        }
        let project = classify(&normalized, &self.dirs);
        if let Some(name) = project.name.as_deref() {
            if self.exclude.iter().any(|p| p.matches(name)) {
                return Decision::Excluded(ExcludedFile {
                    file: normalized,
                    project: name.to_string(),
                });
            }
        }
        Decision::Accept(
            StagedFile {
                raw: raw.to_string(),
                normalized,
            },
            project,
        )
    }

    /// Normalize `raw` and express it relative to the repository root.
    fn to_repo_relative(&self, raw: &str) -> Option<String> {
        let normalized = normalize_path(raw, self.platform);
        if is_absolute(&normalized, self.platform) {
            let rel = pathdiff::diff_paths(Path::new(raw), &self.repo_root)?;
            let rel = normalize_path(&rel.to_string_lossy(), self.platform);
            return resolve_relative(&rel);
        }
        resolve_relative(&normalized)
    }

    fn is_lintable(&self, normalized: &str) -> bool {
        let file_name = normalized.rsplit('/').next().unwrap_or(normalized);
        match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                self.extensions.contains(&ext.to_ascii_lowercase())
            }
            _ => false,
        }
    }
}
