//! Output rendering for run reports.
//!
//! Supports `human` (default) and `json` outputs. The human form prints one
//! status line per group and, for failed groups, the engine's diagnostics
//! exactly as the engine produced them (minus warning/deprecation noise).

use crate::models::{ExcludedFile, RunReport, RunResult};
use crate::utils;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

/// Print exclusion notes to stderr, one per excluded file.
pub fn print_exclusions(excluded: &[ExcludedFile]) {
    for ex in excluded {
        eprintln!(
            "{} skipping {} (project '{}' is excluded)",
            utils::note_prefix(),
            ex.file,
            ex.project
        );
    }
}

/// Print the run report in the requested format.
pub fn print_report(report: &RunReport, output: &str) {
    match output {
        "json" => match serde_json::to_string_pretty(&compose_report_json(report)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} failed to render report: {}", utils::error_prefix(), e),
        },
        _ => {
            let color = utils::use_colors(output);
            if report.results.is_empty() {
                let line = "No lintable staged files.";
                if color {
                    println!("{}", line.bright_black());
                } else {
                    println!("{}", line);
                }
                return;
            }
            for r in &report.results {
                println!("{}", status_line(r, color));
                if !r.success && !r.diagnostics.is_empty() {
                    println!("{}", r.diagnostics);
                }
            }
            let summary = format!(
                "— Summary — groups={} failed={} files={}",
                report.results.len(),
                report.failed_groups(),
                report.results.iter().map(|r| r.files.len()).sum::<usize>()
            );
            if color {
                println!("{}", summary.bold());
            } else {
                println!("{}", summary);
            }
        }
    }
}

/// One human-readable status line for a group.
pub fn status_line(r: &RunResult, color: bool) -> String {
    let strategy = r.strategy.map(|s| s.as_str()).unwrap_or("none");
    let project = r.project.to_string();
    let count = r.files.len();
    let noun = if count == 1 { "file" } else { "files" };
    if r.success {
        if color {
            format!(
                "{} {} ❲{}❳ — {} {} linted",
                "✔".green(),
                project.bold(),
                strategy,
                count,
                noun
            )
        } else {
            format!("✔ {} ❲{}❳ — {} {} linted", project, strategy, count, noun)
        }
    } else {
        let failed = if r.failed_files.is_empty() {
            String::new()
        } else {
            format!(" ({} failing: {})", r.failed_files.len(), r.failed_files.join(", "))
        };
        if color {
            format!(
                "{} {} ❲{}❳ — lint failed{}",
                "✖".red(),
                project.bold(),
                strategy,
                failed
            )
        } else {
            format!("✖ {} ❲{}❳ — lint failed{}", project, strategy, failed)
        }
    }
}

/// Compose the JSON report (pure) for testing/snapshot purposes.
pub fn compose_report_json(report: &RunReport) -> JsonVal {
    let groups: Vec<_> = report
        .results
        .iter()
        .map(|r| {
            json!({
                "kind": r.project.kind,
                "project": r.project.name,
                "files": r.files,
                "strategy": r.strategy,
                "success": r.success,
                "failedFiles": r.failed_files,
                "diagnostics": if r.success { None } else { Some(&r.diagnostics) },
                "attempts": r.attempts,
            })
        })
        .collect();
    let summary = json!({
        "groups": report.results.len(),
        "failed": report.failed_groups(),
        "excluded": report.excluded.len(),
        "success": report.success,
    });
    let skipped = json!({
        "missing": report.missing,
        "unlintable": report.unlintable,
    });
    json!({
        "groups": groups,
        "excluded": report.excluded,
        "skipped": skipped,
        "summary": summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Attempt, AttemptScope, ProjectRef, Strategy};

    fn sample() -> RunReport {
        RunReport {
            results: vec![
                RunResult {
                    project: ProjectRef::application("web"),
                    files: vec!["apps/web/a.ts".into()],
                    strategy: Some(Strategy::NativeProject),
                    success: true,
                    failed_files: vec![],
                    diagnostics: String::new(),
                    attempts: vec![Attempt {
                        strategy: Strategy::NativeProject,
                        scope: AttemptScope::File,
                        files: vec!["apps/web/a.ts".into()],
                        success: true,
                    }],
                },
                RunResult {
                    project: ProjectRef::workspace_root(),
                    files: vec!["scripts/d.ts".into(), "scripts/e.ts".into()],
                    strategy: Some(Strategy::DirectEngine),
                    success: false,
                    failed_files: vec!["scripts/d.ts".into()],
                    diagnostics: "scripts/d.ts\n  1:1  error  no-var".into(),
                    attempts: vec![],
                },
            ],
            excluded: vec![ExcludedFile {
                file: "libs/ui-kit/c.ts".into(),
                project: "ui-kit".into(),
            }],
            missing: vec!["apps/web/src/deleted.ts".into()],
            unlintable: vec!["README.md".into()],
            success: false,
        }
    }

    #[test]
    fn test_status_lines() {
        let report = sample();
        assert_eq!(
            status_line(&report.results[0], false),
            "✔ application:web ❲native-project-lint❳ — 1 file linted"
        );
        assert_eq!(
            status_line(&report.results[1], false),
            "✖ workspace-root ❲direct-engine❳ — lint failed (1 failing: scripts/d.ts)"
        );
    }

    #[test]
    fn test_compose_report_json_shape() {
        let out = compose_report_json(&sample());
        assert_eq!(out["summary"]["groups"], 2);
        assert_eq!(out["summary"]["failed"], 1);
        assert_eq!(out["summary"]["success"], false);
        assert_eq!(out["groups"][0]["kind"], "application");
        assert_eq!(out["groups"][0]["project"], "web");
        assert_eq!(out["groups"][0]["strategy"], "native-project-lint");
        assert!(out["groups"][0]["diagnostics"].is_null());
        assert_eq!(out["groups"][1]["kind"], "workspace-root");
        assert!(out["groups"][1]["project"].is_null());
        assert_eq!(out["groups"][1]["failedFiles"][0], "scripts/d.ts");
        assert_eq!(out["excluded"][0]["project"], "ui-kit");
        assert_eq!(out["skipped"]["missing"][0], "apps/web/src/deleted.ts");
        assert_eq!(out["skipped"]["unlintable"][0], "README.md");
        assert_eq!(out["groups"][0]["attempts"][0]["scope"], "file");
    }
}
