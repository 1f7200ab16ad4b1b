//! Runs every file group and aggregates one verdict for the run.
//!
//! A failing group never stops the others. With `jobs > 1` groups run
//! concurrently under a semaphore; results are still returned in group
//! order (applications, libraries, then the workspace root).

use crate::classify::Selection;
use crate::models::{RunReport, RunResult};
use crate::plan::Planner;
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

pub struct Executor {
    planner: Planner,
    jobs: usize,
}

impl Executor {
    pub fn new(planner: Planner, jobs: usize) -> Self {
        Self {
            planner,
            jobs: jobs.max(1),
        }
    }

    /// Lint every group in `selection` and build the run report.
    ///
    /// An empty selection succeeds without invoking anything.
    pub async fn run(&self, selection: Selection) -> RunReport {
        let Selection {
            groups,
            excluded,
            missing,
            unlintable,
        } = selection;
        if groups.is_empty() {
            debug!("No lintable files; nothing to do");
            return RunReport {
                results: Vec::new(),
                excluded,
                missing,
                unlintable,
                success: true,
            };
        }

        let work: Vec<_> = groups
            .iter()
            .map(|(project, files)| (project.clone(), files.iter().cloned().collect::<Vec<_>>()))
            .collect();
        debug!(groups = work.len(), jobs = self.jobs, "Dispatching groups");

        let results: Vec<RunResult> = if self.jobs == 1 {
            let mut out = Vec::with_capacity(work.len());
            for (project, files) in &work {
                out.push(self.planner.run_group(project, files).await);
            }
            out
        } else {
            let semaphore = Arc::new(Semaphore::new(self.jobs));
            let futures: Vec<_> = work
                .iter()
                .map(|(project, files)| {
                    let sem = Arc::clone(&semaphore);
                    async move {
                        // The semaphore is never closed, so acquire cannot fail.
                        let _permit = sem.acquire().await.ok();
                        self.planner.run_group(project, files).await
                    }
                })
                .collect();
            join_all(futures).await
        };

        let success = results.iter().all(|r| r.success);
        RunReport {
            results,
            excluded,
            missing,
            unlintable,
            success,
        }
    }
}
