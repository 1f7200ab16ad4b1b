//! Stagelint CLI binary entry point.
//! Resolves config, classifies staged files, and lints each group.

use clap::Parser;
use stagelint::classify::Platform;
use stagelint::cli::Cli;
use stagelint::config::{self, CliOverrides, Effective};
use stagelint::runner::ProcessRunner;
use stagelint::{output, utils, RunEnd, EXIT_CONFIG};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let eff = match config::resolve_effective(&CliOverrides {
        repo_root: cli.repo_root.as_deref(),
        output: cli.output.as_deref(),
        jobs: cli.jobs,
        timeout_secs: cli.timeout_secs,
        exclude: &cli.exclude,
    }) {
        Ok(eff) => eff,
        Err(e) => {
            eprintln!("{} {}", utils::error_prefix(), e);
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    if !eff.config_found {
        debug!(root = %eff.repo_root.display(), "No stagelint.toml found; using defaults");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!(
                "{} {}",
                utils::error_prefix(),
                stagelint::error::Error::Runtime(e)
            );
            return ExitCode::from(EXIT_CONFIG);
        }
    };
    runtime.block_on(run(eff, cli.files))
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("stagelint=debug")
    } else {
        EnvFilter::try_from_env("STAGELINT_LOG").unwrap_or_else(|_| EnvFilter::new("stagelint=warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

async fn run(eff: Effective, files: Vec<String>) -> ExitCode {
    let selection = stagelint::select(&eff, Platform::host(), &files);
    if eff.output != "json" {
        output::print_exclusions(&selection.excluded);
    }
    let runner = Arc::new(ProcessRunner::new(&eff.repo_root, eff.timeout));

    let end = stagelint::until_shutdown(
        stagelint::dispatch(&eff, runner, selection),
        shutdown_signal(),
    )
    .await;
    match &end {
        RunEnd::Finished(report) => output::print_report(report, &eff.output),
        RunEnd::Interrupted(signal) => {
            eprintln!("{} interrupted by {}; aborting lint run", utils::warn_prefix(), signal)
        }
    }
    ExitCode::from(end.exit_code())
}

/// Resolve when the process receives an interrupt or termination signal.
#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => tokio::select! {
            name = ctrl_c() => name,
            _ = term.recv() => "SIGTERM",
        },
        Err(_) => ctrl_c().await,
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    ctrl_c().await
}

async fn ctrl_c() -> &'static str {
    match tokio::signal::ctrl_c().await {
        Ok(()) => "SIGINT",
        // No handler could be installed; never fire.
        Err(_) => std::future::pending().await,
    }
}
