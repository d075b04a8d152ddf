//! Repository downloader worker
//!
//! # Usage
//! ```bash
//! repo-downloader --job-url http://jobs:8080/api   # Serve /download and poll for jobs
//! repo-downloader stats /path/to/repository --diff # Print commit statistics as JSON lines
//! ```

use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repo_downloader::config::{Cli, Commands, Config, StatsArgs};
use repo_downloader::git::{self, HistoryWalker, WalkOptions};
use repo_downloader::jobs::{JobCoordinator, JobProcessor, JobSourceClient, Scheduler};
use repo_downloader::routes;

fn print_stats(config: &Config, args: StatsArgs) -> anyhow::Result<()> {
    let options = WalkOptions {
        date_from: args.from,
        date_to: args.to,
        checkout_each_revision: args.checkout,
        diff_detail: args.diff || config.commits_diff,
    };

    let Some(walker) = HistoryWalker::open(&args.repo_path) else {
        return Ok(());
    };

    let written = git::write_json_lines(walker.commits(options)?, std::io::stdout().lock())?;
    tracing::debug!(count = written, "Printed commit statistics");

    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    std::fs::create_dir_all(&config.repository_dir)?;

    if config.max_parallel_clones > 1 || config.max_parallel_repo_processors > 1 {
        tracing::warn!(
            max_parallel_clones = config.max_parallel_clones,
            max_parallel_repo_processors = config.max_parallel_repo_processors,
            "Parallel settings are ignored, jobs run one at a time"
        );
    }

    let coordinator = Arc::new(JobCoordinator::new());
    let processor = Arc::new(JobProcessor::new(
        coordinator,
        config.repository_dir.clone(),
        config.storage_limit,
    ));

    let scheduler = match &config.job_url {
        Some(url) => {
            tracing::info!(url = %url, job_type = config.job_type, pod = %config.pod_name, "Polling job source");
            let scheduler = Scheduler::new(
                Arc::clone(&processor),
                JobSourceClient::new(url.clone()),
                config.job_type,
                config.pod_name.clone(),
                config.poll_interval(),
            );
            Some(scheduler.spawn())
        }
        None => {
            tracing::info!("No job source configured, serving triggers only");
            None
        }
    };

    let app = routes::create_router(processor).layer(TraceLayer::new_for_http());

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        repository_dir = %config.repository_dir.display(),
        "Repository downloader started"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
        tracing::info!("Shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so `stats` output stays machine-readable
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Stats(args)) => print_stats(&cli.config, args),
        None => serve(cli.config).await,
    }
}
