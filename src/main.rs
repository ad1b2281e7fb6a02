// ABOUTME: Entry point for the molt daemon.
// ABOUTME: Parses arguments, loads config, and drives per-endpoint schedulers.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use molt::config::{self, Config};
use molt::error::{Error, Result};
use molt::report::{LogSink, ReportEvent, ReportSink};
use molt::runtime::BollardRuntime;
use molt::scheduler;
use molt::update::{Orchestrator, UpdateError};
use std::env;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let result = run(cli).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            config::init_config(&cwd, force)
        }
        Commands::Run { once } => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            let config = Config::discover(&cwd)?;

            if once {
                run_once(config).await
            } else {
                watch_endpoints(config).await
            }
        }
        Commands::Status => {
            let cwd = env::current_dir().expect("Failed to get current directory");
            let config = Config::discover(&cwd)?;
            status(config).await
        }
    }
}

/// One pass per endpoint, then exit. The exit status reflects the passes:
/// an aborted pass or any failed replacement is an error.
async fn run_once(config: Config) -> Result<()> {
    let host = config.host();
    let sink = LogSink;
    let mut failures = 0usize;
    let mut aborted = 0usize;

    for endpoint in &config.endpoints {
        let runtime = BollardRuntime::connect(&endpoint.address)
            .map_err(|e| Error::Daemon(e.to_string()))?;

        let mut orchestrator = Orchestrator::new(config.pass_settings());
        let batch = orchestrator.run_pass(&runtime, &endpoint.address).await;

        if batch.has_updates() {
            let event =
                ReportEvent::update_completed(&host, &endpoint.address, &orchestrator, &batch);
            sink.send(&event).await;
        }

        println!(
            "{}: monitored {}, updated {}, failed {}",
            endpoint.address,
            batch.monitored,
            batch.updated.len(),
            batch.failed.len()
        );

        if batch.aborted {
            aborted += 1;
        }
        failures += batch.failed.len();
        for failed in batch.failed {
            let error = UpdateError::from(failed);
            eprintln!("  {error}");
        }
    }

    if aborted > 0 {
        return Err(Error::Daemon(format!("{aborted} endpoint(s) unreachable")));
    }
    if failures > 0 {
        return Err(Error::Daemon(format!(
            "{failures} container(s) failed to update"
        )));
    }

    Ok(())
}

/// Recurring passes against every configured endpoint until ctrl-c.
async fn watch_endpoints(config: Config) -> Result<()> {
    let host = config.host();
    let sink = Arc::new(LogSink);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    sink.send(&ReportEvent::Startup {
        host: host.clone(),
        endpoints: config
            .endpoints
            .iter()
            .map(|e| e.address.clone())
            .collect(),
        next_run: Some(chrono::Utc::now()),
    })
    .await;

    let mut tasks = Vec::new();
    for endpoint in &config.endpoints {
        let address = endpoint.address.clone();
        let host = host.clone();
        let sink = Arc::clone(&sink);
        let settings = config.pass_settings();
        let interval = config.interval;
        let shutdown = shutdown_rx.clone();

        tasks.push(tokio::spawn(async move {
            let runtime = match BollardRuntime::connect(&address) {
                Ok(runtime) => runtime,
                Err(error) => {
                    tracing::error!(endpoint = %address, %error, "invalid endpoint address");
                    return;
                }
            };

            let mut orchestrator = Orchestrator::new(settings);
            scheduler::run_endpoint(
                &runtime,
                sink.as_ref(),
                &mut orchestrator,
                &address,
                &host,
                interval,
                shutdown,
            )
            .await;
        }));
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| Error::Daemon(format!("failed to listen for shutdown signal: {e}")))?;
    tracing::info!("shutdown requested, finishing in-flight passes");
    let _ = shutdown_tx.send(true);

    for task in tasks {
        let _ = task.await;
    }

    Ok(())
}

/// Detection-only pass per endpoint: report stale containers, touch nothing.
///
/// The command is one-shot and carries no history, so the cumulative
/// `total_updated` counter in its events is always zero. Cumulative counts
/// belong to the long-running `run` schedule.
async fn status(config: Config) -> Result<()> {
    let host = config.host();
    let sink = LogSink;

    for endpoint in &config.endpoints {
        let runtime = BollardRuntime::connect(&endpoint.address)
            .map_err(|e| Error::Daemon(e.to_string()))?;

        let orchestrator = Orchestrator::new(config.pass_settings());
        let (monitored, stale) = orchestrator
            .detect_pass(&runtime, &endpoint.address)
            .await
            .map_err(|e| Error::Daemon(e.to_string()))?;

        println!("{}: {} monitored, {} stale", endpoint.address, monitored, stale.len());
        for container in &stale {
            println!(
                "  {} {} -> {}",
                container.name,
                container.current.short(),
                container.latest.short()
            );
        }

        if !stale.is_empty() {
            let event = ReportEvent::monitor_detected(
                &host,
                &endpoint.address,
                monitored,
                orchestrator.total_updated(&endpoint.address),
                &stale,
            );
            sink.send(&event).await;
        }
    }

    Ok(())
}
