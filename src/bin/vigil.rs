use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vigil::Vigil;
use vigil_adapter_http::{AppState, serve};

#[derive(Parser)]
#[command(name = "vigil", about = "Status page service", version)]
struct Cli {
    /// Config file; defaults to VIGIL_CONFIG_PATH, ~/.vigil/config.yaml, then vigil-config.yaml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the status API, with the internal check loop when an interval is configured
    Serve,
    /// Run one check pass and print the results
    Check {
        /// Skip subscriber and chat notifications for detected changes
        #[arg(long, default_value_t = false)]
        no_notify: bool,
    },
    /// Delete checks older than the retention window
    Prune,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let vigil = Vigil::load(cli.config)?;
    info!("config loaded from {}", vigil.config_path.display());

    match cli.command {
        Command::Serve => run_server(vigil).await,
        Command::Check { no_notify } => run_check(vigil, no_notify).await,
        Command::Prune => {
            let pruned = vigil.services.monitor.prune(Utc::now()).await?;
            println!("pruned {pruned} checks");
            Ok(())
        }
    }
}

async fn run_server(vigil: Vigil) -> Result<()> {
    let monitor = vigil.services.monitor.clone();
    let interval_secs = vigil.config.checks.interval_secs;
    if interval_secs > 0 {
        let monitor = monitor.clone();
        tokio::spawn(async move {
            monitor
                .run_polling_loop(Duration::from_secs(interval_secs))
                .await;
        });
    } else {
        info!("internal check loop disabled, waiting for /api/cron/check");
    }
    tokio::spawn(async move { monitor.run_retention_loop().await });

    let addr = vigil.config.server.listen_addr.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    serve(listener, AppState::new(vigil.services), shutdown_signal()).await
}

async fn run_check(vigil: Vigil, no_notify: bool) -> Result<()> {
    let monitor = &vigil.services.monitor;
    let report = monitor.run_pass().await?;

    println!("{:<16} {:<24} {:>10} {:>6}", "COMPONENT", "STATUS", "TIME (ms)", "CODE");
    for result in &report.results {
        println!(
            "{:<16} {:<24} {:>10} {:>6}",
            result.component.label(),
            result.status.label(),
            result.response_time,
            result.status_code
        );
    }
    for change in &report.changes {
        println!(
            "changed: {} {} -> {}",
            change.component.label(),
            change.previous_status.label(),
            change.new_status.label()
        );
    }

    if !no_notify && !report.changes.is_empty() {
        let fan_out = monitor.notify(&report.changes).await;
        println!(
            "notified: {} emails sent, {} failed, {} chat posts",
            fan_out.emails_sent, fan_out.emails_failed, fan_out.chats_sent
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
