//! Deadliner - deadline reminder daemon
//!
//! CLI entry point for launching and managing the reminder service.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, warn};

use deadliner::cli::{get_log_path, Cli, Command, OutputFormat};
use deadliner::config::Config;
use deadliner::daemon::DaemonManager;
use deadliner::delivery::PushDelivery;
use deadliner::policy;
use deadliner::presenter;
use deadliner::repository::{StoreRepository, TaskRepository};
use deadliner::scheduler::ReminderScheduler;
use deadlinestore::DeadlineStore;

fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("deadliner")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Write to log file, not stdout/stderr
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let log_file = fs::File::create(log_dir.join("deadliner.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "Deadliner loaded config: timezone={}, db={}",
        config.timezone,
        config.storage.resolve_db_path().display()
    );

    match cli.command {
        Some(Command::Start { foreground }) => cmd_start(&config, foreground).await,
        Some(Command::Stop) => cmd_stop().await,
        Some(Command::Status { format }) => cmd_status(format).await,
        Some(Command::Tick) => cmd_tick(&config).await,
        Some(Command::Logs { follow, lines }) => cmd_logs(follow, lines).await,
        Some(Command::RunDaemon) => cmd_run_daemon(&config).await,
        None => {
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
            Ok(())
        }
    }
}

/// Start the daemon
async fn cmd_start(config: &Config, foreground: bool) -> Result<()> {
    let daemon = DaemonManager::new();

    if let Some(pid) = daemon.running_pid() {
        println!("Deadliner is already running (PID: {})", pid);
        return Ok(());
    }

    if foreground {
        println!("Starting Deadliner in foreground mode...");
        run_daemon(config).await
    } else {
        let pid = daemon.start()?;
        println!("Deadliner started (PID: {})", pid);
        Ok(())
    }
}

/// Stop the daemon
async fn cmd_stop() -> Result<()> {
    let daemon = DaemonManager::new();

    let Some(pid) = daemon.running_pid() else {
        println!("Deadliner is not running");
        return Ok(());
    };

    daemon.stop()?;
    println!("Deadliner stopped (was PID: {})", pid);
    Ok(())
}

/// Show daemon status
async fn cmd_status(format: OutputFormat) -> Result<()> {
    let daemon = DaemonManager::new();
    let status = daemon.status();

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "running": status.running,
                "pid": status.pid,
                "pid_file": status.pid_file.to_string_lossy()
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Deadliner Status");
            println!("----------------");
            match status.pid {
                Some(pid) => {
                    println!("Status: running");
                    println!("PID: {}", pid);
                }
                None => println!("Status: stopped"),
            }
            println!("PID file: {}", status.pid_file.display());
        }
    }

    Ok(())
}

/// Evaluate one tick now and print the would-be messages.
///
/// Bypasses eligibility and delivery: every user with active deadlines
/// is evaluated and the rendered message (if any) goes to stdout.
async fn cmd_tick(config: &Config) -> Result<()> {
    let tz = config.timezone()?;
    let store = DeadlineStore::open(config.storage.resolve_db_path()).context("Failed to open store")?;
    let repo = StoreRepository::new(store, tz);

    let now = Utc::now().with_timezone(&tz);
    let users = repo.users_with_active_deadlines().await?;

    if users.is_empty() {
        println!("No users with active deadlines");
        return Ok(());
    }

    for user_id in users {
        let deadlines = repo.active_deadlines_for(user_id).await?;
        let classified = policy::classify(deadlines, now);
        match policy::select(classified) {
            Some(notification) => {
                let settings = repo.display_settings(user_id).await?;
                println!("--- user {} ---", user_id);
                println!("{}", presenter::render(&notification, &settings));
            }
            None => println!("--- user {} --- (nothing to notify)", user_id),
        }
    }

    Ok(())
}

/// Show logs
async fn cmd_logs(follow: bool, lines: usize) -> Result<()> {
    let log_path = get_log_path();

    if !log_path.exists() {
        println!("No log file found at: {}", log_path.display());
        println!("The daemon may not have been started yet.");
        return Ok(());
    }

    if follow {
        println!("Following log file: {} (Ctrl+C to stop)", log_path.display());
        println!();

        let mut child = std::process::Command::new("tail")
            .args(["-f", "-n", &lines.to_string()])
            .arg(&log_path)
            .spawn()
            .context("Failed to run tail -f")?;

        child.wait()?;
    } else {
        let file = fs::File::open(&log_path).context("Failed to open log file")?;
        let reader = BufReader::new(file);
        let all_lines: Vec<String> = reader.lines().map_while(Result::ok).collect();

        let start = all_lines.len().saturating_sub(lines);
        for line in &all_lines[start..] {
            println!("{}", line);
        }
    }

    Ok(())
}

/// Run as the daemon process (internal command)
async fn cmd_run_daemon(config: &Config) -> Result<()> {
    let daemon = DaemonManager::new();
    daemon.register_self()?;

    run_daemon(config).await
}

/// Run the daemon: wire up the store, delivery, and scheduler loop
async fn run_daemon(config: &Config) -> Result<()> {
    config.validate()?;
    let tz = config.timezone()?;

    let db_path = config.storage.resolve_db_path();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent).context("Failed to create data directory")?;
    }
    let store = DeadlineStore::open(&db_path).context("Failed to open store")?;
    info!("Store opened at {}", db_path.display());

    let repo: Arc<dyn TaskRepository> = Arc::new(StoreRepository::new(store, tz));
    let delivery = Arc::new(PushDelivery::from_config(&config.delivery).context("Failed to create push client")?);

    let scheduler = Arc::new(ReminderScheduler::new(
        config.scheduler.clone(),
        tz,
        repo,
        delivery,
    ));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = scheduler.run(shutdown_rx).await {
            tracing::error!(error = %e, "Scheduler error");
        }
    });
    info!("Scheduler started");

    info!("Daemon running. Press Ctrl+C to stop.");

    // Set up signal handlers
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => warn!("SIGINT received"),
            _ = sigterm.recv() => warn!("SIGTERM received"),
        }
        let _ = shutdown_tx.send(true);
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        let _ = shutdown_tx.send(true);
    }

    info!("Daemon shutting down...");
    let _ = scheduler_handle.await;

    Ok(())
}
