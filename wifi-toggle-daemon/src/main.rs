/*!
 * Wi-Fi Auto Toggle agent
 * Turns Wi-Fi off while a wired link is up, back on when it drops
 */

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

use wifi_toggle::config::{self, DaemonConfig, LogTarget};
use wifi_toggle::launchd::{self, AgentSpec};
use wifi_toggle::logging;
use wifi_toggle::monitor::{Monitor, Snapshot};
use wifi_toggle::system::SystemRunner;

/// launchd captures the console log here when the agent is installed.
const AGENT_LOG: &str = "~/Library/Logs/wifi-toggle.log";

#[derive(Parser)]
#[command(name = "wifi-toggled")]
#[command(about = "Wi-Fi Auto Toggle: Wi-Fi off while wired, on when unplugged")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor (default)
    Run,
    /// Probe once and show what the monitor would do
    Status {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Install and load the LaunchAgent
    InstallAgent,
    /// Unload and remove the LaunchAgent
    UninstallAgent,
}

#[derive(Serialize)]
struct StatusReport {
    checked_at: DateTime<Local>,
    #[serde(flatten)]
    snapshot: Snapshot,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Nothing runs against the host until the configuration is known good
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_path()?,
    };
    let config = DaemonConfig::load(&config_path).context("failed to load configuration")?;

    logging::init(&config.logging, cli.debug)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(&config_path, &config).await,
        Commands::Status { json } => show_status(&config, json).await,
        Commands::InstallAgent => install_agent(&config_path, &config).await,
        Commands::UninstallAgent => uninstall_agent(&config).await,
    }
}

async fn run_daemon(config_path: &Path, config: &DaemonConfig) -> Result<()> {
    info!("Wi-Fi Auto Toggle {} starting", env!("CARGO_PKG_VERSION"));
    info!("configuration: {}", config_path.display());

    let behavior = &config.behavior;
    info!(
        "poll {}s, cooldown {}s, grace after Wi-Fi on {}s, debounce {} poll(s)",
        behavior.poll_interval_secs,
        behavior.action_cooldown_secs,
        behavior.grace_after_wifi_on_secs,
        behavior.debounce_polls
    );
    if let Some(idle) = behavior.idle_interval_secs {
        info!("idle poll {}s while wireless outside the office", idle);
    }
    if config.network.wired_port_names.is_empty() {
        info!("wired ports: any non-Wi-Fi port");
    } else {
        info!("wired ports: {}", config.network.wired_port_names.join(", "));
    }
    if config.office.enabled {
        info!("office gating on: {}", config.office.ssids.join(", "));
    }

    // Register before the first tick so an early signal is not lost
    let mut interrupt = signal(SignalKind::interrupt()).context("cannot listen for SIGINT")?;
    let mut terminate = signal(SignalKind::terminate()).context("cannot listen for SIGTERM")?;
    let shutdown = async move {
        tokio::select! {
            _ = interrupt.recv() => info!("received SIGINT, shutting down"),
            _ = terminate.recv() => info!("received SIGTERM, shutting down"),
        }
    };

    let mut monitor = Monitor::new(SystemRunner::new(), config);
    monitor.run(shutdown).await;

    info!("Wi-Fi Auto Toggle stopped");
    Ok(())
}

async fn show_status(config: &DaemonConfig, json: bool) -> Result<()> {
    let monitor = Monitor::new(SystemRunner::new(), config);
    let snapshot = monitor.snapshot().await?;

    if json {
        let report = StatusReport {
            checked_at: Local::now(),
            snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let observation = &snapshot.observation;
    let wired_ports = if observation.wired_ports.is_empty() {
        "-".to_string()
    } else {
        observation.wired_ports.join(", ")
    };

    println!("Wi-Fi device:  {}", observation.wifi_device);
    println!("Wi-Fi power:   {}", observation.wifi_power);
    println!("SSID:          {}", observation.ssid.as_deref().unwrap_or("-"));
    println!("Wired ports:   {}", wired_ports);
    println!(
        "Wired link:    {}",
        if observation.wired_active { "active" } else { "inactive" }
    );
    if snapshot.office_gating {
        let in_office = match observation.in_office {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        };
        println!("In office:     {}", in_office);
    }
    println!("Next action:   {}", snapshot.action);
    Ok(())
}

async fn install_agent(config_path: &Path, config: &DaemonConfig) -> Result<()> {
    let program = std::env::current_exe().context("cannot locate the wifi-toggled executable")?;
    let config_path = config_path
        .canonicalize()
        .with_context(|| format!("cannot resolve {}", config_path.display()))?;

    let stderr_path = if config.logging.targets.contains(&LogTarget::Console) {
        Some(config::expand_home(Path::new(AGENT_LOG))?)
    } else {
        None
    };

    let spec = AgentSpec {
        label: config.agent.label.clone(),
        program,
        config_path,
        keep_alive: config.agent.keep_alive,
        stderr_path,
    };

    let path = launchd::install(&SystemRunner::new(), &spec, &launchd::agents_dir()?).await?;
    println!("Installed {} ({})", spec.label, path.display());
    Ok(())
}

async fn uninstall_agent(config: &DaemonConfig) -> Result<()> {
    let label = &config.agent.label;
    if launchd::uninstall(&SystemRunner::new(), label, &launchd::agents_dir()?).await? {
        println!("Removed {}", label);
    } else {
        println!("{} was not installed", label);
    }
    Ok(())
}
