//! taskscaled — the taskscale daemon.
//!
//! Wires the Prometheus metric source and the gateway replica control into
//! one `ScalingCycle`, then triggers it:
//! - `serve`: on every `POST /system/auto-scale` (alert webhook)
//! - `watch`: on a fixed interval
//! - `once`: a single cycle, exit status reflects errors
//!
//! # Usage
//!
//! ```text
//! taskscaled --config /etc/taskscale.toml serve --port 8081
//! taskscaled --prometheus-url http://prometheus:9090 \
//!            --gateway-url http://gateway:8080 once
//! ```

mod watch_mode;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use taskscale_autoscale::{CycleSettings, ScalingCycle};
use taskscale_backends::{GatewayControl, HttpClient, PrometheusSource};
use taskscale_core::TaskscaleConfig;
use taskscale_core::duration::parse_duration;

#[derive(Parser)]
#[command(name = "taskscaled", about = "Backlog-driven autoscaler")]
struct Cli {
    /// Path to taskscale.toml. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Flags that take precedence over the config file.
#[derive(Args)]
struct Overrides {
    /// Prometheus base URL.
    #[arg(long, global = true)]
    prometheus_url: Option<String>,

    /// Gateway base URL.
    #[arg(long, global = true)]
    gateway_url: Option<String>,

    /// Namespace for function names without one.
    #[arg(long, global = true)]
    default_namespace: Option<String>,

    /// Idle time before scaling down, e.g. "5m".
    #[arg(long, global = true)]
    cooldown: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the alert webhook that triggers scaling cycles.
    Serve {
        /// Port to listen on (overrides `server.port`).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a scaling cycle on a fixed interval.
    Watch {
        /// Interval between cycles, e.g. "30s".
        #[arg(long, default_value = "30s")]
        interval: String,
    },
    /// Run a single scaling cycle and exit.
    Once,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let config = load_config(cli.config.as_deref(), &cli.overrides)?;
    let cycle = Arc::new(build_cycle(&config)?);

    match cli.command {
        Command::Serve { port } => run_serve(cycle, port.unwrap_or(config.server.port)).await,
        Command::Watch { interval } => {
            let interval = parse_duration(&interval)
                .filter(|d| !d.is_zero())
                .with_context(|| format!("invalid --interval {interval:?}"))?;
            run_watch(cycle, interval).await
        }
        Command::Once => run_once(cycle).await,
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,taskscaled=debug,taskscale=debug")
    });

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn load_config(
    path: Option<&std::path::Path>,
    overrides: &Overrides,
) -> anyhow::Result<TaskscaleConfig> {
    let mut config = match path {
        Some(path) => TaskscaleConfig::from_file(path)?,
        None => TaskscaleConfig::default(),
    };

    if let Some(url) = &overrides.prometheus_url {
        config.prometheus.url = url.clone();
    }
    if let Some(url) = &overrides.gateway_url {
        config.gateway.url = url.clone();
    }
    if let Some(ns) = &overrides.default_namespace {
        config.autoscale.default_namespace = ns.clone();
    }
    if let Some(cooldown) = &overrides.cooldown {
        config.autoscale.cooldown = cooldown.clone();
    }
    config.validate()?;

    if config.prometheus.url.is_empty() {
        anyhow::bail!("prometheus url is not configured (set prometheus.url or --prometheus-url)");
    }
    if config.gateway.url.is_empty() {
        anyhow::bail!("gateway url is not configured (set gateway.url or --gateway-url)");
    }
    Ok(config)
}

fn build_cycle(config: &TaskscaleConfig) -> anyhow::Result<ScalingCycle> {
    let settings = CycleSettings::from_config(&config.autoscale)?;

    let source = PrometheusSource::new(
        config.prometheus.url.clone(),
        HttpClient::new(config.prometheus.timeout()?),
    );
    let control = GatewayControl::new(
        config.gateway.url.clone(),
        HttpClient::new(config.gateway.timeout()?),
    );

    info!(
        metric = %settings.metric,
        namespace = %settings.default_namespace,
        cooldown_secs = settings.cooldown.as_secs(),
        prometheus = %config.prometheus.url,
        gateway = %config.gateway.url,
        "scaling cycle configured"
    );

    Ok(ScalingCycle::new(
        settings,
        Arc::new(source),
        Arc::new(control),
    ))
}

async fn run_serve(cycle: Arc<ScalingCycle>, port: u16) -> anyhow::Result<()> {
    let router = taskscale_api::build_router(cycle);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "webhook server starting");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            wait_for_ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    info!("taskscaled stopped");
    Ok(())
}

async fn run_watch(cycle: Arc<ScalingCycle>, interval: Duration) -> anyhow::Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(watch_mode::run_watch(cycle, interval, shutdown_rx));

    wait_for_ctrl_c().await;
    info!("shutdown signal received");
    let _ = shutdown_tx.send(true);
    handle.await?;

    info!("taskscaled stopped");
    Ok(())
}

async fn run_once(cycle: Arc<ScalingCycle>) -> anyhow::Result<()> {
    let report = cycle.run().await;

    for change in report.changes() {
        info!(function = %change.function, from = change.from, to = change.to, "scaled");
    }

    if !report.is_success() {
        eprint!("{}", report.render());
        let errors = report.errors().len();
        anyhow::bail!("autoscale cycle finished with {errors} errors");
    }
    Ok(())
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c, shutting down");
    }
}
