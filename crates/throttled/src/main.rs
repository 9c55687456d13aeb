//! throttled — the throttle daemon.
//!
//! Assembles the throttle subsystems into one process:
//! - Metric store (seeded from throttle.toml)
//! - Check counters + background instrumentation dispatch
//! - Check evaluator
//! - HTTP API
//!
//! # Usage
//!
//! ```text
//! throttled serve --config /etc/throttle/throttle.toml
//! throttled tablets --api http://vtctld:15000 --keyspace commerce --shard 0
//! throttled tablets --config /etc/throttle/throttle.toml --cluster commerce
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use throttle_check::ThrottleCheck;
use throttle_core::{MetricStore, ThrottleConfig};
use throttle_metrics::{CounterRegistry, InstrumentationDispatcher};
use throttle_topology::TopologyClient;

#[derive(Parser)]
#[command(name = "throttled", about = "Replication-lag throttler", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve throttle checks over HTTP.
    Serve {
        /// Path to throttle.toml. Defaults apply when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides listen_port from the config).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Resolve the tablets of a keyspace/shard and print them as JSON.
    ///
    /// Target either a configured cluster (--config + --cluster) or an
    /// explicit vtctld endpoint (--api + --keyspace).
    Tablets {
        /// Path to throttle.toml.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Cluster whose [clusters.<name>.vitess] block to use.
        #[arg(long, requires = "config", conflicts_with_all = ["api", "keyspace"])]
        cluster: Option<String>,

        /// vtctld base URL, with or without the trailing /api.
        #[arg(long, requires = "keyspace")]
        api: Option<String>,

        #[arg(long, requires = "api")]
        keyspace: Option<String>,

        /// Shard name; empty means all shards.
        #[arg(long, default_value = "")]
        shard: String,

        /// Print every tablet instead of replicas only.
        #[arg(long)]
        all: bool,

        /// Request timeout in milliseconds (defaults to topology_timeout_ms).
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,throttled=debug,throttle_check=debug,throttle_topology=debug",
                )
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port } => run_serve(config, port).await,
        Command::Tablets {
            config,
            cluster,
            api,
            keyspace,
            shard,
            all,
            timeout_ms,
        } => {
            let config = match &config {
                Some(path) => ThrottleConfig::from_file(path)?,
                None => ThrottleConfig::default(),
            };
            let target = match (cluster, api, keyspace) {
                (Some(cluster), _, _) => {
                    let vitess = config
                        .clusters
                        .get(&cluster)
                        .and_then(|c| c.vitess.clone())
                        .ok_or_else(|| anyhow::anyhow!("cluster {cluster} has no vitess config"))?;
                    (vitess.api, vitess.keyspace, vitess.shard)
                }
                (None, Some(api), Some(keyspace)) => (api, keyspace, shard),
                _ => anyhow::bail!("either --cluster or --api and --keyspace is required"),
            };
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.topology_timeout());
            run_tablets(&target.0, &target.1, &target.2, all, timeout).await
        }
    }
}

async fn run_serve(config_path: Option<PathBuf>, port: Option<u16>) -> anyhow::Result<()> {
    let config = match &config_path {
        Some(path) => ThrottleConfig::from_file(path)?,
        None => ThrottleConfig::default(),
    };
    info!(
        config = ?config_path,
        clusters = config.clusters.len(),
        "throttle daemon starting"
    );

    // ── Initialize subsystems ──────────────────────────────────

    let store = MetricStore::from_config(&config);
    for (name, cluster) in &config.clusters {
        info!(cluster = %name, threshold = cluster.threshold, "cluster configured");
    }

    let counters = CounterRegistry::new();
    let (dispatcher, dispatch_worker) = InstrumentationDispatcher::spawn(Arc::new(counters.clone()));

    let check = Arc::new(ThrottleCheck::new(Arc::new(store), dispatcher));

    // ── Start API server ───────────────────────────────────────

    let router = throttle_api::build_router(check, counters);
    let addr = SocketAddr::from(([0, 0, 0, 0], port.unwrap_or(config.listen_port)));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "failed to listen for shutdown signal");
            }
            info!("shutdown signal received");
        })
        .await?;

    // Flush pending counter updates before exit.
    dispatch_worker.shutdown().await;

    info!("throttle daemon stopped");
    Ok(())
}

async fn run_tablets(
    api: &str,
    keyspace: &str,
    shard: &str,
    all: bool,
    timeout: Duration,
) -> anyhow::Result<()> {
    let client = TopologyClient::with_timeout(timeout);
    let tablets = if all {
        client.resolve_tablets(api, keyspace, shard).await?
    } else {
        client.resolve_replicas(api, keyspace, shard).await?
    };

    println!("{}", serde_json::to_string_pretty(&tablets)?);
    Ok(())
}
