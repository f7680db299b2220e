// crates/rca-daemon/src/main.rs
//
// rca-daemon: entry point for the RCA generation service.
//
// Wires the RocksDB store, the configured LLM provider, the incident watcher
// and the JSON-RPC server together, then runs until Ctrl-C.

mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tokio::sync::watch;

use config::{expand_tilde, DaemonConfig};
use rca_pipeline::{IncidentWatcher, RcaGate};
use rca_provider::{build_provider, ProviderKind};
use rca_rpc::RcaRpcServer;
use rca_store::RocksStore;

/// RCA generation daemon.
#[derive(Parser, Debug)]
#[command(name = "rca-daemon", version, about)]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "~/.rca/config.toml")]
    config: String,

    /// Override the provider kind ("titan" or "gpt3").
    #[arg(long)]
    provider: Option<String>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<String>,

    /// Serve the API without watching for new incidents.
    #[arg(long)]
    no_watcher: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_path = expand_tilde(&args.config);
    let (mut config, load_error) = match DaemonConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (DaemonConfig::default(), Some(e.to_string())),
    };

    if let Some(kind) = &args.provider {
        config.provider.kind = kind.parse::<ProviderKind>()?;
    }
    if let Some(data_dir) = args.data_dir {
        config.data_dir = data_dir;
    }
    if args.no_watcher {
        config.watcher.enabled = false;
    }

    let log_dir = config.log_dir.as_deref().map(|d| PathBuf::from(expand_tilde(d)));
    let _log_guard = logging::init_logging(&config.log_level, log_dir.as_deref())?;

    match load_error {
        None => tracing::info!("Loaded configuration from {}", config_path),
        Some(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    config.provider.apply_env();
    if config.provider.api_key.is_none() {
        tracing::warn!("No API key configured for the {} provider", config.provider.kind);
    }
    let provider = build_provider(&config.provider)?;

    let data_dir = expand_tilde(&config.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let db_path = Path::new(&data_dir).join("rocksdb").display().to_string();
    let store = Arc::new(RocksStore::open(&db_path, config.watcher.feed_capacity)?);
    tracing::info!("Opened RocksDB store at {}", db_path);

    let start_time = Instant::now();
    let gate = RcaGate::new(store.clone(), provider, tracing::info_span!("gate"));

    let watcher = if config.watcher.enabled {
        let handle = IncidentWatcher::new(
            store.clone(),
            gate.clone(),
            config.watcher_config(),
            tracing::info_span!("watcher"),
        )
        .spawn();
        Some(handle)
    } else {
        tracing::info!("Incident watcher disabled; serving on-demand generation only");
        None
    };

    let mut rpc_server =
        RcaRpcServer::new(config.rpc_config(), gate, store.clone()).with_start_time(start_time);
    if let Some(handle) = &watcher {
        rpc_server = rpc_server.with_watcher_state(handle.subscribe_state());
    }

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let mut rpc_task = tokio::spawn(async move {
        let shutdown = async move {
            let _ = stop_rx.changed().await;
        };
        if let Err(e) = rpc_server.start(shutdown).await {
            tracing::error!("RPC server error: {}", e);
        }
    });

    tracing::info!(
        "rca-daemon running (provider {}, RPC {}:{})",
        config.provider.kind,
        config.rpc_host,
        config.rpc_port
    );

    let rpc_exited = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
            tracing::info!("Received shutdown signal");
            false
        }
        _ = &mut rpc_task => {
            tracing::warn!("RPC server exited unexpectedly");
            true
        }
    };

    if let Some(handle) = watcher {
        match handle.shutdown(config.shutdown_timeout()).await {
            Some(stats) => tracing::info!(
                "Watcher stopped after {} events ({} generated, {} failed)",
                stats.events_seen,
                stats.generated,
                stats.failed
            ),
            None => tracing::warn!("Watcher did not report final stats"),
        }
    }

    if !rpc_exited {
        let _ = stop_tx.send(true);
        if let Err(e) = rpc_task.await {
            tracing::error!("RPC server task failed: {}", e);
        }
    }

    tracing::info!("rca-daemon shut down");
    Ok(())
}
