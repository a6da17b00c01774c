//! CCM Server - Centralized Configuration Manager
//!
//! Serves a project/environment/key configuration tree stored in ZooKeeper.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{
    layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

use ccm::{
    api::ApiServer,
    bootstrap,
    config::{ConfigManager, StoreBackend},
    metrics::Metrics,
    ShutdownCoordinator,
};

/// CLI arguments for the CCM server
#[derive(Parser, Debug)]
#[command(name = "ccm-server")]
#[command(about = "CCM - Centralized Configuration Manager")]
#[command(version)]
#[command(long_about = "
CCM - Centralized Configuration Manager

Serves configuration stored in ZooKeeper under /configs/<project>/<environment>/<key>.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file
3. Environment variables
4. Built-in defaults

Environment variables:
  CCM_BIND_ADDR          - Bind address (e.g., 127.0.0.1:8080)
  CCM_STORE_BACKEND      - Store backend (zookeeper, memory)
  CCM_STORE_ENDPOINT     - ZooKeeper connect string (e.g., zk1:2181,zk2:2181)
  CCM_STORE_ROOT         - Root node name (default: configs)
  CCM_RETRY_BASE_DELAY   - Initial connect backoff (e.g., 1s, 500ms)
  CCM_RETRY_MAX_RETRIES  - Initial connect attempts
  CCM_LOG_LEVEL          - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Configuration file path
    #[arg(
        short,
        long,
        default_value = "ccm.toml",
        help = "Path to configuration file"
    )]
    pub config: PathBuf,

    /// Bind address (overrides config file)
    #[arg(short, long, help = "Bind address (e.g., 127.0.0.1:8080)")]
    pub bind: Option<String>,

    /// Port to bind to (overrides config file)
    #[arg(short, long, help = "Port to bind to")]
    pub port: Option<u16>,

    /// ZooKeeper connect string (overrides config file)
    #[arg(long, help = "ZooKeeper connect string")]
    pub store_endpoint: Option<String>,

    /// Use a process-local store instead of ZooKeeper
    #[arg(long, help = "Use an in-memory store (development only)")]
    pub in_memory: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, help = "Log level (defaults to the configured level)")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    let log_filter = init_tracing(&args)?;

    // Load configuration with priority: CLI args > config file > environment > defaults
    let mut config = ConfigManager::load(&args.config)?;
    apply_configured_level(&log_filter, &args, &config.logging.level)?;

    info!("Starting CCM server v{}", env!("CARGO_PKG_VERSION"));

    config.merge_with_cli_args(
        args.bind.as_deref(),
        args.port,
        args.store_endpoint.as_deref(),
        args.in_memory,
    );

    config
        .validate()
        .context("Final configuration validation failed")?;

    if args.validate_config {
        info!("Configuration is valid");
        info!("Configuration summary:");
        info!("  Bind address: {}", config.server.bind_addr);
        info!("  Store backend: {:?}", config.store.backend);
        info!("  Store endpoint: {}", config.store.endpoint);
        info!("  Store root: /{}", config.store.root);
        info!(
            "  Connect retries: {} (base delay {:?})",
            config.store.retry.max_retries, config.store.retry.base_delay
        );
        return Ok(());
    }

    if config.store.backend == StoreBackend::Memory {
        warn!("Using in-memory store; configuration is lost on exit");
    }

    // The server must not accept traffic without a store session
    let connection = bootstrap::connect_store(&config.store)
        .await
        .context("Unable to reach the coordination store")?;
    let tree = bootstrap::build_tree(&connection, &config.store)?;

    let metrics = Arc::new(Metrics::new().context("Failed to create metrics registry")?);
    if !config.monitoring.metrics_enabled {
        info!("Metrics endpoint disabled");
    }

    let shutdown_coordinator = ShutdownCoordinator::new(config.server.shutdown_timeout);
    let server = ApiServer::new(config.server.bind_addr, tree, metrics)
        .expose_metrics(config.monitoring.metrics_enabled);
    let mut server_handle = tokio::spawn(server.start(shutdown_coordinator.signaled()));

    info!("CCM server started on {}", config.server.bind_addr);

    tokio::select! {
        result = &mut server_handle => {
            // Server exited on its own, most likely a bind failure
            return match result {
                Ok(inner) => inner,
                Err(e) => Err(e.into()),
            };
        }
        signal_result = shutdown_coordinator.listen_for_signals() => {
            if let Err(e) = signal_result {
                error!("Error setting up signal handlers: {}", e);
                shutdown_coordinator.trigger();
            }
        }
    }

    info!("Initiating graceful shutdown...");
    let drained = tokio::time::timeout(shutdown_coordinator.timeout(), &mut server_handle).await;
    match drained {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => error!("Configuration API server failed: {}", e),
        Ok(Err(e)) => error!("Server task failed: {}", e),
        Err(_) => {
            warn!(
                "Requests still in flight after {:?}, aborting",
                shutdown_coordinator.timeout()
            );
            server_handle.abort();
        }
    }

    drop(connection);
    info!("Server shutdown complete");

    Ok(())
}

/// Level requested on the command line, if any
fn cli_log_level(args: &CliArgs) -> Option<&str> {
    if args.verbose {
        Some("debug")
    } else {
        args.log_level.as_deref()
    }
}

/// Initialize tracing/logging before the configuration is read
fn init_tracing(args: &CliArgs) -> Result<reload::Handle<EnvFilter, Registry>> {
    let log_level = cli_log_level(args).unwrap_or("info");

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let (filter, handle) = reload::Layer::new(env_filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true),
        )
        .try_init()
        .context("Failed to initialize tracing")?;

    Ok(handle)
}

/// Switch to `logging.level` unless RUST_LOG or the CLI chose a level
fn apply_configured_level(
    handle: &reload::Handle<EnvFilter, Registry>,
    args: &CliArgs,
    configured_level: &str,
) -> Result<()> {
    if cli_log_level(args).is_some() || std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(());
    }

    handle
        .reload(EnvFilter::new(configured_level))
        .context("Failed to apply configured log level")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_log_level_precedence() {
        let args = CliArgs::parse_from(["ccm-server"]);
        assert_eq!(cli_log_level(&args), None);

        let args = CliArgs::parse_from(["ccm-server", "--log-level", "warn"]);
        assert_eq!(cli_log_level(&args), Some("warn"));

        let args = CliArgs::parse_from(["ccm-server", "--log-level", "warn", "--verbose"]);
        assert_eq!(cli_log_level(&args), Some("debug"));
    }
}
