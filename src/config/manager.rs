//! Configuration Manager

use super::{Config, StoreBackend};
use crate::store::path;
use crate::Result;
use anyhow::{bail, Context};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file, without consulting the environment
    pub fn load_from_file(path: &Path) -> Result<Config> {
        Self::load_layered(path, |_| None)
    }

    /// Load configuration with priority: file > environment > defaults
    pub fn load(path: &Path) -> Result<Config> {
        Self::load_layered(path, |name| std::env::var(name).ok())
    }

    /// Keys set in the file win over `lookup`; everything else falls through
    pub fn load_layered<F>(path: &Path, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        Self::apply_vars(&mut config, lookup)?;

        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            config = Self::overlay(config, &content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        } else {
            tracing::warn!(
                "Configuration file not found at {}, using environment and defaults",
                path.display()
            );
        }

        config.validate()?;
        tracing::info!("Configuration loaded and validated successfully");
        Ok(config)
    }

    /// Deserialize `content` on top of `base`, key by key
    fn overlay(base: Config, content: &str) -> Result<Config> {
        let file: toml::Table = toml::from_str(content)?;
        let mut merged = match toml::Value::try_from(&base)? {
            toml::Value::Table(table) => table,
            other => bail!("configuration serialized to {} instead of a table", other.type_str()),
        };
        merge_tables(&mut merged, file);
        Ok(toml::Value::Table(merged).try_into()?)
    }

    /// Parse and validate TOML configuration
    pub fn parse(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)?;
        config
            .validate()
            .context("Configuration validation failed")?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        Self::load_from_vars(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn load_from_vars<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        Self::apply_vars(&mut config, lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_vars<F>(config: &mut Config, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind_addr) = lookup("CCM_BIND_ADDR") {
            config.server.bind_addr = bind_addr
                .parse::<SocketAddr>()
                .with_context(|| format!("Invalid CCM_BIND_ADDR: {}", bind_addr))?;
        }

        if let Some(backend) = lookup("CCM_STORE_BACKEND") {
            config.store.backend = match backend.to_ascii_lowercase().as_str() {
                "zookeeper" => StoreBackend::Zookeeper,
                "memory" => StoreBackend::Memory,
                _ => bail!("Invalid CCM_STORE_BACKEND: {} (expected zookeeper or memory)", backend),
            };
        }

        if let Some(endpoint) = lookup("CCM_STORE_ENDPOINT") {
            config.store.endpoint = endpoint;
        }

        if let Some(root) = lookup("CCM_STORE_ROOT") {
            config.store.root = root;
        }

        if let Some(delay) = lookup("CCM_RETRY_BASE_DELAY") {
            config.store.retry.base_delay = humantime::parse_duration(&delay)
                .with_context(|| format!("Invalid CCM_RETRY_BASE_DELAY: {}", delay))?;
        }

        if let Some(retries) = lookup("CCM_RETRY_MAX_RETRIES") {
            config.store.retry.max_retries = retries
                .parse::<u32>()
                .with_context(|| format!("Invalid CCM_RETRY_MAX_RETRIES: {}", retries))?;
        }

        if let Some(log_level) = lookup("CCM_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        Ok(())
    }
}

fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested)
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_store_config()
            .context("Store configuration validation failed")?;

        self.validate_logging_config()
            .context("Logging configuration validation failed")?;

        Ok(())
    }

    fn validate_store_config(&self) -> Result<()> {
        let store = &self.store;

        if store.backend == StoreBackend::Zookeeper && store.endpoint.trim().is_empty() {
            bail!("store.endpoint must be set for the zookeeper backend");
        }

        path::validate_segment(&store.root)
            .map_err(|e| anyhow::anyhow!("store.root is invalid: {}", e))?;

        if store.retry.max_retries == 0 {
            bail!("store.retry.max_retries must be greater than 0");
        }

        if store.retry.max_retries > 10 {
            bail!("store.retry.max_retries cannot exceed 10");
        }

        if store.retry.base_delay.is_zero() {
            bail!("store.retry.base_delay must be greater than 0");
        }

        if store.retry.base_delay > Duration::from_secs(60) {
            bail!("store.retry.base_delay cannot exceed 1 minute");
        }

        if store.connect_timeout.is_zero() {
            bail!("store.connect_timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_logging_config(&self) -> Result<()> {
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            bail!("logging.level must be one of: {}", valid_log_levels.join(", "));
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(
        &mut self,
        bind: Option<&str>,
        port: Option<u16>,
        store_endpoint: Option<&str>,
        in_memory: bool,
    ) {
        if let Some(bind_str) = bind {
            if let Ok(addr) = bind_str.parse::<SocketAddr>() {
                self.server.bind_addr = addr;
                tracing::info!("CLI override: bind address set to {}", addr);
            } else {
                tracing::warn!("Invalid bind address provided: {}", bind_str);
            }
        }

        if let Some(port) = port {
            self.server.bind_addr.set_port(port);
            tracing::info!("CLI override: port set to {}", port);
        }

        if let Some(endpoint) = store_endpoint {
            self.store.endpoint = endpoint.to_string();
            tracing::info!("CLI override: store endpoint set to {}", endpoint);
        }

        if in_memory {
            self.store.backend = StoreBackend::Memory;
            tracing::info!("CLI override: using in-memory store");
        }
    }
}
