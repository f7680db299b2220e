// crates/rca-daemon/src/config.rs
//
// Runtime configuration for the RCA daemon.
// Loaded from a TOML file or populated with defaults.

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use rca_pipeline::{InFlightPolicy, WatcherConfig};
use rca_provider::ProviderSettings;
use rca_rpc::RpcConfig;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory for local data storage (RocksDB).
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory for daily-rotated log files. Console only when unset.
    #[serde(default)]
    pub log_dir: Option<String>,

    #[serde(default)]
    pub provider: ProviderSettings,

    #[serde(default)]
    pub watcher: WatcherSettings,
}

/// `[watcher]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub in_flight: InFlightPolicy,

    /// How long shutdown waits for the watcher before aborting it.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Unread change events per subscriber before a backlog warning is
    /// logged. Events are never dropped.
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

fn default_data_dir() -> String {
    "~/.rca/data".to_string()
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    50061
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

fn default_feed_capacity() -> usize {
    256
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            in_flight: InFlightPolicy::default(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            feed_capacity: default_feed_capacity(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            log_dir: None,
            provider: ProviderSettings::default(),
            watcher: WatcherSettings::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: DaemonConfig = toml::from_str(contents)?;
        Ok(config)
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            host: self.rpc_host.clone(),
            port: self.rpc_port,
        }
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            in_flight: self.watcher.in_flight,
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.watcher.shutdown_timeout_secs)
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).display().to_string();
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rca_provider::ProviderKind;

    #[test]
    fn empty_file_yields_defaults() {
        let config = DaemonConfig::parse("").unwrap();
        assert_eq!(config.rpc_port, 50061);
        assert_eq!(config.log_level, "info");
        assert!(config.log_dir.is_none());
        assert_eq!(config.provider.kind, ProviderKind::Titan);
        assert!(config.watcher.enabled);
        assert_eq!(config.watcher.in_flight, InFlightPolicy::Finish);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn example_config_parses() {
        let config = DaemonConfig::parse(include_str!("../config.example.toml")).unwrap();
        assert_eq!(config.data_dir, "~/.rca/data");
        assert_eq!(config.provider.generation().max_tokens, 512);
        assert_eq!(config.provider.generation().top_p, 0.9);
        assert_eq!(config.watcher.feed_capacity, 256);
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = DaemonConfig::parse(
            r#"
            rpc_port = 6000
            log_dir = "/var/log/rca"

            [provider]
            kind = "gpt3"
            temperature = 0.2

            [watcher]
            in_flight = "abandon"
            shutdown_timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.rpc_config().port, 6000);
        assert_eq!(config.rpc_config().host, "127.0.0.1");
        assert_eq!(config.log_dir.as_deref(), Some("/var/log/rca"));
        assert_eq!(config.provider.kind, ProviderKind::Gpt3);
        assert_eq!(config.provider.generation().temperature, 0.2);
        assert_eq!(config.provider.generation().max_tokens, 500);
        assert_eq!(config.watcher_config().in_flight, InFlightPolicy::Abandon);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(3));
        assert!(config.watcher.enabled);
    }

    #[test]
    fn unknown_provider_kind_is_rejected() {
        assert!(DaemonConfig::parse("[provider]\nkind = \"claude\"\n").is_err());
    }

    #[test]
    fn tilde_expansion() {
        assert_eq!(expand_tilde("/abs/path"), "/abs/path");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde("~/.rca/data"),
                home.join(".rca/data").display().to_string()
            );
        }
    }
}
