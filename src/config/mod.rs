//! Configuration for the wallet

pub mod rpc;

use crate::storage::WalletFiles;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Main configuration
///
/// Built once by the binary and passed to every command; nothing reads
/// global state after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the key file, address file and address book
    pub data_dir: PathBuf,
    /// JSON-RPC endpoint of the node
    pub rpc_url: Option<String>,
    /// How long to wait for a broadcast transaction to be mined (None = forever)
    pub confirmation_timeout_secs: Option<u64>,
    /// Receipt polling interval (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            rpc_url: None,
            confirmation_timeout_secs: Some(300), // 5 minutes
            poll_interval_ms: 2_000,
        }
    }
}

impl Config {
    /// Load a JSON config file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Fill the RPC URL from the environment when none was configured
    pub fn with_rpc_fallback(mut self, rpc: &RpcConfig) -> Self {
        if self.rpc_url.is_none() {
            self.rpc_url = rpc.url().map(str::to_string);
        }
        self
    }

    /// The RPC URL, or a configuration error naming the variables to set
    pub fn require_rpc_url(&self) -> Result<&str> {
        self.rpc_url.as_deref().ok_or_else(|| {
            Error::Config(format!(
                "no node endpoint configured; set {} (or {}) or pass --rpc-url",
                rpc::env_vars::RPC_PROVIDER_URL,
                rpc::env_vars::ETH_RPC_URL
            ))
        })
    }

    pub fn confirmation_timeout(&self) -> Option<Duration> {
        self.confirmation_timeout_secs.map(Duration::from_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Paths of the persisted wallet files
    pub fn files(&self) -> WalletFiles {
        WalletFiles::in_dir(&self.data_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.confirmation_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert!(config.rpc_url.is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let value = serde_json::json!({
            "rpc_url": "http://localhost:8545",
            "confirmation_timeout_secs": null
        });
        let parsed: Config = serde_json::from_value(value).expect("parse config");
        assert_eq!(parsed.require_rpc_url().unwrap(), "http://localhost:8545");
        assert_eq!(parsed.confirmation_timeout(), None);
        assert_eq!(parsed.poll_interval_ms, 2_000);
    }

    #[test]
    fn test_rpc_fallback_only_fills_missing() {
        let env = RpcConfig::with_url("https://env.rpc");

        let filled = Config::default().with_rpc_fallback(&env);
        assert_eq!(filled.rpc_url.as_deref(), Some("https://env.rpc"));

        let explicit = Config {
            rpc_url: Some("https://explicit.rpc".to_string()),
            ..Config::default()
        }
        .with_rpc_fallback(&env);
        assert_eq!(explicit.rpc_url.as_deref(), Some("https://explicit.rpc"));
    }

    #[test]
    fn test_missing_rpc_url_is_config_error() {
        let err = Config::default().require_rpc_url().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("RPC_PROVIDER_URL"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallet.json");
        std::fs::write(&path, r#"{"data_dir": "/tmp/wallet", "poll_interval_ms": 500}"#).unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/wallet"));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));

        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(Config::from_file(&path), Err(Error::Config(_))));
    }
}
