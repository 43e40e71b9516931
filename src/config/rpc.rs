//! RPC endpoint configuration
//!
//! The node endpoint is read from the environment, in priority order:
//! 1. `RPC_PROVIDER_URL` - the variable the wallet has always used
//! 2. `ETH_RPC_URL` - the common Ethereum tooling convention
//!
//! A `.env` file in the working directory is loaded by the binary before
//! this runs.
//!
//! ```bash
//! export RPC_PROVIDER_URL="https://eth-sepolia.g.alchemy.com/v2/YOUR_KEY"
//! ```

/// Environment variable names
pub mod env_vars {
    pub const RPC_PROVIDER_URL: &str = "RPC_PROVIDER_URL";
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
}

/// RPC endpoint resolved from the environment
#[derive(Debug, Clone, Default)]
pub struct RpcConfig {
    url: Option<String>,
}

impl RpcConfig {
    /// Create RPC config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve the endpoint through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        for name in [env_vars::RPC_PROVIDER_URL, env_vars::ETH_RPC_URL] {
            if let Some(url) = lookup(name).filter(|v| !v.trim().is_empty()) {
                tracing::debug!("Using {} for the node endpoint", name);
                return Self {
                    url: Some(url.trim().to_string()),
                };
            }
        }
        Self { url: None }
    }

    /// Create with an explicit URL
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
        }
    }

    /// Get the RPC URL, if any was configured
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}
