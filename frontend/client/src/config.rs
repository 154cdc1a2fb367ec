//! Runtime configuration loaded from environment variables.

use crate::abi::Address;
use crate::errors::{ClientError, Result};
use crate::lifecycle::Audience;

#[derive(Debug, Clone)]
pub struct Config {
    /// JSON-RPC endpoint of an EVM node (e.g. a Sepolia gateway).
    pub rpc_url: String,
    /// The campaign contract address.
    pub campaign_address: Address,
    /// Which lifecycle view to render: backer, team or legacy.
    pub audience: Audience,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            rpc_url: env_var("RPC_URL")
                .unwrap_or_else(|_| "https://ethereum-sepolia-rpc.publicnode.com".to_string()),
            campaign_address: env_var("CAMPAIGN_ADDRESS")
                .map_err(|_| {
                    ClientError::Config(
                        "CAMPAIGN_ADDRESS environment variable is required".to_string(),
                    )
                })?
                .parse()?,
            audience: env_var("AUDIENCE")
                .unwrap_or_else(|_| "backer".to_string())
                .parse()?,
        })
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| ClientError::Config(format!("Missing env var: {key}")))
}
