use config::{Config as ConfigLoader, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::abi::{is_valid_address, Address};
use crate::controller::DEFAULT_CONFIRMATIONS;
use crate::error::Error;
use crate::explorer::Chain;

/// Contract address configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Lido oracle used for the stETH yield snapshot
    pub lido_oracle: Option<String>,
    /// Gauge controller holding each gauge's relative weight
    pub gauge_controller: Option<String>,
    /// Reward token minter (`mint(gauge)`)
    pub token_minter: Option<String>,
    /// Liquidity gauge per vault
    #[serde(default)]
    pub gauges: HashMap<String, String>,
    /// Liquidity mining (staking) pool per vault, the approval spender
    #[serde(default)]
    pub staking_pools: HashMap<String, String>,
    /// Vault share token per vault
    #[serde(default)]
    pub vault_tokens: HashMap<String, String>,
}

impl ContractAddresses {
    pub fn lido_oracle(&self) -> Result<Option<Address>, Error> {
        parse_optional(self.lido_oracle.as_deref())
    }

    pub fn gauge_controller(&self) -> Result<Option<Address>, Error> {
        parse_optional(self.gauge_controller.as_deref())
    }

    pub fn token_minter(&self) -> Result<Option<Address>, Error> {
        parse_optional(self.token_minter.as_deref())
    }

    pub fn gauge(&self, vault: &str) -> Result<Option<Address>, Error> {
        parse_optional(self.gauges.get(vault).map(String::as_str))
    }

    pub fn staking_pool(&self, vault: &str) -> Result<Option<Address>, Error> {
        parse_optional(self.staking_pools.get(vault).map(String::as_str))
    }

    pub fn vault_token(&self, vault: &str) -> Result<Option<Address>, Error> {
        parse_optional(self.vault_tokens.get(vault).map(String::as_str))
    }

    /// Check that every configured address is well formed
    pub fn validate(&self) -> Result<(), Error> {
        let singles = [
            ("lido_oracle", &self.lido_oracle),
            ("gauge_controller", &self.gauge_controller),
            ("token_minter", &self.token_minter),
        ];
        for (name, value) in singles {
            if let Some(value) = value {
                if !is_valid_address(value) {
                    return Err(Error::Config(format!("Invalid {} address: {}", name, value)));
                }
            }
        }

        let maps = [
            ("gauge", &self.gauges),
            ("staking pool", &self.staking_pools),
            ("vault token", &self.vault_tokens),
        ];
        for (name, map) in maps {
            for (vault, value) in map {
                if !is_valid_address(value) {
                    return Err(Error::Config(format!(
                        "Invalid {} address for {}: {}",
                        name, vault, value
                    )));
                }
            }
        }

        Ok(())
    }
}

fn parse_optional(value: Option<&str>) -> Result<Option<Address>, Error> {
    match value {
        Some(value) if !value.is_empty() => Address::from_str(value)
            .map(Some)
            .map_err(|e| Error::Config(e.to_string())),
        _ => Ok(None),
    }
}

fn default_confirmations() -> u64 {
    DEFAULT_CONFIRMATIONS
}

fn default_poll_interval_ms() -> u64 {
    4_000
}

fn default_confirmation_timeout_secs() -> u64 {
    600
}

fn default_reward_symbol() -> String {
    "RBN".to_string()
}

/// Network configuration for the staking SDK
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network name (e.g., mainnet)
    pub network_name: String,
    /// Numeric EVM chain id
    pub chain_id: u64,
    /// JSON-RPC endpoint URL
    pub rpc_url: String,
    /// Chain used for explorer links
    #[serde(default)]
    pub chain: Chain,
    /// Confirmations to wait for after submission
    #[serde(default = "default_confirmations")]
    pub confirmations: u64,
    /// Receipt polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on a confirmation wait in seconds
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Symbol of the gauge reward token
    #[serde(default = "default_reward_symbol")]
    pub reward_symbol: String,
    /// Contract addresses
    #[serde(default)]
    pub contracts: ContractAddresses,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network_name: "mainnet".to_string(),
            chain_id: 1,
            rpc_url: "http://127.0.0.1:8545".to_string(),
            chain: Chain::Ethereum,
            confirmations: default_confirmations(),
            poll_interval_ms: default_poll_interval_ms(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            reward_symbol: default_reward_symbol(),
            contracts: ContractAddresses::default(),
        }
    }
}

impl NetworkConfig {
    /// Load a network section from `{STAKING_CONFIG_DIR}/network.toml`,
    /// with `STAKING_`-prefixed environment variables layered on top
    pub fn load(network: &str) -> Result<Self, Error> {
        let config_dir = env::var("STAKING_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let settings = ConfigLoader::builder()
            .add_source(File::with_name(&format!("{}/network", config_dir)))
            .add_source(
                Environment::with_prefix("STAKING")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config = settings.get::<NetworkConfig>(network)?;
        config.contracts.validate()?;
        tracing::debug!(
            network = %config.network_name,
            chain_id = config.chain_id,
            "Loaded network config"
        );
        Ok(config)
    }

    pub fn with_rpc_url(mut self, rpc_url: String) -> Self {
        self.rpc_url = rpc_url;
        self
    }

    pub fn with_contracts(mut self, contracts: ContractAddresses) -> Self {
        self.contracts = contracts;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    /// Chain used for explorer links, derived from `chain_id` when not set explicitly
    pub fn explorer_chain(&self) -> Chain {
        match self.chain {
            Chain::NotSelected => Chain::from_chain_id(self.chain_id),
            chain => chain,
        }
    }
}

/// Token information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Token name
    pub name: String,
    /// Token symbol
    pub symbol: String,
    /// Token decimals
    pub decimals: u8,
}

/// Complete configuration with the connected account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Active network configuration
    pub network: NetworkConfig,
    /// Account that signs transactions (unlocked in the connected wallet)
    pub account: Option<String>,
    /// Known tokens keyed by vault
    #[serde(default)]
    pub tokens: HashMap<String, TokenInfo>,
}

impl Config {
    /// Create a new configuration with the specified network
    pub fn with_network(network: NetworkConfig) -> Self {
        Self {
            network,
            account: None,
            tokens: HashMap::new(),
        }
    }

    /// Create a new configuration with a signing account
    pub fn with_account(network: NetworkConfig, account: String) -> Self {
        Self {
            network,
            account: Some(account),
            tokens: HashMap::new(),
        }
    }

    pub fn account(&self) -> Result<Option<Address>, Error> {
        parse_optional(self.account.as_deref())
    }

    /// Load configuration from a file
    pub fn load(path: &PathBuf) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.network.contracts.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> Result<(), Error> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("staking-rewards");
        path.push("config.toml");
        path
    }

    /// Add token information
    pub fn add_token(&mut self, vault: String, token_info: TokenInfo) {
        self.tokens.insert(vault, token_info);
    }

    /// Decimals for a vault's token, 18 when unknown
    pub fn decimals(&self, vault: &str) -> u32 {
        self.tokens
            .get(vault)
            .map(|t| t.decimals as u32)
            .unwrap_or(crate::amount::DEFAULT_DECIMALS)
    }
}
