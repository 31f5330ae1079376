//! Configuration management for the bot
//!
//! This module handles loading and validation of configuration from TOML files
//! and environment variables. There is no global config object; one `Config`
//! is built at startup and handed to each component.

use std::fs;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::utils::types::Address;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bot: BotConfig,
    pub chain: ChainConfig,
    pub mempool: MempoolConfig,
    pub gas: GasConfig,
    pub bundle: BundleConfig,
    pub risk: RiskConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
    pub notification: NotificationConfig,
}

/// Bot operational settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BotConfig {
    pub enabled: bool,
    pub name: String,
    pub kill_switch: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "mev-bundler".to_string(),
            kill_switch: false,
        }
    }
}

/// Chain node connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub request_timeout_secs: u64,
    /// Bot account address transactions are sent from
    pub sender_address: String,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            request_timeout_secs: 10,
            sender_address: "0x0000000000000000000000000000000000000000".to_string(),
        }
    }
}

/// Mempool scanning configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MempoolConfig {
    pub scan_interval_secs: f64,
    /// Minimum value in wei for a transaction to pass the filter
    pub min_value: u128,
    /// Minimum gas price in wei for a transaction to pass the filter
    pub min_gas_price: u64,
    /// Recipient allowlist; empty means no contract filtering
    pub target_contracts: Vec<Address>,
    /// Capacity of the tracked-opportunity table; oldest evicted first
    pub max_tracked: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 1.0,
            min_value: 0,
            min_gas_price: 0,
            target_contracts: Vec::new(),
            max_tracked: 1000,
        }
    }
}

/// Gas price advisory configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GasConfig {
    pub min_gas_price_gwei: u64,
    pub max_gas_price_gwei: u64,
    /// Safety buffer applied on top of the tier multiplier
    pub price_buffer: f64,
    pub history_size: usize,
    pub update_interval_secs: u64,
    pub default_gas_limit: u64,
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            min_gas_price_gwei: 5,
            max_gas_price_gwei: 500,
            price_buffer: 1.1,
            history_size: 200,
            update_interval_secs: 15,
            default_gas_limit: 300_000,
        }
    }
}

/// Bundle construction configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BundleConfig {
    pub max_transactions: usize,
    /// Minimum expected profit, in the chain's native unit
    pub min_profit_threshold: Decimal,
    /// Baseline sort direction before dependency resolution
    pub order_by_gas_price_ascending: bool,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            max_transactions: 3,
            min_profit_threshold: dec!(0.1),
            order_by_gas_price_ascending: true,
        }
    }
}

/// Risk gate configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Maximum position size, in the chain's native unit
    pub max_position_size: Decimal,
    /// Gas price ceiling in wei above which all trades are rejected
    pub max_gas_price_wei: u64,
    pub rate_limit_max_requests: usize,
    pub rate_limit_window_secs: u64,
    /// Sliding window over which exposure entries count
    pub exposure_window_secs: u64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_position_size: dec!(100),
            max_gas_price_wei: 500_000_000_000,
            rate_limit_max_requests: 10,
            rate_limit_window_secs: 60,
            exposure_window_secs: 300,
        }
    }
}

/// Strategy execution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    pub receipt_timeout_secs: u64,
    /// Shorter timeout for opportunistic (sandwich/frontrun) bundles
    pub opportunistic_receipt_timeout_secs: u64,
    pub dry_run: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay_secs: 1,
            receipt_timeout_secs: 300,
            opportunistic_receipt_timeout_secs: 60,
            dry_run: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file_dir: String,
    pub json_file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_dir: "logs".to_string(),
            json_file: true,
        }
    }
}

/// Notification sink configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub webhook_url: String,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.load_env_vars();
        Ok(config)
    }

    /// Load environment variable overrides
    fn load_env_vars(&mut self) {
        if let Ok(rpc_url) = std::env::var("CHAIN_RPC_URL") {
            self.chain.rpc_url = rpc_url;
        }

        if let Ok(webhook) = std::env::var("NOTIFICATION_WEBHOOK_URL") {
            self.notification.webhook_url = webhook;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chain.rpc_url.is_empty() {
            anyhow::bail!("Chain RPC URL is required");
        }

        if !self.mempool.scan_interval_secs.is_finite() || self.mempool.scan_interval_secs <= 0.0 {
            anyhow::bail!("Mempool scan interval must be a positive number of seconds");
        }

        if self.bundle.max_transactions == 0 {
            anyhow::bail!("Bundle size limit must be positive");
        }

        if self.bundle.min_profit_threshold < Decimal::ZERO {
            anyhow::bail!("Minimum profit threshold must be non-negative");
        }

        if self.gas.min_gas_price_gwei > self.gas.max_gas_price_gwei {
            anyhow::bail!("Minimum gas price cannot exceed maximum gas price");
        }

        if self.gas.price_buffer < 1.0 {
            anyhow::bail!("Gas price buffer must be at least 1.0");
        }

        if self.risk.max_position_size <= Decimal::ZERO {
            anyhow::bail!("Max position size must be positive");
        }

        if self.execution.max_retries == 0 {
            anyhow::bail!("Max retries must be positive");
        }

        Ok(())
    }

    /// Lower gas price bound in wei
    pub fn min_gas_price_wei(&self) -> u64 {
        self.gas.min_gas_price_gwei * 1_000_000_000
    }

    /// Upper gas price bound in wei
    pub fn max_gas_price_wei(&self) -> u64 {
        self.gas.max_gas_price_gwei * 1_000_000_000
    }
}
