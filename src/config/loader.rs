//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.
//! Every field has a default, so a missing file or a partial file still yields a
//! usable configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Path tried when no --config flag is given
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub trading: TradingSection,
    #[serde(default)]
    pub filters: FiltersSection,
    #[serde(default)]
    pub exits: ExitsSection,
    #[serde(default)]
    pub limits: LimitsSection,
    #[serde(default)]
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub rpc: RpcSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Trading configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSection {
    /// SOL spent per buy
    #[serde(default = "default_buy_amount_sol")]
    pub buy_amount_sol: f64,
    /// Maximum tolerated slippage as a percentage
    #[serde(default = "default_max_slippage_pct")]
    pub max_slippage_pct: f64,
    /// Run against simulated fills instead of live execution
    #[serde(default = "default_simulation_mode")]
    pub simulation_mode: bool,
}

/// Launch filter configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersSection {
    /// Minimum safety score (0-100) a launch must reach
    #[serde(default = "default_min_safety_score")]
    pub min_safety_score: u32,
    /// Minimum opportunity score (0-100) a launch must reach
    #[serde(default = "default_min_opportunity_score")]
    pub min_opportunity_score: u32,
    /// Market cap floor in USD
    #[serde(default = "default_min_market_cap")]
    pub min_market_cap: f64,
    /// Market cap ceiling in USD
    #[serde(default = "default_max_market_cap")]
    pub max_market_cap: f64,
    /// Minimum pooled liquidity in SOL
    #[serde(default = "default_min_liquidity")]
    pub min_liquidity: f64,
}

/// Exit rule configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExitsSection {
    /// Take profit percentage over entry (100 doubles the entry price)
    #[serde(default = "default_take_profit_pct")]
    pub take_profit_pct: f64,
    /// Stop loss percentage below entry
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    /// Trailing stop percentage below the post-entry peak
    #[serde(default = "default_trailing_stop_pct")]
    pub trailing_stop_pct: f64,
}

/// Trade pacing configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSection {
    /// Minimum milliseconds between buys
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
    /// Rolling one-hour buy cap
    #[serde(default = "default_max_trades_per_hour")]
    pub max_trades_per_hour: u32,
}

/// Background loop scheduling section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSection {
    /// Seconds between position exit checks
    #[serde(default = "default_position_check_secs")]
    pub position_check_secs: u64,
    /// Seconds between health checks
    #[serde(default = "default_health_check_secs")]
    pub health_check_secs: u64,
    /// Fraction of health checks that are logged (0.0-1.0)
    #[serde(default = "default_health_log_sample_rate")]
    pub health_log_sample_rate: f64,
}

/// RPC configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcSection {
    /// RPC endpoint (use private RPC for production)
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Wallet private key; prefer the PRIVATE_KEY environment variable
    /// over storing this in the file. Never serialized back out.
    #[serde(default, skip_serializing)]
    pub private_key: Option<String>,
}

impl RpcSection {
    /// Get RPC URL with environment variable override
    /// Checks RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var("RPC_URL").unwrap_or_else(|_| self.rpc_url.clone())
    }

    /// Get private key with environment variable fallback
    /// Checks PRIVATE_KEY env var if config value is empty/None
    pub fn get_private_key(&self) -> Option<String> {
        if let Some(ref key) = self.private_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var("PRIVATE_KEY").ok()
    }
}

impl TradingSection {
    /// Simulation flag with environment variable override
    /// SIMULATION_MODE=true/1 forces simulation on, =false/0 forces it off
    pub fn simulation_enabled(&self) -> bool {
        match std::env::var("SIMULATION_MODE") {
            Ok(value) => matches!(value.to_lowercase().as_str(), "true" | "1" | "yes"),
            Err(_) => self.simulation_mode,
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_buy_amount_sol() -> f64 {
    0.1
}

fn default_max_slippage_pct() -> f64 {
    25.0
}

fn default_simulation_mode() -> bool {
    true
}

fn default_min_safety_score() -> u32 {
    60
}

fn default_min_opportunity_score() -> u32 {
    50
}

fn default_min_market_cap() -> f64 {
    1_000.0
}

fn default_max_market_cap() -> f64 {
    50_000.0
}

fn default_min_liquidity() -> f64 {
    5.0
}

fn default_take_profit_pct() -> f64 {
    100.0
}

fn default_stop_loss_pct() -> f64 {
    30.0
}

fn default_trailing_stop_pct() -> f64 {
    10.0
}

fn default_cooldown_ms() -> u64 {
    5_000
}

fn default_max_trades_per_hour() -> u32 {
    10
}

fn default_position_check_secs() -> u64 {
    10
}

fn default_health_check_secs() -> u64 {
    60
}

fn default_health_log_sample_rate() -> f64 {
    0.2
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TradingSection {
    fn default() -> Self {
        Self {
            buy_amount_sol: default_buy_amount_sol(),
            max_slippage_pct: default_max_slippage_pct(),
            simulation_mode: default_simulation_mode(),
        }
    }
}

impl Default for FiltersSection {
    fn default() -> Self {
        Self {
            min_safety_score: default_min_safety_score(),
            min_opportunity_score: default_min_opportunity_score(),
            min_market_cap: default_min_market_cap(),
            max_market_cap: default_max_market_cap(),
            min_liquidity: default_min_liquidity(),
        }
    }
}

impl Default for ExitsSection {
    fn default() -> Self {
        Self {
            take_profit_pct: default_take_profit_pct(),
            stop_loss_pct: default_stop_loss_pct(),
            trailing_stop_pct: default_trailing_stop_pct(),
        }
    }
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            max_trades_per_hour: default_max_trades_per_hour(),
        }
    }
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            position_check_secs: default_position_check_secs(),
            health_check_secs: default_health_check_secs(),
            health_log_sample_rate: default_health_log_sample_rate(),
        }
    }
}

impl Default for RpcSection {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            private_key: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    ///
    /// Presence of the RPC endpoint and private key is deliberately not
    /// checked here: both accept environment overrides, so the controller
    /// validates the resolved values when it starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trading.buy_amount_sol <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "buy_amount_sol must be > 0, got {}",
                self.trading.buy_amount_sol
            )));
        }

        if self.trading.max_slippage_pct < 0.0 || self.trading.max_slippage_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_slippage_pct must be 0-100, got {}",
                self.trading.max_slippage_pct
            )));
        }

        if self.filters.min_safety_score > 100 {
            return Err(ConfigError::ValidationError(format!(
                "min_safety_score must be 0-100, got {}",
                self.filters.min_safety_score
            )));
        }

        if self.filters.min_opportunity_score > 100 {
            return Err(ConfigError::ValidationError(format!(
                "min_opportunity_score must be 0-100, got {}",
                self.filters.min_opportunity_score
            )));
        }

        if self.filters.min_market_cap < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_market_cap must be >= 0, got {}",
                self.filters.min_market_cap
            )));
        }

        if self.filters.max_market_cap <= self.filters.min_market_cap {
            return Err(ConfigError::ValidationError(format!(
                "max_market_cap must be greater than min_market_cap, got {} <= {}",
                self.filters.max_market_cap, self.filters.min_market_cap
            )));
        }

        if self.filters.min_liquidity < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "min_liquidity must be >= 0, got {}",
                self.filters.min_liquidity
            )));
        }

        if self.exits.take_profit_pct <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "take_profit_pct must be > 0, got {}",
                self.exits.take_profit_pct
            )));
        }

        if self.exits.stop_loss_pct <= 0.0 || self.exits.stop_loss_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "stop_loss_pct must be 0-100, got {}",
                self.exits.stop_loss_pct
            )));
        }

        if self.exits.trailing_stop_pct <= 0.0 || self.exits.trailing_stop_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "trailing_stop_pct must be 0-100, got {}",
                self.exits.trailing_stop_pct
            )));
        }

        if self.limits.max_trades_per_hour == 0 {
            return Err(ConfigError::ValidationError(format!(
                "max_trades_per_hour must be > 0, got {}",
                self.limits.max_trades_per_hour
            )));
        }

        if self.schedule.position_check_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "position_check_secs must be > 0, got {}",
                self.schedule.position_check_secs
            )));
        }

        if self.schedule.health_check_secs == 0 {
            return Err(ConfigError::ValidationError(format!(
                "health_check_secs must be > 0, got {}",
                self.schedule.health_check_secs
            )));
        }

        if self.schedule.health_log_sample_rate < 0.0 || self.schedule.health_log_sample_rate > 1.0
        {
            return Err(ConfigError::ValidationError(format!(
                "health_log_sample_rate must be 0-1, got {}",
                self.schedule.health_log_sample_rate
            )));
        }

        Ok(())
    }
}

// Conversion from Config to the gate thresholds
impl From<&Config> for crate::strategy::event_gate::GateConfig {
    fn from(config: &Config) -> Self {
        Self {
            min_safety_score: config.filters.min_safety_score,
            min_opportunity_score: config.filters.min_opportunity_score,
            min_market_cap: config.filters.min_market_cap,
            max_market_cap: config.filters.max_market_cap,
            min_liquidity: config.filters.min_liquidity,
        }
    }
}

// Conversion from Config to the position exit rules
impl From<&Config> for crate::domain::ExitRules {
    fn from(config: &Config) -> Self {
        Self {
            take_profit_pct: config.exits.take_profit_pct,
            stop_loss_pct: config.exits.stop_loss_pct,
            trailing_stop_pct: config.exits.trailing_stop_pct,
        }
    }
}

// Conversion from Config to the buy pacing rules
impl From<&Config> for crate::application::executor::PacingRules {
    fn from(config: &Config) -> Self {
        Self {
            cooldown_ms: config.limits.cooldown_ms,
            max_trades_per_hour: config.limits.max_trades_per_hour,
        }
    }
}
