//! Common data structures crossing the port boundary
//!
//! Everything here is produced by collaborators (monitor, validator,
//! safety checker, executors) and consumed read-only by the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification that a new tradable token has appeared on-chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchEvent {
    /// Mint address of the launched token
    pub token_address: String,

    /// Bonding curve account controlling the token's price
    pub bonding_curve_address: String,

    /// Wallet that created the token
    pub creator: String,

    /// Detection timestamp
    pub timestamp: DateTime<Utc>,
}

/// Basic token identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Mint address
    pub address: String,

    /// Token symbol
    pub symbol: String,

    /// Creator wallet
    pub creator: String,
}

/// Bonding curve identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BondingCurveInfo {
    /// Curve account address
    pub address: String,
}

/// Market metrics at analysis time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenMetrics {
    /// Market capitalization in USD
    pub market_cap: f64,

    /// Pooled liquidity in SOL
    pub liquidity: f64,

    /// Current price per token in SOL
    pub price: f64,
}

/// Rug-pull risk summary, score 0-100 (higher is safer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyScore {
    pub score: u32,
}

/// Upside potential summary, score 0-100 (higher is better)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpportunityScore {
    pub score: u32,
}

/// Full analysis of a launched token, produced by the validator collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAnalysis {
    pub token: TokenInfo,
    pub bonding_curve: BondingCurveInfo,
    pub metrics: TokenMetrics,
    pub safety: SafetyScore,
    pub opportunity: OpportunityScore,
}

/// Verdict from the independent safety checker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyVerdict {
    /// Whether the token passed all blacklist and safety checks
    pub passed: bool,

    /// Reasons for a failed verdict, empty on pass
    pub reasons: Vec<String>,
}

/// Buy order handed to the buy collaborator
#[derive(Debug, Clone)]
pub struct BuyRequest {
    pub token_address: String,
    pub bonding_curve_address: String,
    pub analysis: TokenAnalysis,
}

/// Successful buy execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyFill {
    /// Token quantity acquired
    pub amount: f64,

    /// Effective price per token in SOL
    pub price: f64,

    /// SOL spent including slippage
    pub total_value: f64,

    /// Transaction signature (synthetic in simulation mode)
    pub signature: String,
}

/// Sell order for one open position
#[derive(Debug, Clone)]
pub struct SellRequest {
    pub token_address: String,
    pub token_symbol: String,

    /// Token quantity to liquidate
    pub amount: f64,

    /// Last observed price, used as the execution reference
    pub current_price: f64,
}

/// Successful sell execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellFill {
    /// Token quantity sold
    pub amount: f64,

    /// Effective price per token in SOL
    pub price: f64,

    /// SOL received after slippage
    pub total_value: f64,

    /// Transaction signature (synthetic in simulation mode)
    pub signature: String,
}

/// Monitor health snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorHealth {
    /// Whether the subscription is live
    pub active: bool,

    /// Launch events emitted since start
    pub events_emitted: u64,

    /// Timestamp of the most recent event
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Buyer/seller health snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStatus {
    /// Orders filled since start
    pub fills: u64,

    /// Orders that failed since start
    pub failures: u64,

    /// Whether an emergency stop is in effect
    pub emergency_stopped: bool,

    /// Whether fills are simulated
    pub simulation: bool,
}

/// Safety checker snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyStats {
    /// Checks performed since start
    pub checks_performed: u64,

    /// Tokens that failed a check
    pub tokens_rejected: u64,

    /// Creators currently blacklisted
    pub blacklisted_creators: usize,
}
