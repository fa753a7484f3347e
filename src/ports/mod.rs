//! Ports Layer - Trait definitions for external collaborators
//!
//! This module defines the interfaces (ports) that adapters must implement.
//! Following hexagonal architecture, these traits abstract:
//! - Launch event monitoring (on-chain log subscription)
//! - Token analysis and independent safety checks
//! - Trade execution (buy and sell submission)
//! - Chain RPC access (balance, connectivity)
//! - Spot price lookup

pub mod analysis;
pub mod execution;
pub mod market_data;
pub mod mocks;
pub mod models;
pub mod monitor;
pub mod rpc;

pub use analysis::{AnalysisError, SafetyChecker, TokenValidator};
pub use execution::{Buyer, ExecutionError, Seller};
pub use market_data::{MarketDataError, PriceSource};
pub use models::{
    BondingCurveInfo, BuyFill, BuyRequest, ExecutionStatus, LaunchEvent, MonitorHealth,
    OpportunityScore, SafetyScore, SafetyStats, SafetyVerdict, SellFill, SellRequest,
    TokenAnalysis, TokenInfo, TokenMetrics,
};
pub use monitor::{LaunchMonitor, MonitorError};
pub use rpc::{RpcError, RpcPort};
