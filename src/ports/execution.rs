//! Trade execution ports
//!
//! Buy and sell collaborators build, sign and submit the actual
//! transactions. The core hands them a request and handles both result
//! branches; retry and backoff policy belongs on their side of the
//! boundary.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{BuyFill, BuyRequest, ExecutionStatus, SellFill, SellRequest};

/// Execution error type
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Insufficient balance: need {needed:.4} SOL, have {available:.4} SOL")]
    InsufficientBalance { needed: f64, available: f64 },

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Emergency stop is active")]
    EmergencyStopped,
}

/// Buy collaborator port trait
#[async_trait]
pub trait Buyer: Send + Sync {
    /// Execute a buy for a gated launch
    async fn execute_buy(&self, request: &BuyRequest) -> Result<BuyFill, ExecutionError>;

    /// Cancel in-flight buys and refuse new ones, safe when idle
    async fn emergency_stop(&self) -> Result<(), ExecutionError>;

    /// Lift an emergency stop so new buys fill again, safe when not stopped
    async fn resume(&self) -> Result<(), ExecutionError>;

    /// Snapshot for the health loop
    async fn status(&self) -> ExecutionStatus;
}

/// Sell collaborator port trait
#[async_trait]
pub trait Seller: Send + Sync {
    /// Execute one close attempt for one open position
    async fn execute_sell(&self, request: &SellRequest) -> Result<SellFill, ExecutionError>;

    /// Cancel in-flight sells and refuse new ones, safe when idle
    async fn emergency_stop(&self) -> Result<(), ExecutionError>;

    /// Lift an emergency stop so new sells fill again, safe when not stopped
    async fn resume(&self) -> Result<(), ExecutionError>;

    /// Snapshot for the health loop
    async fn status(&self) -> ExecutionStatus;
}
