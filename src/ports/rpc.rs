//! RPC client port
//!
//! Narrow view of the chain RPC client: the core only needs the wallet
//! balance and a connectivity probe. Everything else the collaborators do
//! with RPC stays behind their own ports.

use async_trait::async_trait;
use thiserror::Error;

/// RPC error type
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("RPC request timed out")]
    Timeout,

    #[error("RPC returned an error: {0}")]
    Response(String),
}

/// RPC client port trait
#[async_trait]
pub trait RpcPort: Send + Sync {
    /// SOL balance of the trading wallet
    async fn get_balance(&self) -> Result<f64, RpcError>;

    /// Connectivity probe, Ok when the endpoint answers
    async fn health_check(&self) -> Result<(), RpcError>;
}
