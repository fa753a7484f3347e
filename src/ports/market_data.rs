//! Market data port
//!
//! Spot price lookup used by the position loop to refresh open positions.

use async_trait::async_trait;
use thiserror::Error;

/// Market data error type
#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("No price available for {0}")]
    PriceUnavailable(String),

    #[error("Market data backend error: {0}")]
    Backend(String),
}

/// Price source port trait
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Current price per token in SOL
    async fn current_price(&self, token_address: &str) -> Result<f64, MarketDataError>;
}
