//! Shared synthetic market state
//!
//! One price book and one simulated wallet shared by every paper adapter,
//! so buys, sells, balance reports and exit checks all see the same data.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;

use crate::ports::{MarketDataError, PriceSource};

/// Width of the uniform per-read price walk (0.1 = plus/minus 5%)
const DEFAULT_WALK_SPAN: f64 = 0.1;

/// In-memory price book for fabricated tokens
pub struct PaperMarket {
    prices: RwLock<HashMap<String, f64>>,
}

impl PaperMarket {
    pub fn new() -> Self {
        Self {
            prices: RwLock::new(HashMap::new()),
        }
    }

    /// Register a token at its launch price
    pub async fn seed(&self, token_address: &str, price: f64) {
        self.prices
            .write()
            .await
            .insert(token_address.to_string(), price);
    }

    pub async fn price(&self, token_address: &str) -> Option<f64> {
        self.prices.read().await.get(token_address).copied()
    }

    /// Apply one random walk step and return the new price
    pub async fn walk(&self, token_address: &str, span: f64) -> Option<f64> {
        let mut prices = self.prices.write().await;
        let price = prices.get_mut(token_address)?;
        let factor = 1.0 + (rand::thread_rng().gen::<f64>() - 0.5) * span;
        *price = (*price * factor).max(f64::MIN_POSITIVE);
        Some(*price)
    }
}

impl Default for PaperMarket {
    fn default() -> Self {
        Self::new()
    }
}

/// Simulated SOL balance shared by the paper buyer, seller and RPC
pub struct PaperWallet {
    balance: RwLock<f64>,
}

impl PaperWallet {
    pub fn new(initial_sol: f64) -> Self {
        Self {
            balance: RwLock::new(initial_sol),
        }
    }

    pub async fn balance(&self) -> f64 {
        *self.balance.read().await
    }

    /// Withdraw, or report the available balance on a shortfall
    pub async fn debit(&self, amount: f64) -> Result<(), f64> {
        let mut balance = self.balance.write().await;
        if *balance < amount {
            return Err(*balance);
        }
        *balance -= amount;
        Ok(())
    }

    pub async fn credit(&self, amount: f64) {
        *self.balance.write().await += amount;
    }
}

/// Price source that walks the paper market on every read
pub struct DriftingPriceSource {
    market: Arc<PaperMarket>,
    walk_span: f64,
}

impl DriftingPriceSource {
    pub fn new(market: Arc<PaperMarket>) -> Self {
        Self {
            market,
            walk_span: DEFAULT_WALK_SPAN,
        }
    }

    pub fn with_walk_span(mut self, span: f64) -> Self {
        self.walk_span = span;
        self
    }
}

#[async_trait]
impl PriceSource for DriftingPriceSource {
    async fn current_price(&self, token_address: &str) -> Result<f64, MarketDataError> {
        self.market
            .walk(token_address, self.walk_span)
            .await
            .ok_or_else(|| MarketDataError::PriceUnavailable(token_address.to_string()))
    }
}
