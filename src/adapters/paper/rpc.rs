//! Paper RPC client
//!
//! Reports the paper wallet balance and always passes the connectivity
//! probe, standing in for a real RPC endpoint during simulation runs.

use std::sync::Arc;

use async_trait::async_trait;

use super::market::PaperWallet;
use crate::ports::{RpcError, RpcPort};

pub struct PaperRpc {
    wallet: Arc<PaperWallet>,
}

impl PaperRpc {
    pub fn new(wallet: Arc<PaperWallet>) -> Self {
        Self { wallet }
    }
}

#[async_trait]
impl RpcPort for PaperRpc {
    async fn get_balance(&self) -> Result<f64, RpcError> {
        Ok(self.wallet.balance().await)
    }

    async fn health_check(&self) -> Result<(), RpcError> {
        Ok(())
    }
}
