//! Paper execution
//!
//! Fills buys and sells against the synthetic market with configurable
//! slippage, debiting and crediting the shared paper wallet so the
//! simulated balance stays honest.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use super::market::{PaperMarket, PaperWallet};
use crate::ports::{
    Buyer, BuyFill, BuyRequest, ExecutionError, ExecutionStatus, SellFill, SellRequest, Seller,
};

/// Buys launches with a fixed SOL amount at the market price plus slippage
pub struct PaperBuyer {
    market: Arc<PaperMarket>,
    wallet: Arc<PaperWallet>,
    buy_amount_sol: f64,
    slippage_bps: u16,
    stopped: AtomicBool,
    fills: AtomicU64,
    failures: AtomicU64,
}

impl PaperBuyer {
    pub fn new(
        market: Arc<PaperMarket>,
        wallet: Arc<PaperWallet>,
        buy_amount_sol: f64,
        slippage_bps: u16,
    ) -> Self {
        Self {
            market,
            wallet,
            buy_amount_sol,
            slippage_bps,
            stopped: AtomicBool::new(false),
            fills: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Buyer for PaperBuyer {
    async fn execute_buy(&self, request: &BuyRequest) -> Result<BuyFill, ExecutionError> {
        if self.stopped.load(Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::EmergencyStopped);
        }

        let price = self
            .market
            .price(&request.token_address)
            .await
            .unwrap_or(request.analysis.metrics.price);
        if price <= 0.0 {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::Rejected("price unavailable".to_string()));
        }

        if let Err(available) = self.wallet.debit(self.buy_amount_sol).await {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::InsufficientBalance {
                needed: self.buy_amount_sol,
                available,
            });
        }

        // Buy fills at a worse price
        let slippage_mult = 1.0 + (self.slippage_bps as f64 / 10000.0);
        let effective_price = price * slippage_mult;
        let amount = self.buy_amount_sol / effective_price;

        let fill_number = self.fills.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "[PAPER] BUY {:.4} {} @ {:.8} SOL = {:.4} SOL (slippage: {}bps)",
            amount,
            request.analysis.token.symbol,
            effective_price,
            self.buy_amount_sol,
            self.slippage_bps
        );

        Ok(BuyFill {
            amount,
            price: effective_price,
            total_value: self.buy_amount_sol,
            signature: format!("paper-buy-{}", fill_number),
        })
    }

    async fn emergency_stop(&self) -> Result<(), ExecutionError> {
        self.stopped.store(true, Ordering::SeqCst);
        info!("Paper buyer halted");
        Ok(())
    }

    async fn resume(&self) -> Result<(), ExecutionError> {
        if self.stopped.swap(false, Ordering::SeqCst) {
            info!("Paper buyer resumed");
        }
        Ok(())
    }

    async fn status(&self) -> ExecutionStatus {
        ExecutionStatus {
            fills: self.fills.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            emergency_stopped: self.stopped.load(Ordering::SeqCst),
            simulation: true,
        }
    }
}

/// Sells holdings at the market price minus slippage
pub struct PaperSeller {
    market: Arc<PaperMarket>,
    wallet: Arc<PaperWallet>,
    slippage_bps: u16,
    stopped: AtomicBool,
    fills: AtomicU64,
    failures: AtomicU64,
}

impl PaperSeller {
    pub fn new(market: Arc<PaperMarket>, wallet: Arc<PaperWallet>, slippage_bps: u16) -> Self {
        Self {
            market,
            wallet,
            slippage_bps,
            stopped: AtomicBool::new(false),
            fills: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl Seller for PaperSeller {
    async fn execute_sell(&self, request: &SellRequest) -> Result<SellFill, ExecutionError> {
        if self.stopped.load(Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::EmergencyStopped);
        }
        if request.amount <= 0.0 {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::Rejected(format!(
                "invalid sell amount {}",
                request.amount
            )));
        }

        let price = self
            .market
            .price(&request.token_address)
            .await
            .unwrap_or(request.current_price);
        if price <= 0.0 {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::Rejected("price unavailable".to_string()));
        }

        // Sell fills at a worse price
        let slippage_mult = 1.0 - (self.slippage_bps as f64 / 10000.0);
        let effective_price = price * slippage_mult;
        let proceeds = request.amount * effective_price;
        self.wallet.credit(proceeds).await;

        let fill_number = self.fills.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "[PAPER] SELL {:.4} {} @ {:.8} SOL = {:.4} SOL (slippage: {}bps)",
            request.amount,
            request.token_symbol,
            effective_price,
            proceeds,
            self.slippage_bps
        );

        Ok(SellFill {
            amount: request.amount,
            price: effective_price,
            total_value: proceeds,
            signature: format!("paper-sell-{}", fill_number),
        })
    }

    async fn emergency_stop(&self) -> Result<(), ExecutionError> {
        self.stopped.store(true, Ordering::SeqCst);
        info!("Paper seller halted");
        Ok(())
    }

    async fn resume(&self) -> Result<(), ExecutionError> {
        if self.stopped.swap(false, Ordering::SeqCst) {
            info!("Paper seller resumed");
        }
        Ok(())
    }

    async fn status(&self) -> ExecutionStatus {
        ExecutionStatus {
            fills: self.fills.load(Ordering::SeqCst),
            failures: self.failures.load(Ordering::SeqCst),
            emergency_stopped: self.stopped.load(Ordering::SeqCst),
            simulation: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::mocks::sample_analysis;
    use approx::assert_relative_eq;

    fn buy_request(token: &str) -> BuyRequest {
        let analysis = sample_analysis(token);
        BuyRequest {
            token_address: token.to_string(),
            bonding_curve_address: format!("curve-{}", token),
            analysis,
        }
    }

    #[tokio::test]
    async fn test_buy_applies_slippage_and_debits_wallet() {
        let market = Arc::new(PaperMarket::new());
        let wallet = Arc::new(PaperWallet::new(1.0));
        market.seed("mint1", 0.0001).await;
        // 50 bps slippage on a 0.1 SOL buy
        let buyer = PaperBuyer::new(market, wallet.clone(), 0.1, 50);

        let fill = buyer.execute_buy(&buy_request("mint1")).await.unwrap();

        assert_relative_eq!(fill.price, 0.0001 * 1.005);
        assert_relative_eq!(fill.amount, 0.1 / (0.0001 * 1.005));
        assert_relative_eq!(fill.total_value, 0.1);
        assert_relative_eq!(wallet.balance().await, 0.9);
    }

    #[tokio::test]
    async fn test_buy_rejected_on_insufficient_balance() {
        let market = Arc::new(PaperMarket::new());
        let wallet = Arc::new(PaperWallet::new(0.05));
        market.seed("mint1", 0.0001).await;
        let buyer = PaperBuyer::new(market, wallet, 0.1, 50);

        let result = buyer.execute_buy(&buy_request("mint1")).await;

        assert!(matches!(
            result,
            Err(ExecutionError::InsufficientBalance { .. })
        ));
        assert_eq!(buyer.status().await.failures, 1);
    }

    #[tokio::test]
    async fn test_sell_applies_slippage_and_credits_wallet() {
        let market = Arc::new(PaperMarket::new());
        let wallet = Arc::new(PaperWallet::new(0.0));
        market.seed("mint1", 0.0002).await;
        let seller = PaperSeller::new(market, wallet.clone(), 50);

        let request = SellRequest {
            token_address: "mint1".to_string(),
            token_symbol: "PPR1".to_string(),
            amount: 1000.0,
            current_price: 0.0002,
        };
        let fill = seller.execute_sell(&request).await.unwrap();

        assert_relative_eq!(fill.price, 0.0002 * 0.995);
        assert_relative_eq!(fill.total_value, 1000.0 * 0.0002 * 0.995);
        assert_relative_eq!(wallet.balance().await, fill.total_value);
    }

    #[tokio::test]
    async fn test_emergency_stop_blocks_fills() {
        let market = Arc::new(PaperMarket::new());
        let wallet = Arc::new(PaperWallet::new(1.0));
        market.seed("mint1", 0.0001).await;
        let buyer = PaperBuyer::new(market.clone(), wallet.clone(), 0.1, 50);
        let seller = PaperSeller::new(market, wallet.clone(), 50);

        buyer.emergency_stop().await.unwrap();
        seller.emergency_stop().await.unwrap();

        let result = buyer.execute_buy(&buy_request("mint1")).await;
        assert!(matches!(result, Err(ExecutionError::EmergencyStopped)));

        let request = SellRequest {
            token_address: "mint1".to_string(),
            token_symbol: "PPR1".to_string(),
            amount: 10.0,
            current_price: 0.0001,
        };
        let result = seller.execute_sell(&request).await;
        assert!(matches!(result, Err(ExecutionError::EmergencyStopped)));

        // Nothing moved
        assert_relative_eq!(wallet.balance().await, 1.0);
    }

    #[tokio::test]
    async fn test_resume_lifts_emergency_stop() {
        let market = Arc::new(PaperMarket::new());
        let wallet = Arc::new(PaperWallet::new(1.0));
        market.seed("mint1", 0.0001).await;
        let buyer = PaperBuyer::new(market, wallet, 0.1, 50);

        buyer.emergency_stop().await.unwrap();
        assert!(buyer.status().await.emergency_stopped);

        buyer.resume().await.unwrap();
        assert!(!buyer.status().await.emergency_stopped);

        let fill = buyer.execute_buy(&buy_request("mint1")).await.unwrap();
        assert!(fill.amount > 0.0);

        // Resuming an already-running buyer is harmless
        buyer.resume().await.unwrap();
    }
}
