//! Position Manager
//!
//! Owns every position the bot holds and drives the automated-sell loop:
//! refresh the price, evaluate exit rules, sell, finalize. A position with
//! a sell in flight is marked Closing so no tick can issue a second sell
//! for it. Closed positions are kept for reporting.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::domain::{Clock, ExitRules, Position, PositionStatus};
use crate::ports::{PriceSource, SellFill, SellRequest, Seller};

/// Aggregate view over the position book
#[derive(Debug, Clone, Default, Serialize)]
pub struct PositionStats {
    pub open: usize,
    pub closing: usize,
    pub closed: usize,
    /// Summed P&L of positions still held, in SOL
    pub unrealized_pnl: f64,
    /// Summed P&L of closed positions, in SOL
    pub realized_pnl: f64,
}

/// Tracks open positions and closes them when an exit rule fires
pub struct PositionManager {
    open: RwLock<HashMap<String, Position>>,
    closed: RwLock<Vec<Position>>,
    seller: Arc<dyn Seller>,
    price_source: Arc<dyn PriceSource>,
    clock: Arc<dyn Clock>,
    exit_rules: ExitRules,
}

impl PositionManager {
    pub fn new(
        seller: Arc<dyn Seller>,
        price_source: Arc<dyn PriceSource>,
        clock: Arc<dyn Clock>,
        exit_rules: ExitRules,
    ) -> Self {
        Self {
            open: RwLock::new(HashMap::new()),
            closed: RwLock::new(Vec::new()),
            seller,
            price_source,
            clock,
            exit_rules,
        }
    }

    /// Register a freshly opened position, keyed by token address
    pub async fn add_position(&self, position: Position) {
        let mut open = self.open.write().await;
        if let Some(previous) = open.insert(position.token_address.clone(), position) {
            tracing::warn!(
                "Replaced tracked position for {}",
                previous.token_address
            );
        }
    }

    pub async fn contains(&self, token_address: &str) -> bool {
        self.open.read().await.contains_key(token_address)
    }

    pub async fn open_positions(&self) -> Vec<Position> {
        self.open.read().await.values().cloned().collect()
    }

    pub async fn closed_positions(&self) -> Vec<Position> {
        self.closed.read().await.clone()
    }

    pub async fn stats(&self) -> PositionStats {
        let mut stats = PositionStats::default();
        {
            let open = self.open.read().await;
            for position in open.values() {
                match position.status {
                    PositionStatus::Closing => stats.closing += 1,
                    _ => stats.open += 1,
                }
                stats.unrealized_pnl += position.pnl;
            }
        }
        let closed = self.closed.read().await;
        stats.closed = closed.len();
        stats.realized_pnl = closed.iter().map(|p| p.pnl).sum();
        stats
    }

    /// Run one exit-management pass over every open position
    ///
    /// Positions are processed one at a time; a failure on one position
    /// never stops the pass.
    pub async fn tick(&self) {
        let candidates: Vec<String> = {
            let open = self.open.read().await;
            open.values()
                .filter(|p| p.status == PositionStatus::Open)
                .map(|p| p.token_address.clone())
                .collect()
        };

        for token_address in candidates {
            self.check_position(&token_address).await;
        }
    }

    async fn check_position(&self, token_address: &str) {
        let price = match self.price_source.current_price(token_address).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("Price unavailable for {}: {}", token_address, e);
                return;
            }
        };

        // Reprice and evaluate under the lock; the sell itself runs
        // without it so a slow fill cannot stall readers.
        let request = {
            let mut open = self.open.write().await;
            let Some(position) = open.get_mut(token_address) else {
                return;
            };
            if position.status != PositionStatus::Open {
                return;
            }
            position.update_price(price, self.clock.now());

            let Some(trigger) = position.check_exit(self.exit_rules.trailing_stop_pct) else {
                return;
            };
            if position.begin_close(trigger).is_err() {
                return;
            }
            tracing::info!(
                "{} triggered for {}: price {:.8} (entry {:.8}, peak {:.8})",
                trigger,
                position.token_symbol,
                price,
                position.entry_price,
                position.highest_price
            );
            SellRequest {
                token_address: position.token_address.clone(),
                token_symbol: position.token_symbol.clone(),
                amount: position.amount,
                current_price: price,
            }
        };

        match self.seller.execute_sell(&request).await {
            Ok(fill) => self.finalize_close(token_address, fill).await,
            Err(e) => {
                tracing::error!("Sell failed for {}: {}", token_address, e);
                self.reopen(token_address).await;
            }
        }
    }

    async fn finalize_close(&self, token_address: &str, fill: SellFill) {
        let position = {
            let mut open = self.open.write().await;
            let Some(mut position) = open.remove(token_address) else {
                return;
            };
            if position.confirm_close(fill.price, self.clock.now()).is_err() {
                // Not in Closing, put it back untouched
                open.insert(token_address.to_string(), position);
                return;
            }
            position
        };

        tracing::info!(
            "Closed {} via {}: pnl {:.4} SOL ({:+.2}%) [{}]",
            position.token_symbol,
            position
                .closed_by
                .map(|t| t.to_string())
                .unwrap_or_else(|| "manual".to_string()),
            position.pnl,
            position.pnl_percentage,
            fill.signature
        );
        self.closed.write().await.push(position);
    }

    async fn reopen(&self, token_address: &str) {
        let mut open = self.open.write().await;
        if let Some(position) = open.get_mut(token_address) {
            if position.revert_close().is_ok() {
                tracing::info!(
                    "Position {} back to open, retrying next tick",
                    position.token_symbol
                );
            }
        }
    }
}
