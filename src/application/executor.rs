//! Trade Executor
//!
//! Hands an accepted launch to the buy collaborator and registers the
//! resulting position. A single trade lock serializes buys, and pacing
//! rules (cooldown plus a rolling hourly cap) run before any SOL is
//! committed. A failed buy consumes no pacing budget.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::positions::PositionManager;
use crate::domain::{Clock, ExitRules, Position, PositionError};
use crate::ports::{Buyer, BuyRequest, ExecutionError, TokenAnalysis};

/// Buy pacing limits
#[derive(Debug, Clone, Copy)]
pub struct PacingRules {
    /// Minimum milliseconds between buys
    pub cooldown_ms: u64,
    /// Rolling one-hour buy cap
    pub max_trades_per_hour: u32,
}

impl Default for PacingRules {
    fn default() -> Self {
        Self {
            cooldown_ms: 5_000,
            max_trades_per_hour: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Another buy is already in flight")]
    TradeLockBusy,
    #[error("Already holding a position in {0}")]
    AlreadyHolding(String),
    #[error("Buy cooldown active for another {0} ms")]
    CooldownActive(u64),
    #[error("Hourly cap of {0} trades reached")]
    HourlyCapReached(u32),
    #[error("Buy failed: {0}")]
    BuyFailed(#[from] ExecutionError),
    #[error("Position error: {0}")]
    Position(#[from] PositionError),
}

impl ExecutorError {
    /// Pacing refusals are expected traffic shaping, not faults
    pub fn is_pacing(&self) -> bool {
        matches!(
            self,
            ExecutorError::TradeLockBusy
                | ExecutorError::AlreadyHolding(_)
                | ExecutorError::CooldownActive(_)
                | ExecutorError::HourlyCapReached(_)
        )
    }
}

struct PacingState {
    last_buy: Option<DateTime<Utc>>,
    window: VecDeque<DateTime<Utc>>,
}

/// Turns accepted launches into open positions
pub struct TradeExecutor {
    buyer: Arc<dyn Buyer>,
    positions: Arc<PositionManager>,
    clock: Arc<dyn Clock>,
    rules: PacingRules,
    exit_rules: ExitRules,
    trade_lock: Mutex<PacingState>,
}

impl TradeExecutor {
    pub fn new(
        buyer: Arc<dyn Buyer>,
        positions: Arc<PositionManager>,
        clock: Arc<dyn Clock>,
        rules: PacingRules,
        exit_rules: ExitRules,
    ) -> Self {
        Self {
            buyer,
            positions,
            clock,
            rules,
            exit_rules,
            trade_lock: Mutex::new(PacingState {
                last_buy: None,
                window: VecDeque::new(),
            }),
        }
    }

    /// Buy an accepted launch and open the resulting position
    pub async fn open_trade(&self, analysis: &TokenAnalysis) -> Result<Position, ExecutorError> {
        // Never wait on the lock: a contending event simply loses its slot
        let mut pacing = self
            .trade_lock
            .try_lock()
            .map_err(|_| ExecutorError::TradeLockBusy)?;

        let token_address = &analysis.token.address;
        if self.positions.contains(token_address).await {
            return Err(ExecutorError::AlreadyHolding(token_address.clone()));
        }

        let now = self.clock.now();
        if let Some(last) = pacing.last_buy {
            let elapsed = (now - last).num_milliseconds();
            let cooldown = self.rules.cooldown_ms as i64;
            if elapsed < cooldown {
                return Err(ExecutorError::CooldownActive(
                    (cooldown - elapsed).max(0) as u64,
                ));
            }
        }

        let hour_ago = now - Duration::hours(1);
        while pacing.window.front().is_some_and(|t| *t < hour_ago) {
            pacing.window.pop_front();
        }
        if pacing.window.len() >= self.rules.max_trades_per_hour as usize {
            return Err(ExecutorError::HourlyCapReached(self.rules.max_trades_per_hour));
        }

        let request = BuyRequest {
            token_address: token_address.clone(),
            bonding_curve_address: analysis.bonding_curve.address.clone(),
            analysis: analysis.clone(),
        };
        let fill = self.buyer.execute_buy(&request).await?;

        pacing.last_buy = Some(now);
        pacing.window.push_back(now);

        tracing::info!(
            "Bought {:.4} {} at {:.8} [{}]",
            fill.amount,
            analysis.token.symbol,
            fill.price,
            fill.signature
        );

        let position = Position::open(
            token_address.clone(),
            analysis.token.symbol.clone(),
            fill.amount,
            fill.price,
            &self.exit_rules,
            now,
        )?;
        self.positions.add_position(position.clone()).await;

        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManualClock;
    use crate::ports::mocks::{sample_analysis, MockBuyer, MockPriceSource, MockSeller};
    use approx::assert_relative_eq;
    use chrono::Utc;

    fn test_rules() -> ExitRules {
        ExitRules {
            take_profit_pct: 100.0,
            stop_loss_pct: 30.0,
            trailing_stop_pct: 10.0,
        }
    }

    fn executor(
        pacing: PacingRules,
    ) -> (TradeExecutor, Arc<MockBuyer>, Arc<PositionManager>, Arc<ManualClock>) {
        let buyer = Arc::new(MockBuyer::new());
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let positions = Arc::new(PositionManager::new(
            Arc::new(MockSeller::new()),
            Arc::new(MockPriceSource::new()),
            clock.clone(),
            test_rules(),
        ));
        let executor = TradeExecutor::new(
            buyer.clone(),
            positions.clone(),
            clock.clone(),
            pacing,
            test_rules(),
        );
        (executor, buyer, positions, clock)
    }

    #[tokio::test]
    async fn test_buy_opens_position_with_derived_exits() {
        let (executor, buyer, positions, _) = executor(PacingRules::default());
        let analysis = sample_analysis("mint1");

        let position = executor.open_trade(&analysis).await.unwrap();

        assert_relative_eq!(position.entry_price, 1.0);
        assert_relative_eq!(position.take_profit_price, 2.0);
        assert_relative_eq!(position.stop_loss_price, 0.7);
        assert_relative_eq!(position.amount, 1000.0);
        assert!(positions.contains("mint1").await);
        assert_eq!(buyer.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_token_is_refused() {
        let (executor, buyer, _, clock) = executor(PacingRules::default());
        let analysis = sample_analysis("mint1");

        executor.open_trade(&analysis).await.unwrap();
        clock.advance(Duration::milliseconds(10_000));

        let result = executor.open_trade(&analysis).await;
        assert!(matches!(result, Err(ExecutorError::AlreadyHolding(_))));
        assert_eq!(buyer.calls().await.len(), 1);
    }

    #[tokio::test]
    async fn test_cooldown_blocks_back_to_back_buys() {
        let (executor, buyer, _, clock) = executor(PacingRules::default());

        executor.open_trade(&sample_analysis("mint1")).await.unwrap();

        let result = executor.open_trade(&sample_analysis("mint2")).await;
        assert!(matches!(result, Err(ExecutorError::CooldownActive(_))));

        clock.advance(Duration::milliseconds(5_000));
        executor.open_trade(&sample_analysis("mint2")).await.unwrap();
        assert_eq!(buyer.calls().await.len(), 2);
    }

    #[tokio::test]
    async fn test_hourly_cap() {
        let pacing = PacingRules {
            cooldown_ms: 0,
            max_trades_per_hour: 2,
        };
        let (executor, _, _, clock) = executor(pacing);

        executor.open_trade(&sample_analysis("mint1")).await.unwrap();
        executor.open_trade(&sample_analysis("mint2")).await.unwrap();

        let result = executor.open_trade(&sample_analysis("mint3")).await;
        assert!(matches!(result, Err(ExecutorError::HourlyCapReached(2))));

        // The window rolls, so an hour later there is budget again
        clock.advance(Duration::minutes(61));
        executor.open_trade(&sample_analysis("mint3")).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_buy_consumes_no_pacing_budget() {
        let (executor, buyer, positions, _) = executor(PacingRules::default());

        buyer.fail_next();
        let result = executor.open_trade(&sample_analysis("mint1")).await;
        assert!(matches!(result, Err(ExecutorError::BuyFailed(_))));
        assert!(!positions.contains("mint1").await);

        // No cooldown was started by the failed attempt
        executor.open_trade(&sample_analysis("mint1")).await.unwrap();
        assert_eq!(buyer.calls().await.len(), 2);
    }
}
