//! Bot Controller
//!
//! Owns the bot lifecycle. `start` validates configuration, probes the
//! RPC endpoint, subscribes to launches and spawns the background loops;
//! `stop` tears it all down and never fails. Pausing keeps the loops
//! alive but drops inbound launches and skips exit checks.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::application::executor::{ExecutorError, PacingRules, TradeExecutor};
use crate::application::health::HealthMonitor;
use crate::application::positions::{PositionManager, PositionStats};
use crate::config::Config;
use crate::domain::{Clock, ExitRules};
use crate::ports::{
    Buyer, ExecutionError, ExecutionStatus, LaunchEvent, LaunchMonitor, MonitorError,
    MonitorHealth, PriceSource, RpcError, RpcPort, SafetyChecker, Seller, TokenValidator,
};
use crate::strategy::{EventGate, GateConfig, GateDecision};

/// Lifecycle state of the bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BotState {
    Stopped,
    Active,
    Paused,
}

impl fmt::Display for BotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotState::Stopped => write!(f, "stopped"),
            BotState::Active => write!(f, "active"),
            BotState::Paused => write!(f, "paused"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("Bot is already running")]
    AlreadyRunning,
    #[error("Cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: BotState,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("RPC endpoint unreachable: {0}")]
    RpcUnreachable(#[from] RpcError),
    #[error("Launch subscription failed: {0}")]
    SubscriptionFailed(#[from] MonitorError),
    #[error("Could not re-arm executors: {0}")]
    ExecutorRearm(#[from] ExecutionError),
}

/// External collaborators the controller is wired with
pub struct BotDeps {
    pub monitor: Arc<dyn LaunchMonitor>,
    pub validator: Arc<dyn TokenValidator>,
    pub safety: Arc<dyn SafetyChecker>,
    pub buyer: Arc<dyn Buyer>,
    pub seller: Arc<dyn Seller>,
    pub rpc: Arc<dyn RpcPort>,
    pub price_source: Arc<dyn PriceSource>,
    pub clock: Arc<dyn Clock>,
}

/// Point-in-time snapshot for status reporting
#[derive(Debug, Clone, Serialize)]
pub struct BotStatus {
    pub state: BotState,
    pub simulation: bool,
    pub positions: PositionStats,
    pub monitor: MonitorHealth,
    pub buyer: ExecutionStatus,
    pub seller: ExecutionStatus,
}

/// Drives the start/stop/pause state machine and the background loops
pub struct BotController {
    config: Arc<Config>,
    state: Arc<RwLock<BotState>>,
    monitor: Arc<dyn LaunchMonitor>,
    validator: Arc<dyn TokenValidator>,
    gate: Arc<EventGate>,
    executor: Arc<TradeExecutor>,
    positions: Arc<PositionManager>,
    health: Arc<HealthMonitor>,
    rpc: Arc<dyn RpcPort>,
    buyer: Arc<dyn Buyer>,
    seller: Arc<dyn Seller>,
    /// Present exactly while the bot is running; also serializes start/stop
    shutdown: Mutex<Option<watch::Sender<bool>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl BotController {
    pub fn new(config: Config, deps: BotDeps) -> Self {
        let config = Arc::new(config);
        let exit_rules = ExitRules::from(config.as_ref());

        let positions = Arc::new(PositionManager::new(
            deps.seller.clone(),
            deps.price_source.clone(),
            deps.clock.clone(),
            exit_rules,
        ));
        let executor = Arc::new(TradeExecutor::new(
            deps.buyer.clone(),
            positions.clone(),
            deps.clock.clone(),
            PacingRules::from(config.as_ref()),
            exit_rules,
        ));
        let gate = Arc::new(EventGate::new(
            GateConfig::from(config.as_ref()),
            deps.safety.clone(),
        ));
        let health = Arc::new(HealthMonitor::new(
            deps.rpc.clone(),
            deps.monitor.clone(),
            deps.buyer.clone(),
            deps.seller.clone(),
            deps.safety.clone(),
            positions.clone(),
            deps.clock.clone(),
            config.schedule.health_log_sample_rate,
        ));

        Self {
            config,
            state: Arc::new(RwLock::new(BotState::Stopped)),
            monitor: deps.monitor,
            validator: deps.validator,
            gate,
            executor,
            positions,
            health,
            rpc: deps.rpc,
            buyer: deps.buyer,
            seller: deps.seller,
            shutdown: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Validate configuration, subscribe to launches and go active
    ///
    /// Any validation or subscription failure propagates and leaves the
    /// bot stopped.
    pub async fn start(&self) -> Result<(), ControllerError> {
        let mut shutdown_slot = self.shutdown.lock().await;
        if shutdown_slot.is_some() {
            return Err(ControllerError::AlreadyRunning);
        }

        let rpc_url = self.config.rpc.get_rpc_url();
        if rpc_url.trim().is_empty() {
            return Err(ControllerError::ConfigError(
                "RPC_URL is required".to_string(),
            ));
        }
        let simulation = self.config.trading.simulation_enabled();
        if !simulation && self.config.rpc.get_private_key().is_none() {
            return Err(ControllerError::ConfigError(
                "PRIVATE_KEY is required when not in simulation mode".to_string(),
            ));
        }

        self.rpc.health_check().await?;
        match self.rpc.get_balance().await {
            Ok(balance) => {
                tracing::info!("Wallet balance: {:.4} SOL", balance);
                if balance < self.config.trading.buy_amount_sol {
                    tracing::warn!(
                        "Balance {:.4} SOL is below the buy amount {:.4} SOL",
                        balance,
                        self.config.trading.buy_amount_sol
                    );
                }
            }
            Err(e) => tracing::warn!("Could not fetch wallet balance: {}", e),
        }

        // A previous stop() left both executors halted; lift that before
        // any launch reaches them
        self.buyer.resume().await?;
        self.seller.resume().await?;

        let events = self.monitor.start_monitoring().await?;

        let (tx, rx) = watch::channel(false);
        {
            let mut tasks = self.tasks.lock().await;
            tasks.push(self.spawn_event_loop(events, rx.clone()));
            tasks.push(self.spawn_position_loop(rx.clone()));
            tasks.push(self.spawn_health_loop(rx));
        }
        *shutdown_slot = Some(tx);
        // Going active stays inside the critical section so a racing stop
        // cannot observe the slot and the state out of step
        *self.state.write().await = BotState::Active;
        drop(shutdown_slot);

        tracing::info!(
            "Bot started - simulation: {}, rpc: {}",
            simulation,
            rpc_url
        );
        Ok(())
    }

    /// Tear everything down; safe to call in any state, never fails
    pub async fn stop(&self) {
        // Flip the state first so in-flight event handlers drop their work
        *self.state.write().await = BotState::Stopped;

        let mut shutdown_slot = self.shutdown.lock().await;
        let Some(sender) = shutdown_slot.take() else {
            tracing::debug!("Stop requested but bot is not running");
            return;
        };
        // A start may have gone Active while we waited on the lock above
        *self.state.write().await = BotState::Stopped;

        tracing::info!("Stopping bot");
        let _ = sender.send(true);
        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().await.drain(..).collect();

        if let Err(e) = self.monitor.stop_monitoring().await {
            tracing::warn!("Failed to stop launch monitor: {}", e);
        }
        if let Err(e) = self.buyer.emergency_stop().await {
            tracing::warn!("Failed to halt buyer: {}", e);
        }
        if let Err(e) = self.seller.emergency_stop().await {
            tracing::warn!("Failed to halt seller: {}", e);
        }
        drop(shutdown_slot);

        // Only this session's tasks were drained above; the signal has
        // already told them to wind down
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!("Background task ended abnormally: {}", e);
            }
        }
        tracing::info!("Bot stopped");
    }

    /// Keep the loops alive but stop trading
    pub async fn pause(&self) -> Result<(), ControllerError> {
        let mut state = self.state.write().await;
        if *state != BotState::Active {
            return Err(ControllerError::InvalidTransition {
                action: "pause",
                state: *state,
            });
        }
        *state = BotState::Paused;
        tracing::info!("Bot paused");
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), ControllerError> {
        let mut state = self.state.write().await;
        if *state != BotState::Paused {
            return Err(ControllerError::InvalidTransition {
                action: "resume",
                state: *state,
            });
        }
        *state = BotState::Active;
        tracing::info!("Bot resumed");
        Ok(())
    }

    pub async fn state(&self) -> BotState {
        *self.state.read().await
    }

    pub async fn status(&self) -> BotStatus {
        BotStatus {
            state: self.state().await,
            simulation: self.config.trading.simulation_enabled(),
            positions: self.positions.stats().await,
            monitor: self.monitor.health().await,
            buyer: self.buyer.status().await,
            seller: self.seller.status().await,
        }
    }

    pub fn positions(&self) -> Arc<PositionManager> {
        self.positions.clone()
    }

    pub fn health(&self) -> Arc<HealthMonitor> {
        self.health.clone()
    }

    fn spawn_event_loop(
        &self,
        mut events: mpsc::Receiver<LaunchEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) -> JoinHandle<()> {
        let state = self.state.clone();
        let validator = self.validator.clone();
        let gate = self.gate.clone();
        let executor = self.executor.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    event = events.recv() => {
                        let Some(event) = event else {
                            tracing::warn!("Launch stream closed");
                            break;
                        };
                        let state = state.clone();
                        let validator = validator.clone();
                        let gate = gate.clone();
                        let executor = executor.clone();
                        tokio::spawn(async move {
                            handle_launch(event, state, validator, gate, executor).await;
                        });
                    }
                }
            }
        })
    }

    fn spawn_position_loop(&self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let state = self.state.clone();
        let positions = self.positions.clone();
        let period = Duration::from_secs(self.config.schedule.position_check_secs);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(period) => {
                        if *state.read().await == BotState::Active {
                            positions.tick().await;
                        }
                    }
                }
            }
        })
    }

    fn spawn_health_loop(&self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        let state = self.state.clone();
        let health = self.health.clone();
        let period = Duration::from_secs(self.config.schedule.health_check_secs);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(period) => {
                        // Health keeps reporting even while paused
                        let current = *state.read().await;
                        health.check(current).await;
                    }
                }
            }
        })
    }
}

/// Process one launch event end to end
///
/// Every failure is logged with the token address and contained here so
/// other in-flight events and the loops are unaffected.
async fn handle_launch(
    event: LaunchEvent,
    state: Arc<RwLock<BotState>>,
    validator: Arc<dyn TokenValidator>,
    gate: Arc<EventGate>,
    executor: Arc<TradeExecutor>,
) {
    if *state.read().await != BotState::Active {
        tracing::debug!("Dropping launch {} while not active", event.token_address);
        return;
    }
    tracing::info!(
        "New launch detected: {} (creator {})",
        event.token_address,
        event.creator
    );

    let analysis = match validator
        .analyze_token(&event.token_address, &event.bonding_curve_address)
        .await
    {
        Ok(analysis) => analysis,
        Err(e) => {
            tracing::warn!("Analysis failed for {}: {}", event.token_address, e);
            return;
        }
    };

    let decision = match gate.should_trade(&analysis).await {
        Ok(decision) => decision,
        Err(e) => {
            tracing::warn!("Safety check failed for {}: {}", event.token_address, e);
            return;
        }
    };

    match decision {
        GateDecision::Reject(reason) => {
            tracing::info!("Token filtered out: {} ({})", event.token_address, reason);
        }
        GateDecision::Accept => {
            // The gate may have taken a while; never buy into a pause or stop
            if *state.read().await != BotState::Active {
                tracing::debug!(
                    "Dropping accepted launch {} while not active",
                    event.token_address
                );
                return;
            }
            match executor.open_trade(&analysis).await {
                Ok(position) => tracing::info!(
                    "Position opened: {} at {:.8} (tp {:.8}, sl {:.8})",
                    position.token_symbol,
                    position.entry_price,
                    position.take_profit_price,
                    position.stop_loss_price
                ),
                Err(e) if e.is_pacing() => {
                    tracing::info!("Skipped buy for {}: {}", event.token_address, e);
                }
                Err(e) => {
                    tracing::error!("Buy failed for {}: {}", event.token_address, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ManualClock;
    use crate::ports::mocks::{
        MockBuyer, MockMonitor, MockPriceSource, MockRpc, MockSafetyChecker, MockSeller,
        MockValidator,
    };

    struct TestBot {
        controller: BotController,
        monitor: Arc<MockMonitor>,
        buyer: Arc<MockBuyer>,
        seller: Arc<MockSeller>,
        rpc: Arc<MockRpc>,
    }

    fn test_bot(config: Config) -> TestBot {
        let monitor = Arc::new(MockMonitor::new());
        let buyer = Arc::new(MockBuyer::new());
        let seller = Arc::new(MockSeller::new());
        let rpc = Arc::new(MockRpc::new(10.0));
        let deps = BotDeps {
            monitor: monitor.clone(),
            validator: Arc::new(MockValidator::new()),
            safety: Arc::new(MockSafetyChecker::new()),
            buyer: buyer.clone(),
            seller: seller.clone(),
            rpc: rpc.clone(),
            price_source: Arc::new(MockPriceSource::new()),
            clock: Arc::new(ManualClock::default()),
        };
        TestBot {
            controller: BotController::new(config, deps),
            monitor,
            buyer,
            seller,
            rpc,
        }
    }

    #[tokio::test]
    async fn test_start_goes_active() {
        let bot = test_bot(Config::default());

        bot.controller.start().await.unwrap();

        assert_eq!(bot.controller.state().await, BotState::Active);
        assert!(bot.monitor.is_active());
        bot.controller.stop().await;
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let bot = test_bot(Config::default());

        bot.controller.start().await.unwrap();
        let result = bot.controller.start().await;

        assert!(matches!(result, Err(ControllerError::AlreadyRunning)));
        assert_eq!(bot.controller.state().await, BotState::Active);
        bot.controller.stop().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let bot = test_bot(Config::default());

        // Stopping a bot that never started is a no-op
        bot.controller.stop().await;
        assert_eq!(bot.controller.state().await, BotState::Stopped);

        bot.controller.start().await.unwrap();
        bot.controller.stop().await;
        bot.controller.stop().await;

        assert_eq!(bot.controller.state().await, BotState::Stopped);
        assert!(!bot.monitor.is_active());
        assert!(bot.buyer.is_stopped());
        assert!(bot.seller.is_stopped());
    }

    #[tokio::test]
    async fn test_restart_after_stop() {
        let bot = test_bot(Config::default());

        bot.controller.start().await.unwrap();
        bot.controller.stop().await;
        bot.controller.start().await.unwrap();

        assert_eq!(bot.controller.state().await, BotState::Active);
        bot.controller.stop().await;
    }

    #[tokio::test]
    async fn test_restart_rearms_executors() {
        let bot = test_bot(Config::default());

        bot.controller.start().await.unwrap();
        bot.controller.stop().await;
        assert!(bot.buyer.is_stopped());
        assert!(bot.seller.is_stopped());

        bot.controller.start().await.unwrap();

        assert!(!bot.buyer.is_stopped());
        assert!(!bot.seller.is_stopped());
        bot.controller.stop().await;
    }

    #[tokio::test]
    async fn test_pause_resume_transitions() {
        let bot = test_bot(Config::default());

        assert!(matches!(
            bot.controller.pause().await,
            Err(ControllerError::InvalidTransition { .. })
        ));

        bot.controller.start().await.unwrap();
        bot.controller.pause().await.unwrap();
        assert_eq!(bot.controller.state().await, BotState::Paused);

        assert!(matches!(
            bot.controller.pause().await,
            Err(ControllerError::InvalidTransition { .. })
        ));

        bot.controller.resume().await.unwrap();
        assert_eq!(bot.controller.state().await, BotState::Active);

        assert!(matches!(
            bot.controller.resume().await,
            Err(ControllerError::InvalidTransition { .. })
        ));

        bot.controller.stop().await;
    }

    #[tokio::test]
    async fn test_start_requires_rpc_url() {
        let mut config = Config::default();
        config.rpc.rpc_url = String::new();
        let bot = test_bot(config);

        let result = bot.controller.start().await;

        assert!(matches!(result, Err(ControllerError::ConfigError(_))));
        assert_eq!(bot.controller.state().await, BotState::Stopped);
    }

    #[tokio::test]
    async fn test_start_requires_private_key_outside_simulation() {
        let mut config = Config::default();
        config.trading.simulation_mode = false;
        let bot = test_bot(config);

        let result = bot.controller.start().await;

        assert!(matches!(result, Err(ControllerError::ConfigError(_))));
        assert_eq!(bot.controller.state().await, BotState::Stopped);
    }

    #[tokio::test]
    async fn test_start_fails_when_rpc_unreachable() {
        let bot = test_bot(Config::default());
        bot.rpc.set_unhealthy();

        let result = bot.controller.start().await;

        assert!(matches!(result, Err(ControllerError::RpcUnreachable(_))));
        assert_eq!(bot.controller.state().await, BotState::Stopped);
    }

    #[tokio::test]
    async fn test_start_fails_when_subscription_fails() {
        let bot = test_bot(Config::default());
        bot.monitor.fail_next_start();

        let result = bot.controller.start().await;
        assert!(matches!(result, Err(ControllerError::SubscriptionFailed(_))));
        assert_eq!(bot.controller.state().await, BotState::Stopped);

        // A later start is not poisoned by the earlier failure
        bot.controller.start().await.unwrap();
        bot.controller.stop().await;
    }

    #[tokio::test]
    async fn test_status_snapshot() {
        let bot = test_bot(Config::default());
        bot.controller.start().await.unwrap();

        let status = bot.controller.status().await;

        assert_eq!(status.state, BotState::Active);
        assert!(status.simulation);
        assert_eq!(status.positions.open, 0);
        bot.controller.stop().await;
    }
}
