//! Health Monitor
//!
//! Aggregates subsystem health on a fixed cadence, independent of the
//! trading state. Probe failures are warnings, never fatal. Only a
//! sampled fraction of checks is logged to keep log volume flat.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::application::controller::BotState;
use crate::application::positions::{PositionManager, PositionStats};
use crate::domain::Clock;
use crate::ports::{
    Buyer, ExecutionStatus, LaunchMonitor, MonitorHealth, RpcPort, SafetyChecker, SafetyStats,
    Seller,
};

/// Snapshot of every subsystem at one check
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub timestamp: DateTime<Utc>,
    pub state: BotState,
    pub rpc_connected: bool,
    pub balance_sol: Option<f64>,
    pub monitor: MonitorHealth,
    pub buyer: ExecutionStatus,
    pub seller: ExecutionStatus,
    pub safety: SafetyStats,
    pub positions: PositionStats,
}

/// Periodically probes collaborators and keeps the latest report
pub struct HealthMonitor {
    rpc: Arc<dyn RpcPort>,
    monitor: Arc<dyn LaunchMonitor>,
    buyer: Arc<dyn Buyer>,
    seller: Arc<dyn Seller>,
    safety: Arc<dyn SafetyChecker>,
    positions: Arc<PositionManager>,
    clock: Arc<dyn Clock>,
    /// Fraction of checks that produce a log line
    log_sample_rate: f64,
    latest: RwLock<Option<HealthReport>>,
}

impl HealthMonitor {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rpc: Arc<dyn RpcPort>,
        monitor: Arc<dyn LaunchMonitor>,
        buyer: Arc<dyn Buyer>,
        seller: Arc<dyn Seller>,
        safety: Arc<dyn SafetyChecker>,
        positions: Arc<PositionManager>,
        clock: Arc<dyn Clock>,
        log_sample_rate: f64,
    ) -> Self {
        Self {
            rpc,
            monitor,
            buyer,
            seller,
            safety,
            positions,
            clock,
            log_sample_rate,
            latest: RwLock::new(None),
        }
    }

    /// Probe every subsystem and store the resulting report
    pub async fn check(&self, state: BotState) -> HealthReport {
        let rpc_connected = match self.rpc.health_check().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("RPC health probe failed: {}", e);
                false
            }
        };
        let balance_sol = self.rpc.get_balance().await.ok();

        let report = HealthReport {
            timestamp: self.clock.now(),
            state,
            rpc_connected,
            balance_sol,
            monitor: self.monitor.health().await,
            buyer: self.buyer.status().await,
            seller: self.seller.status().await,
            safety: self.safety.safety_stats().await,
            positions: self.positions.stats().await,
        };

        if state == BotState::Active && !report.monitor.active {
            tracing::warn!("Launch monitor inactive while bot is active");
        }

        if rand::thread_rng().gen_bool(self.log_sample_rate) {
            tracing::info!(
                "Health: state={} rpc={} events={} open={} closed={} pnl={:.4}",
                report.state,
                report.rpc_connected,
                report.monitor.events_emitted,
                report.positions.open,
                report.positions.closed,
                report.positions.realized_pnl + report.positions.unrealized_pnl
            );
        }

        *self.latest.write().await = Some(report.clone());
        report
    }

    pub async fn latest(&self) -> Option<HealthReport> {
        self.latest.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExitRules, ManualClock};
    use crate::ports::mocks::{
        MockBuyer, MockMonitor, MockPriceSource, MockRpc, MockSafetyChecker, MockSeller,
    };
    use approx::assert_relative_eq;

    fn monitor_with_rpc(rpc: Arc<MockRpc>) -> HealthMonitor {
        let seller = Arc::new(MockSeller::new());
        let prices = Arc::new(MockPriceSource::new());
        let clock = Arc::new(ManualClock::default());
        let positions = Arc::new(PositionManager::new(
            seller.clone(),
            prices,
            clock.clone(),
            ExitRules {
                take_profit_pct: 100.0,
                stop_loss_pct: 30.0,
                trailing_stop_pct: 10.0,
            },
        ));
        HealthMonitor::new(
            rpc,
            Arc::new(MockMonitor::new()),
            Arc::new(MockBuyer::new()),
            seller,
            Arc::new(MockSafetyChecker::new()),
            positions,
            clock,
            0.0,
        )
    }

    #[tokio::test]
    async fn test_healthy_snapshot() {
        let monitor = monitor_with_rpc(Arc::new(MockRpc::new(2.5)));

        let report = monitor.check(BotState::Stopped).await;

        assert!(report.rpc_connected);
        assert_relative_eq!(report.balance_sol.unwrap(), 2.5);
        assert_eq!(report.positions.open, 0);
        assert_eq!(report.state, BotState::Stopped);
    }

    #[tokio::test]
    async fn test_failed_probe_is_nonfatal() {
        let rpc = Arc::new(MockRpc::new(2.5));
        rpc.set_unhealthy();
        let monitor = monitor_with_rpc(rpc);

        let report = monitor.check(BotState::Active).await;

        assert!(!report.rpc_connected);
        assert!(report.balance_sol.is_none());
    }

    #[tokio::test]
    async fn test_latest_report_is_kept() {
        let monitor = monitor_with_rpc(Arc::new(MockRpc::new(1.0)));
        assert!(monitor.latest().await.is_none());

        monitor.check(BotState::Paused).await;

        let latest = monitor.latest().await.unwrap();
        assert_eq!(latest.state, BotState::Paused);
    }
}
