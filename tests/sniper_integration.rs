//! Launch Sniper Integration Tests
//!
//! Integration tests that verify the sniper components work together:
//! 1. LaunchMonitor -> EventGate -> TradeExecutor flow
//! 2. PositionManager exit handling through the controller
//! 3. BotController lifecycle (start/stop/pause/resume)
//!
//! All tests are deterministic (no real network calls) and use mock ports.
//! Exit checks are driven by calling `tick()` directly instead of waiting
//! for the background interval.

use std::sync::Arc;
use std::time::Duration;

use curve_sniper::application::{BotController, BotDeps, BotState};
use curve_sniper::config::Config;
use curve_sniper::domain::{ExitTrigger, ManualClock, PositionStatus};
use curve_sniper::ports::mocks::{
    sample_analysis, sample_event, MockBuyer, MockMonitor, MockPriceSource, MockRpc,
    MockSafetyChecker, MockSeller, MockValidator,
};

// ============================================================================
// Test Fixtures
// ============================================================================

/// Default test configuration: simulation on, no buy cooldown so tests can
/// open several positions back to back.
fn test_config() -> Config {
    let mut config = Config::default();
    config.limits.cooldown_ms = 0;
    config
}

/// The controller under test plus handles to every mock behind it.
struct TestHarness {
    controller: BotController,
    monitor: Arc<MockMonitor>,
    validator: Arc<MockValidator>,
    safety: Arc<MockSafetyChecker>,
    buyer: Arc<MockBuyer>,
    seller: Arc<MockSeller>,
    price: Arc<MockPriceSource>,
}

fn harness() -> TestHarness {
    harness_with(test_config())
}

fn harness_with(config: Config) -> TestHarness {
    let monitor = Arc::new(MockMonitor::new());
    let validator = Arc::new(MockValidator::new());
    let safety = Arc::new(MockSafetyChecker::new());
    let buyer = Arc::new(MockBuyer::new());
    let seller = Arc::new(MockSeller::new());
    let rpc = Arc::new(MockRpc::new(5.0));
    let price = Arc::new(MockPriceSource::new());

    let deps = BotDeps {
        monitor: monitor.clone(),
        validator: validator.clone(),
        safety: safety.clone(),
        buyer: buyer.clone(),
        seller: seller.clone(),
        rpc,
        price_source: price.clone(),
        clock: Arc::new(ManualClock::default()),
    };

    TestHarness {
        controller: BotController::new(config, deps),
        monitor,
        validator,
        safety,
        buyer,
        seller,
        price,
    }
}

/// Emit a launch for `token` and wait until a position for it exists.
async fn emit_and_open(harness: &TestHarness, token: &str) {
    harness.validator.insert(sample_analysis(token)).await;
    assert!(harness.monitor.emit(sample_event(token)).await);

    let positions = harness.controller.positions();
    for _ in 0..200 {
        if positions.contains(token).await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("position for {} was never opened", token);
}

// ============================================================================
// Test Module: Launch Event -> Buy Flow
// ============================================================================

mod launch_flow {
    use super::*;

    /// Test: An accepted launch opens a position with derived exit prices
    #[tokio::test]
    async fn test_launch_event_opens_position() {
        let h = harness();
        h.controller.start().await.unwrap();

        emit_and_open(&h, "mint-a").await;

        let open = h.controller.positions().open_positions().await;
        assert_eq!(open.len(), 1);
        let position = &open[0];
        assert_eq!(position.token_address, "mint-a");
        assert!((position.entry_price - 1.0).abs() < 1e-9);
        // Defaults: +100% take profit, -30% stop loss from a 1.0 entry
        assert!((position.take_profit_price - 2.0).abs() < 1e-9);
        assert!((position.stop_loss_price - 0.7).abs() < 1e-9);

        let buys = h.buyer.calls().await;
        assert_eq!(buys.len(), 1);
        assert_eq!(buys[0].token_address, "mint-a");

        h.controller.stop().await;
    }

    /// Test: A token below the safety threshold is filtered, never bought
    #[tokio::test]
    async fn test_low_safety_score_is_filtered() {
        let h = harness();
        h.controller.start().await.unwrap();

        let mut analysis = sample_analysis("mint-low");
        analysis.safety.score = 55;
        h.validator.insert(analysis).await;
        assert!(h.monitor.emit(sample_event("mint-low")).await);

        for _ in 0..200 {
            if !h.validator.calls().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(h.buyer.calls().await.is_empty());
        assert!(!h.controller.positions().contains("mint-low").await);
        // Threshold rejects are decided before the external safety check
        assert_eq!(h.safety.checks_performed(), 0);

        h.controller.stop().await;
    }

    /// Test: A failed external safety check blocks the buy
    #[tokio::test]
    async fn test_failed_safety_check_blocks_buy() {
        let h = harness();
        h.controller.start().await.unwrap();
        h.safety.reject_with(vec!["honeypot".to_string()]).await;

        h.validator.insert(sample_analysis("mint-hp")).await;
        assert!(h.monitor.emit(sample_event("mint-hp")).await);

        for _ in 0..200 {
            if h.safety.checks_performed() > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(h.safety.checks_performed(), 1);
        assert!(h.buyer.calls().await.is_empty());
        assert!(!h.controller.positions().contains("mint-hp").await);

        h.controller.stop().await;
    }

    /// Test: Events arriving while paused are dropped, not queued
    #[tokio::test]
    async fn test_paused_bot_drops_events() {
        let h = harness();
        h.controller.start().await.unwrap();
        h.controller.pause().await.unwrap();

        h.validator.insert(sample_analysis("mint-paused")).await;
        assert!(h.monitor.emit(sample_event("mint-paused")).await);
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Dropped before analysis
        assert!(h.validator.calls().await.is_empty());
        assert!(h.buyer.calls().await.is_empty());

        // After resume, fresh events flow again; the dropped one stays dropped
        h.controller.resume().await.unwrap();
        emit_and_open(&h, "mint-resumed").await;

        assert_eq!(h.validator.calls().await, vec!["mint-resumed".to_string()]);

        h.controller.stop().await;
    }
}

// ============================================================================
// Test Module: Position Exit Flow
// ============================================================================

mod exit_flow {
    use super::*;

    /// Test: Stop loss closes the position exactly once
    #[tokio::test]
    async fn test_stop_loss_closes_position_once() {
        let h = harness();
        h.controller.start().await.unwrap();
        emit_and_open(&h, "mint-a").await;

        let positions = h.controller.positions();
        h.price.set_price("mint-a", 0.65).await;
        positions.tick().await;

        assert!(!positions.contains("mint-a").await);
        let closed = positions.closed_positions().await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].status, PositionStatus::Closed);
        assert_eq!(closed[0].closed_by, Some(ExitTrigger::StopLoss));
        // (0.65 - 1.0) * 1000 tokens
        assert!((closed[0].pnl - (-350.0)).abs() < 1e-9);

        // A closed position is never re-sold
        positions.tick().await;
        assert_eq!(h.seller.calls().await.len(), 1);

        h.controller.stop().await;
    }

    /// Test: Take profit closes the position at the derived target
    #[tokio::test]
    async fn test_take_profit_closes_position() {
        let h = harness();
        h.controller.start().await.unwrap();
        emit_and_open(&h, "mint-a").await;

        let positions = h.controller.positions();
        h.price.set_price("mint-a", 2.0).await;
        positions.tick().await;

        let closed = positions.closed_positions().await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].closed_by, Some(ExitTrigger::TakeProfit));
        assert!((closed[0].pnl - 1000.0).abs() < 1e-9);

        h.controller.stop().await;
    }

    /// Test: Trailing stop fires after a retreat from the peak
    #[tokio::test]
    async fn test_trailing_stop_fires_from_peak() {
        let h = harness();
        h.controller.start().await.unwrap();
        emit_and_open(&h, "mint-a").await;

        let positions = h.controller.positions();

        // Run the price up to set a peak, then retreat more than 10%
        h.price.set_price("mint-a", 1.5).await;
        positions.tick().await;
        assert!(positions.contains("mint-a").await);

        h.price.set_price("mint-a", 1.30).await;
        positions.tick().await;

        let closed = positions.closed_positions().await;
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].closed_by, Some(ExitTrigger::TrailingStop));
        assert!((closed[0].highest_price - 1.5).abs() < 1e-9);

        h.controller.stop().await;
    }

    /// Test: A failed sell reopens the position and the next tick retries
    #[tokio::test]
    async fn test_sell_failure_reopens_then_retries() {
        let h = harness();
        h.controller.start().await.unwrap();
        emit_and_open(&h, "mint-a").await;

        let positions = h.controller.positions();
        h.seller.fail_next();
        h.price.set_price("mint-a", 0.5).await;

        positions.tick().await;
        // Sell failed, position is open again and still tracked
        assert!(positions.contains("mint-a").await);
        assert!(positions.closed_positions().await.is_empty());

        positions.tick().await;
        assert!(!positions.contains("mint-a").await);
        assert_eq!(positions.closed_positions().await.len(), 1);
        assert_eq!(h.seller.calls().await.len(), 2);

        h.controller.stop().await;
    }
}

// ============================================================================
// Test Module: Controller Lifecycle
// ============================================================================

mod lifecycle {
    use super::*;

    /// Test: Stop halts executors, unsubscribes, and is idempotent
    #[tokio::test]
    async fn test_stop_halts_everything() {
        let h = harness();
        h.controller.start().await.unwrap();
        emit_and_open(&h, "mint-a").await;

        h.controller.stop().await;

        assert_eq!(h.controller.state().await, BotState::Stopped);
        assert!(h.buyer.is_stopped());
        assert!(h.seller.is_stopped());
        assert!(!h.monitor.is_active());
        // Subscription is gone, emits no longer deliver
        assert!(!h.monitor.emit(sample_event("mint-late")).await);

        // Second stop is a no-op
        h.controller.stop().await;
        assert_eq!(h.controller.state().await, BotState::Stopped);
    }

    /// Test: A stopped bot can start again with a fresh subscription
    #[tokio::test]
    async fn test_restart_resubscribes() {
        let h = harness();
        h.controller.start().await.unwrap();
        h.controller.stop().await;

        h.controller.start().await.unwrap();
        assert_eq!(h.controller.state().await, BotState::Active);
        assert!(h.monitor.is_active());

        // Events reach the pipeline again after the restart
        h.validator.insert(sample_analysis("mint-b")).await;
        assert!(h.monitor.emit(sample_event("mint-b")).await);
        let mut analyzed = false;
        for _ in 0..200 {
            if h.validator.calls().await.contains(&"mint-b".to_string()) {
                analyzed = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(analyzed, "restarted bot never analyzed the new launch");

        h.controller.stop().await;
    }

    /// Test: A restarted bot can buy again, not just analyze
    #[tokio::test]
    async fn test_restarted_bot_opens_positions() {
        let h = harness();
        h.controller.start().await.unwrap();
        emit_and_open(&h, "mint-a").await;

        // Stop halts both executors
        h.controller.stop().await;
        assert!(h.buyer.is_stopped());
        assert!(h.seller.is_stopped());

        // Restart lifts the emergency stop, so the next launch fills
        h.controller.start().await.unwrap();
        emit_and_open(&h, "mint-b").await;

        assert!(!h.buyer.is_stopped());
        assert_eq!(h.buyer.calls().await.len(), 2);

        // The seller is re-armed too: the new position can close
        let positions = h.controller.positions();
        h.price.set_price("mint-b", 2.0).await;
        positions.tick().await;
        assert!(!positions.contains("mint-b").await);

        h.controller.stop().await;
    }

    /// Test: Health reports keep flowing while the bot is paused
    #[tokio::test]
    async fn test_health_checks_run_while_paused() {
        let mut config = test_config();
        config.schedule.health_check_secs = 1;
        config.schedule.health_log_sample_rate = 0.0;
        let h = harness_with(config);

        h.controller.start().await.unwrap();
        h.controller.pause().await.unwrap();

        let mut report = None;
        for _ in 0..300 {
            if let Some(latest) = h.controller.health().latest().await {
                report = Some(latest);
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let report = report.expect("no health report while paused");
        assert_eq!(report.state, BotState::Paused);
        assert!(report.rpc_connected);

        h.controller.stop().await;
    }

    /// Test: Session status aggregates fills and position stats
    #[tokio::test]
    async fn test_status_reflects_session() {
        let h = harness();
        h.controller.start().await.unwrap();
        emit_and_open(&h, "mint-a").await;

        let positions = h.controller.positions();
        h.price.set_price("mint-a", 2.0).await;
        positions.tick().await;

        let status = h.controller.status().await;
        assert_eq!(status.state, BotState::Active);
        assert!(status.simulation);
        assert_eq!(status.positions.open, 0);
        assert_eq!(status.positions.closed, 1);
        assert!((status.positions.realized_pnl - 1000.0).abs() < 1e-9);
        assert_eq!(status.buyer.fills, 1);
        assert_eq!(status.seller.fills, 1);
        assert_eq!(status.monitor.events_emitted, 1);

        h.controller.stop().await;
        let status = h.controller.status().await;
        assert_eq!(status.state, BotState::Stopped);
    }
}
