//! Hand-rolled mock ports for unit and integration tests
//!
//! Each mock records the calls it receives and serves preloaded responses,
//! so tests can drive the controller deterministically without timers or
//! network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{mpsc, Mutex, Notify};

use super::analysis::{AnalysisError, SafetyChecker, TokenValidator};
use super::execution::{Buyer, ExecutionError, Seller};
use super::market_data::{MarketDataError, PriceSource};
use super::models::{
    BondingCurveInfo, BuyFill, BuyRequest, ExecutionStatus, LaunchEvent, MonitorHealth,
    OpportunityScore, SafetyScore, SafetyStats, SafetyVerdict, SellFill, SellRequest,
    TokenAnalysis, TokenInfo, TokenMetrics,
};
use super::monitor::{LaunchMonitor, MonitorError};
use super::rpc::{RpcError, RpcPort};

const MOCK_CHANNEL_CAPACITY: usize = 16;

/// Analysis fixture that passes the default gate thresholds
pub fn sample_analysis(token_address: &str) -> TokenAnalysis {
    TokenAnalysis {
        token: TokenInfo {
            address: token_address.to_string(),
            symbol: format!("TOK{}", &token_address[..4.min(token_address.len())]),
            creator: format!("creator-{}", token_address),
        },
        bonding_curve: BondingCurveInfo {
            address: format!("curve-{}", token_address),
        },
        metrics: TokenMetrics {
            market_cap: 5000.0,
            liquidity: 8.0,
            price: 1.0,
        },
        safety: SafetyScore { score: 70 },
        opportunity: OpportunityScore { score: 55 },
    }
}

/// Launch event fixture matching [`sample_analysis`]
pub fn sample_event(token_address: &str) -> LaunchEvent {
    LaunchEvent {
        token_address: token_address.to_string(),
        bonding_curve_address: format!("curve-{}", token_address),
        creator: format!("creator-{}", token_address),
        timestamp: Utc::now(),
    }
}

/// Mock launch monitor fed manually from tests
pub struct MockMonitor {
    sender: Mutex<Option<mpsc::Sender<LaunchEvent>>>,
    active: AtomicBool,
    events_emitted: AtomicU64,
    fail_start: AtomicBool,
}

impl MockMonitor {
    pub fn new() -> Self {
        Self {
            sender: Mutex::new(None),
            active: AtomicBool::new(false),
            events_emitted: AtomicU64::new(0),
            fail_start: AtomicBool::new(false),
        }
    }

    /// Make the next `start_monitoring` call fail
    pub fn fail_next_start(&self) {
        self.fail_start.store(true, Ordering::SeqCst);
    }

    /// Push an event into the live subscription, true if delivered
    pub async fn emit(&self, event: LaunchEvent) -> bool {
        let guard = self.sender.lock().await;
        match guard.as_ref() {
            Some(tx) => {
                let delivered = tx.send(event).await.is_ok();
                if delivered {
                    self.events_emitted.fetch_add(1, Ordering::SeqCst);
                }
                delivered
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LaunchMonitor for MockMonitor {
    async fn start_monitoring(&self) -> Result<mpsc::Receiver<LaunchEvent>, MonitorError> {
        if self.fail_start.swap(false, Ordering::SeqCst) {
            return Err(MonitorError::SubscriptionFailed("mock start failure".into()));
        }
        let mut sender = self.sender.lock().await;
        if sender.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }
        let (tx, rx) = mpsc::channel(MOCK_CHANNEL_CAPACITY);
        *sender = Some(tx);
        self.active.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop_monitoring(&self) -> Result<(), MonitorError> {
        self.sender.lock().await.take();
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn health(&self) -> MonitorHealth {
        MonitorHealth {
            active: self.active.load(Ordering::SeqCst),
            events_emitted: self.events_emitted.load(Ordering::SeqCst),
            last_event_at: None,
        }
    }
}

/// Mock validator serving preloaded analyses by token address
pub struct MockValidator {
    analyses: Mutex<HashMap<String, TokenAnalysis>>,
    calls: Mutex<Vec<String>>,
}

impl MockValidator {
    pub fn new() -> Self {
        Self {
            analyses: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Preload an analysis, keyed by its token address
    pub async fn insert(&self, analysis: TokenAnalysis) {
        self.analyses
            .lock()
            .await
            .insert(analysis.token.address.clone(), analysis);
    }

    /// Token addresses analyzed so far, in call order
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl TokenValidator for MockValidator {
    async fn analyze_token(
        &self,
        token_address: &str,
        _bonding_curve_address: &str,
    ) -> Result<TokenAnalysis, AnalysisError> {
        self.calls.lock().await.push(token_address.to_string());
        self.analyses
            .lock()
            .await
            .get(token_address)
            .cloned()
            .ok_or_else(|| AnalysisError::Unavailable(token_address.to_string()))
    }
}

/// Mock safety checker with a switchable verdict
pub struct MockSafetyChecker {
    pass: AtomicBool,
    reasons: Mutex<Vec<String>>,
    checks_performed: AtomicU64,
    tokens_rejected: AtomicU64,
}

impl MockSafetyChecker {
    pub fn new() -> Self {
        Self {
            pass: AtomicBool::new(true),
            reasons: Mutex::new(Vec::new()),
            checks_performed: AtomicU64::new(0),
            tokens_rejected: AtomicU64::new(0),
        }
    }

    /// Fail every subsequent check with the given reasons
    pub async fn reject_with(&self, reasons: Vec<String>) {
        *self.reasons.lock().await = reasons;
        self.pass.store(false, Ordering::SeqCst);
    }

    pub fn checks_performed(&self) -> u64 {
        self.checks_performed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SafetyChecker for MockSafetyChecker {
    async fn perform_safety_check(
        &self,
        _token_address: &str,
        _creator: &str,
    ) -> Result<SafetyVerdict, AnalysisError> {
        self.checks_performed.fetch_add(1, Ordering::SeqCst);
        if self.pass.load(Ordering::SeqCst) {
            Ok(SafetyVerdict {
                passed: true,
                reasons: Vec::new(),
            })
        } else {
            self.tokens_rejected.fetch_add(1, Ordering::SeqCst);
            Ok(SafetyVerdict {
                passed: false,
                reasons: self.reasons.lock().await.clone(),
            })
        }
    }

    async fn safety_stats(&self) -> SafetyStats {
        SafetyStats {
            checks_performed: self.checks_performed.load(Ordering::SeqCst),
            tokens_rejected: self.tokens_rejected.load(Ordering::SeqCst),
            blacklisted_creators: 0,
        }
    }
}

/// Mock buyer filling at the analysis price
pub struct MockBuyer {
    fill_amount: Mutex<f64>,
    fail_next: AtomicBool,
    stopped: AtomicBool,
    calls: Mutex<Vec<BuyRequest>>,
    fills: AtomicU64,
    failures: AtomicU64,
}

impl MockBuyer {
    pub fn new() -> Self {
        Self {
            fill_amount: Mutex::new(1000.0),
            fail_next: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            fills: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Token quantity the next fills will report
    pub async fn set_fill_amount(&self, amount: f64) {
        *self.fill_amount.lock().await = amount;
    }

    /// Fail the next buy
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<BuyRequest> {
        self.calls.lock().await.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Buyer for MockBuyer {
    async fn execute_buy(&self, request: &BuyRequest) -> Result<BuyFill, ExecutionError> {
        self.calls.lock().await.push(request.clone());
        if self.stopped.load(Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::EmergencyStopped);
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::TransactionFailed("mock buy failure".into()));
        }
        let amount = *self.fill_amount.lock().await;
        let price = request.analysis.metrics.price;
        let fills = self.fills.fetch_add(1, Ordering::SeqCst);
        Ok(BuyFill {
            amount,
            price,
            total_value: amount * price,
            signature: format!("mock-buy-{}", fills + 1),
        })
    }

    async fn emergency_stop(&self) -> Result<(), ExecutionError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> Result<(), ExecutionError> {
        self.stopped.store(false, Ordering::SeqCst);
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

/// Mock seller that can hold a sell pending until released
pub struct MockSeller {
    fail_next: AtomicBool,
    blocked: AtomicBool,
    release: Notify,
    stopped: AtomicBool,
    calls: Mutex<Vec<SellRequest>>,
    fills: AtomicU64,
    failures: AtomicU64,
}

impl MockSeller {
    pub fn new() -> Self {
        Self {
            fail_next: AtomicBool::new(false),
            blocked: AtomicBool::new(false),
            release: Notify::new(),
            stopped: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            fills: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Fail the next sell
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Hold subsequent sells pending until [`release`](Self::release)
    pub fn hold_sells(&self) {
        self.blocked.store(true, Ordering::SeqCst);
    }

    /// Release one held sell
    pub fn release(&self) {
        self.blocked.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub async fn calls(&self) -> Vec<SellRequest> {
        self.calls.lock().await.clone()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Seller for MockSeller {
    async fn execute_sell(&self, request: &SellRequest) -> Result<SellFill, ExecutionError> {
        self.calls.lock().await.push(request.clone());
        if self.blocked.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_next.swap(false, Ordering::SeqCst) {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(ExecutionError::TransactionFailed(
                "mock sell failure".into(),
            ));
        }
        let fills = self.fills.fetch_add(1, Ordering::SeqCst);
        Ok(SellFill {
            amount: request.amount,
            price: request.current_price,
            total_value: request.amount * request.current_price,
            signature: format!("mock-sell-{}", fills + 1),
        })
    }

    async fn emergency_stop(&self) -> Result<(), ExecutionError> {
        self.stopped.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn resume(&self) -> Result<(), ExecutionError> {
        self.stopped.store(false, Ordering::SeqCst);
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

/// Mock RPC client with a switchable probe
pub struct MockRpc {
    balance: Mutex<f64>,
    healthy: AtomicBool,
}

impl MockRpc {
    pub fn new(balance: f64) -> Self {
        Self {
            balance: Mutex::new(balance),
            healthy: AtomicBool::new(true),
        }
    }

    /// Make the connectivity probe fail
    pub fn set_unhealthy(&self) {
        self.healthy.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl RpcPort for MockRpc {
    async fn get_balance(&self) -> Result<f64, RpcError> {
        if !self.healthy.load(Ordering::SeqCst) {
            return Err(RpcError::ConnectionFailed("mock rpc down".into()));
        }
        Ok(*self.balance.lock().await)
    }

    async fn health_check(&self) -> Result<(), RpcError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RpcError::ConnectionFailed("mock rpc down".into()))
        }
    }
}

/// Mock price source serving fixed per-token prices
pub struct MockPriceSource {
    prices: Mutex<HashMap<String, f64>>,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            prices: Mutex::new(HashMap::new()),
        }
    }

    pub async fn set_price(&self, token_address: &str, price: f64) {
        self.prices
            .lock()
            .await
            .insert(token_address.to_string(), price);
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    async fn current_price(&self, token_address: &str) -> Result<f64, MarketDataError> {
        self.prices
            .lock()
            .await
            .get(token_address)
            .copied()
            .ok_or_else(|| MarketDataError::PriceUnavailable(token_address.to_string()))
    }
}
