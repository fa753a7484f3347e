//! Paper analysis backends
//!
//! Fabricates token analyses with enough spread that the gate accepts
//! some launches and filters out the rest, plus a safety checker that
//! always passes while still counting its work.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;

use super::market::PaperMarket;
use crate::ports::{
    AnalysisError, BondingCurveInfo, OpportunityScore, SafetyChecker, SafetyScore, SafetyStats,
    SafetyVerdict, TokenAnalysis, TokenInfo, TokenMetrics, TokenValidator,
};

/// Fabricates plausible metrics for a launch and seeds the paper market
pub struct PaperAnalyzer {
    market: Arc<PaperMarket>,
    /// Fabricated market caps straddle this band so the gate has
    /// something to reject
    market_cap_band: (f64, f64),
}

impl PaperAnalyzer {
    pub fn new(market: Arc<PaperMarket>) -> Self {
        Self {
            market,
            market_cap_band: (1_000.0, 50_000.0),
        }
    }

    pub fn with_market_cap_band(mut self, min: f64, max: f64) -> Self {
        self.market_cap_band = (min, max);
        self
    }
}

#[async_trait]
impl TokenValidator for PaperAnalyzer {
    async fn analyze_token(
        &self,
        token_address: &str,
        bonding_curve_address: &str,
    ) -> Result<TokenAnalysis, AnalysisError> {
        let (price, market_cap, liquidity, safety, opportunity) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(1.0e-7..1.0e-5),
                rng.gen_range(self.market_cap_band.0 * 0.5..self.market_cap_band.1 * 1.5),
                rng.gen_range(1.0..30.0),
                rng.gen_range(30..=95),
                rng.gen_range(30..=90),
            )
        };

        self.market.seed(token_address, price).await;

        let tail: String = token_address
            .chars()
            .skip(token_address.chars().count().saturating_sub(4))
            .collect();

        Ok(TokenAnalysis {
            token: TokenInfo {
                address: token_address.to_string(),
                symbol: format!("PPR{}", tail),
                creator: format!("creator-{}", token_address),
            },
            bonding_curve: BondingCurveInfo {
                address: bonding_curve_address.to_string(),
            },
            metrics: TokenMetrics {
                market_cap,
                liquidity,
                price,
            },
            safety: SafetyScore { score: safety },
            opportunity: OpportunityScore { score: opportunity },
        })
    }
}

/// Safety checker that never vetoes but keeps honest counters
pub struct PaperSafetyChecker {
    checks_performed: AtomicU64,
}

impl PaperSafetyChecker {
    pub fn new() -> Self {
        Self {
            checks_performed: AtomicU64::new(0),
        }
    }
}

impl Default for PaperSafetyChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SafetyChecker for PaperSafetyChecker {
    async fn perform_safety_check(
        &self,
        _token_address: &str,
        _creator: &str,
    ) -> Result<SafetyVerdict, AnalysisError> {
        self.checks_performed.fetch_add(1, Ordering::SeqCst);
        Ok(SafetyVerdict {
            passed: true,
            reasons: Vec::new(),
        })
    }

    async fn safety_stats(&self) -> SafetyStats {
        SafetyStats {
            checks_performed: self.checks_performed.load(Ordering::SeqCst),
            tokens_rejected: 0,
            blacklisted_creators: 0,
        }
    }
}
