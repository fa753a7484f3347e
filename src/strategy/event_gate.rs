//! Launch Gate
//!
//! Turns a token analysis into a single trade / no-trade decision. Every
//! configured threshold must hold and the external safety check must pass;
//! the first failing check decides the rejection reason.

use std::fmt;
use std::sync::Arc;

use crate::ports::{AnalysisError, SafetyChecker, TokenAnalysis};

/// Thresholds a launch must clear before a buy is attempted
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Minimum safety score (0-100)
    pub min_safety_score: u32,
    /// Minimum opportunity score (0-100)
    pub min_opportunity_score: u32,
    /// Market cap floor in USD
    pub min_market_cap: f64,
    /// Market cap ceiling in USD
    pub max_market_cap: f64,
    /// Minimum pooled liquidity in SOL
    pub min_liquidity: f64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_safety_score: 60,
            min_opportunity_score: 50,
            min_market_cap: 1_000.0,
            max_market_cap: 50_000.0,
            min_liquidity: 5.0,
        }
    }
}

/// Why a launch was rejected
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    SafetyScore { score: u32, min: u32 },
    OpportunityScore { score: u32, min: u32 },
    MarketCapBelow { market_cap: f64, min: f64 },
    MarketCapAbove { market_cap: f64, max: f64 },
    Liquidity { liquidity: f64, min: f64 },
    SafetyCheck { reasons: Vec<String> },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::SafetyScore { score, min } => {
                write!(f, "safety score {} below minimum {}", score, min)
            }
            RejectReason::OpportunityScore { score, min } => {
                write!(f, "opportunity score {} below minimum {}", score, min)
            }
            RejectReason::MarketCapBelow { market_cap, min } => {
                write!(f, "market cap ${:.0} below minimum ${:.0}", market_cap, min)
            }
            RejectReason::MarketCapAbove { market_cap, max } => {
                write!(f, "market cap ${:.0} above maximum ${:.0}", market_cap, max)
            }
            RejectReason::Liquidity { liquidity, min } => {
                write!(
                    f,
                    "liquidity {:.2} SOL below minimum {:.2}",
                    liquidity, min
                )
            }
            RejectReason::SafetyCheck { reasons } => {
                write!(f, "failed safety check: {}", reasons.join(", "))
            }
        }
    }
}

/// Outcome of gating one launch
#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    Accept,
    Reject(RejectReason),
}

impl GateDecision {
    pub fn is_accept(&self) -> bool {
        matches!(self, GateDecision::Accept)
    }
}

/// Decides whether an analyzed launch is worth buying
pub struct EventGate {
    config: GateConfig,
    safety: Arc<dyn SafetyChecker>,
}

impl EventGate {
    pub fn new(config: GateConfig, safety: Arc<dyn SafetyChecker>) -> Self {
        Self { config, safety }
    }

    /// Gate one analyzed launch
    ///
    /// Cheap threshold checks run first so the external safety check is
    /// only consulted for launches that already look tradeable. Errors
    /// from the safety check propagate; they are not a rejection.
    pub async fn should_trade(
        &self,
        analysis: &TokenAnalysis,
    ) -> Result<GateDecision, AnalysisError> {
        if analysis.safety.score < self.config.min_safety_score {
            return Ok(GateDecision::Reject(RejectReason::SafetyScore {
                score: analysis.safety.score,
                min: self.config.min_safety_score,
            }));
        }

        if analysis.opportunity.score < self.config.min_opportunity_score {
            return Ok(GateDecision::Reject(RejectReason::OpportunityScore {
                score: analysis.opportunity.score,
                min: self.config.min_opportunity_score,
            }));
        }

        let market_cap = analysis.metrics.market_cap;
        if market_cap < self.config.min_market_cap {
            return Ok(GateDecision::Reject(RejectReason::MarketCapBelow {
                market_cap,
                min: self.config.min_market_cap,
            }));
        }
        if market_cap > self.config.max_market_cap {
            return Ok(GateDecision::Reject(RejectReason::MarketCapAbove {
                market_cap,
                max: self.config.max_market_cap,
            }));
        }

        if analysis.metrics.liquidity < self.config.min_liquidity {
            return Ok(GateDecision::Reject(RejectReason::Liquidity {
                liquidity: analysis.metrics.liquidity,
                min: self.config.min_liquidity,
            }));
        }

        let verdict = self
            .safety
            .perform_safety_check(&analysis.token.address, &analysis.token.creator)
            .await?;
        if !verdict.passed {
            return Ok(GateDecision::Reject(RejectReason::SafetyCheck {
                reasons: verdict.reasons,
            }));
        }

        Ok(GateDecision::Accept)
    }
}
