//! Token analysis and safety checker ports
//!
//! Scoring and blacklist logic live entirely behind these traits; the core
//! only consumes their verdicts.

use async_trait::async_trait;
use thiserror::Error;

use super::models::{SafetyStats, SafetyVerdict, TokenAnalysis};

/// Analysis error type
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The token could not be analyzed; the caller should skip it
    #[error("Could not analyze token {0}")]
    Unavailable(String),

    #[error("Analysis backend error: {0}")]
    Backend(String),
}

/// Token validator port trait
#[async_trait]
pub trait TokenValidator: Send + Sync {
    /// Produce a full analysis for a newly-launched token
    ///
    /// Returns `Err(AnalysisError::Unavailable)` when on-chain data is
    /// missing or unreadable; the caller drops the event.
    async fn analyze_token(
        &self,
        token_address: &str,
        bonding_curve_address: &str,
    ) -> Result<TokenAnalysis, AnalysisError>;
}

/// Independent safety checker port trait
///
/// Consults blacklists and heuristics separate from the scored analysis.
#[async_trait]
pub trait SafetyChecker: Send + Sync {
    /// Run the blacklist/safety checks for a token and its creator
    async fn perform_safety_check(
        &self,
        token_address: &str,
        creator: &str,
    ) -> Result<SafetyVerdict, AnalysisError>;

    /// Snapshot for the health loop
    async fn safety_stats(&self) -> SafetyStats;
}
