//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Paper: synthetic market, launch stream, and simulated execution
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod paper;

pub use cli::CliApp;
pub use paper::{
    DriftingPriceSource, PaperAnalyzer, PaperBuyer, PaperMarket, PaperRpc, PaperSafetyChecker,
    PaperSeller, PaperWallet, SyntheticMonitor,
};
