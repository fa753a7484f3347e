//! Paper Trading Adapters
//!
//! In-memory implementations of every port, sharing one synthetic market
//! and one simulated wallet so a full bot run needs no network access:
//! - `market`: shared price book, wallet, and drifting price source
//! - `monitor`: interval-driven synthetic launch stream
//! - `analyzer`: fabricated analyses and a pass-through safety checker
//! - `execution`: slippage-applying buyer and seller
//! - `rpc`: balance and connectivity backed by the paper wallet

pub mod analyzer;
pub mod execution;
pub mod market;
pub mod monitor;
pub mod rpc;

pub use analyzer::{PaperAnalyzer, PaperSafetyChecker};
pub use execution::{PaperBuyer, PaperSeller};
pub use market::{DriftingPriceSource, PaperMarket, PaperWallet};
pub use monitor::SyntheticMonitor;
pub use rpc::PaperRpc;
