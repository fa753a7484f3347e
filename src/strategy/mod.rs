//! Strategy Layer - Launch Gating
//!
//! Implements the decision step between a detected launch and a buy:
//! - Score thresholds for safety and opportunity
//! - Market cap band and liquidity floor
//! - External safety check as the final veto

pub mod event_gate;

pub use event_gate::{EventGate, GateConfig, GateDecision, RejectReason};
