//! Launch monitor port
//!
//! The monitor watches on-chain program logs for new token launches and
//! emits one [`LaunchEvent`] per detection. Delivery is a bounded channel
//! so a slow consumer applies backpressure instead of queueing unbounded.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::models::{LaunchEvent, MonitorHealth};

/// Monitor error type
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Monitor is already running")]
    AlreadyRunning,

    #[error("Event stream error: {0}")]
    StreamError(String),
}

/// Launch monitor port trait
#[async_trait]
pub trait LaunchMonitor: Send + Sync {
    /// Begin emitting launch events
    ///
    /// Returns the receiving end of a bounded event channel. At most one
    /// subscription is live at a time; starting again without an
    /// intervening stop is refused with [`MonitorError::AlreadyRunning`].
    async fn start_monitoring(&self) -> Result<mpsc::Receiver<LaunchEvent>, MonitorError>;

    /// End event emission, idempotent
    async fn stop_monitoring(&self) -> Result<(), MonitorError>;

    /// Health snapshot for the health loop
    async fn health(&self) -> MonitorHealth;
}
