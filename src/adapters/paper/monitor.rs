//! Synthetic Launch Monitor
//!
//! Fabricates a stream of launch events on a fixed interval so the full
//! pipeline can run end to end without a websocket connection.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::ports::{LaunchEvent, LaunchMonitor, MonitorError, MonitorHealth};

/// Event channel buffer size
const CHANNEL_BUFFER_SIZE: usize = 100;

/// Emits fabricated launches with unique addresses
pub struct SyntheticMonitor {
    launch_interval: Duration,
    active: Arc<AtomicBool>,
    events_emitted: Arc<AtomicU64>,
    last_event_at: Arc<RwLock<Option<DateTime<Utc>>>>,
    task: Mutex<Option<JoinHandle<()>>>,
    /// Monotone across restarts so addresses never repeat
    sequence: Arc<AtomicU64>,
}

impl SyntheticMonitor {
    pub fn new(launch_interval: Duration) -> Self {
        Self {
            launch_interval,
            active: Arc::new(AtomicBool::new(false)),
            events_emitted: Arc::new(AtomicU64::new(0)),
            last_event_at: Arc::new(RwLock::new(None)),
            task: Mutex::new(None),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }
}

#[async_trait]
impl LaunchMonitor for SyntheticMonitor {
    async fn start_monitoring(&self) -> Result<mpsc::Receiver<LaunchEvent>, MonitorError> {
        let mut task = self.task.lock().await;
        if task.is_some() {
            return Err(MonitorError::AlreadyRunning);
        }

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        self.active.store(true, Ordering::SeqCst);

        let active = self.active.clone();
        let emitted = self.events_emitted.clone();
        let last_event_at = self.last_event_at.clone();
        let sequence = self.sequence.clone();
        let interval = self.launch_interval;

        *task = Some(tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                let n = sequence.fetch_add(1, Ordering::SeqCst) + 1;
                let event = LaunchEvent {
                    token_address: format!("PaperMint{:08}", n),
                    bonding_curve_address: format!("PaperCurve{:08}", n),
                    creator: format!("PaperCreator{:04}", n % 100),
                    timestamp: Utc::now(),
                };
                debug!("Synthetic launch {}", event.token_address);
                emitted.fetch_add(1, Ordering::SeqCst);
                *last_event_at.write().await = Some(event.timestamp);
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            active.store(false, Ordering::SeqCst);
        }));

        info!(
            "Synthetic launch monitor started (one launch every {:?})",
            self.launch_interval
        );
        Ok(rx)
    }

    async fn stop_monitoring(&self) -> Result<(), MonitorError> {
        if let Some(task) = self.task.lock().await.take() {
            task.abort();
        }
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn health(&self) -> MonitorHealth {
        MonitorHealth {
            active: self.active.load(Ordering::SeqCst),
            events_emitted: self.events_emitted.load(Ordering::SeqCst),
            last_event_at: *self.last_event_at.read().await,
        }
    }
}
