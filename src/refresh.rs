//! Background refresh scheduling
//!
//! A single repeating task decides when an automatic fetch is due and tells
//! the main loop through a tokio channel. The same channel carries fetch
//! completions from spawned request tasks back to the UI loop, which is the
//! only place state is mutated.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::debug;

use crate::app::CycleTicket;
use crate::data::{FetchError, LiveFixtures};
use crate::rate_limit::SharedRateLimit;

/// Default auto-refresh cadence
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Messages delivered to the main loop
#[derive(Debug)]
pub enum RefreshMessage {
    /// The timer fired and the rate limit leaves room for an automatic fetch
    AutoRefreshDue,
    /// A spawned fetch finished
    FetchCompleted {
        ticket: CycleTicket,
        result: Result<LiveFixtures, FetchError>,
    },
}

/// Configuration for the auto-refresh timer
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between ticks
    pub interval: Duration,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            enabled: true,
        }
    }
}

/// Handle owning the background timer task and the message channel
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    sender: mpsc::Sender<RefreshMessage>,
    /// Dropping or signalling this stops the timer task
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Creates a RefreshHandle and spawns the timer task
    ///
    /// # Arguments
    /// * `config` - Timer cadence and on/off switch
    /// * `rate_limit` - Shared cell read at every tick
    ///
    /// # Returns
    /// A RefreshHandle that receives updates via the `receiver` channel
    pub fn spawn(config: RefreshConfig, rate_limit: SharedRateLimit) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            let interval_length = config.interval;
            let tx = msg_tx.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(interval_length);
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            let state = rate_limit
                                .snapshot()
                                .rolled_over(Utc::now().timestamp_millis());

                            if !state.can_auto_fetch() {
                                debug!(remaining = state.remaining, "Auto-refresh held back to keep buffer");
                                continue;
                            }

                            if tx.send(RefreshMessage::AutoRefreshDue).await.is_err() {
                                break;
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
                debug!("Auto-refresh timer stopped");
            });
        }

        Self {
            receiver: msg_rx,
            sender: msg_tx,
            shutdown_tx,
        }
    }

    /// Sender for delivering fetch completions into the same channel
    pub fn sender(&self) -> mpsc::Sender<RefreshMessage> {
        self.sender.clone()
    }

    /// Shuts down the background timer task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

/// Checks for pending refresh messages without blocking
///
/// # Returns
/// * `Some(RefreshMessage)` if a message was available
/// * `None` if no messages are pending
pub fn try_recv(handle: &mut RefreshHandle) -> Option<RefreshMessage> {
    handle.receiver.try_recv().ok()
}
