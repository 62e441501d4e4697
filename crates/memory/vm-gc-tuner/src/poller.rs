//! Polling fallback
//!
//! For hosts that cannot report collection completion, a tokio task samples
//! the live heap on a fixed interval and runs the same feedback callback.
//! Responsiveness is bounded by the interval instead of the collector cadence.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::GcTuner;

/// Smallest accepted polling interval
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Periodic driver for [`GcTuner::on_collection_completed`]
pub struct PollingDriver {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl PollingDriver {
    /// Spawn the polling task on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    pub fn spawn(tuner: Arc<GcTuner>, interval: Duration) -> Self {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => tuner.on_collection_completed(),
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            log::debug!("gc tuner polling stopped");
        });

        log::info!("gc tuner polling every {interval:?}");
        Self {
            shutdown,
            handle: Some(handle),
            interval,
        }
    }

    /// Effective polling interval
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stop polling and wait for the task to exit
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log::warn!("gc tuner polling task failed: {err}");
            }
        }
    }
}

impl Drop for PollingDriver {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
    }
}
