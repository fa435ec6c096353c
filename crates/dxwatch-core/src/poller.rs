// ── Telemetry polling task ──
//
// The metrics store only records the cadence; this task honours it.
// The interval is re-read from the store before every sleep, so a
// `set_polling_interval` takes effect after the current wait.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::monitor::Monitor;

/// Background poller feeding the metrics store.
///
/// Polls once immediately, then sleeps for the store's current
/// `polling_interval` between ticks. A zero interval is treated as 1 ms.
/// Failed ticks are logged and recorded in the store; the loop keeps going.
/// Stopping mid-request abandons the request, and the store's loading flag
/// is released as the request future is dropped.
pub struct MetricsPoller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl MetricsPoller {
    /// Spawn the poll loop on the current tokio runtime.
    pub fn spawn(monitor: Arc<Monitor>, cancel: CancellationToken) -> Self {
        let handle = tokio::spawn(poll_task(monitor, cancel.clone()));
        Self { cancel, handle }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "metrics poller did not shut down cleanly");
        }
    }
}

pub(crate) fn effective_interval(ms: u64) -> Duration {
    Duration::from_millis(ms.max(1))
}

async fn poll_task(monitor: Arc<Monitor>, cancel: CancellationToken) {
    debug!("metrics poller started");
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = monitor.poll_metrics_once() => {
                if let Err(e) = result {
                    warn!(error = %e, "metrics poll failed");
                }
            }
        }

        let period = effective_interval(monitor.metrics_store().polling_interval());
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(period) => {}
        }
    }
    debug!("metrics poller stopped");
}
