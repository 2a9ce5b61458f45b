//! Dispatch runner: drains the control queue until shutdown.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;
use tracing;

use accessgate_core::config::dispatch::DispatchConfig;
use accessgate_service::ControlDispatchQueue;

/// Polls the control dispatch queue and drains it.
pub struct DispatchRunner {
    queue: Arc<ControlDispatchQueue>,
    batch_size: u32,
    poll_interval: Duration,
}

impl DispatchRunner {
    /// Create a new runner.
    pub fn new(queue: Arc<ControlDispatchQueue>, config: &DispatchConfig) -> Self {
        Self {
            queue,
            batch_size: config.batch_size.max(1),
            poll_interval: Duration::from_secs(config.poll_interval_seconds.max(1)),
        }
    }

    /// Override the poll interval.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run until the cancel signal is received. An in-flight drain always
    /// finishes so claimed requests are resolved before exit.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        tracing::info!(
            "Dispatch runner started with batch_size={}, poll_interval={}ms",
            self.batch_size,
            self.poll_interval.as_millis()
        );

        loop {
            let drained_full_batch = self.drain_once().await;

            // A full batch means more may be waiting; go again without sleeping.
            if drained_full_batch {
                if *cancel.borrow() {
                    break;
                }
                continue;
            }

            tokio::select! {
                _ = cancel.changed() => {
                    if *cancel.borrow() {
                        tracing::info!("Dispatch runner received shutdown signal");
                        break;
                    }
                }
                _ = time::sleep(self.poll_interval) => {}
            }
        }

        tracing::info!("Dispatch runner shut down complete");
    }

    /// Drain one batch. Returns whether the batch was full.
    async fn drain_once(&self) -> bool {
        match self.queue.drain(Some(self.batch_size)).await {
            Ok(report) => {
                if report.claimed > 0 {
                    tracing::debug!(
                        "Drained {} control requests ({} ack, {} nak)",
                        report.claimed,
                        report.acked,
                        report.naked
                    );
                }
                report.claimed >= self.batch_size as usize
            }
            Err(e) => {
                tracing::error!("Failed to drain control queue: {}", e);
                false
            }
        }
    }
}
