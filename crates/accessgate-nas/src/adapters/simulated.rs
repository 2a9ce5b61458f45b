//! Simulated NAS adapter.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use accessgate_core::config::nas::SimulatedAdapterConfig;
use accessgate_core::result::AppResult;

use crate::adapter::{ControlCommand, NasAdapter, NasResponse};

/// Logs each command and answers with a fixed outcome.
///
/// Scripted outcomes, when queued, are consumed first in order. Tests use
/// them to drive specific ACK/NAK/error sequences.
#[derive(Debug)]
pub struct SimulatedNasAdapter {
    acknowledge: bool,
    latency: Duration,
    script: Mutex<VecDeque<AppResult<NasResponse>>>,
    sent: Mutex<Vec<ControlCommand>>,
}

impl SimulatedNasAdapter {
    /// Create an adapter from configuration.
    pub fn new(config: &SimulatedAdapterConfig) -> Self {
        Self {
            acknowledge: config.acknowledge,
            latency: Duration::from_millis(config.latency_ms),
            script: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// An adapter that acknowledges immediately.
    pub fn acknowledging() -> Self {
        Self::new(&SimulatedAdapterConfig::default())
    }

    /// Queue the outcome for the next unscripted call.
    pub async fn push_outcome(&self, outcome: AppResult<NasResponse>) {
        self.script.lock().await.push_back(outcome);
    }

    /// Commands received so far.
    pub async fn sent(&self) -> Vec<ControlCommand> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NasAdapter for SimulatedNasAdapter {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn send_control(&self, command: &ControlCommand) -> AppResult<NasResponse> {
        info!(
            request_id = %command.request_id,
            session_id = %command.session_id,
            nas_ip = %command.nas_ip_address,
            request_type = %command.request_type,
            reason = command.attributes.reason(),
            "Simulated NAS control"
        );
        self.sent.lock().await.push(command.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(outcome) = self.script.lock().await.pop_front() {
            return outcome;
        }
        Ok(if self.acknowledge {
            NasResponse::ack(Some(0))
        } else {
            NasResponse::nak(Some(1), "simulated NAK")
        })
    }
}
