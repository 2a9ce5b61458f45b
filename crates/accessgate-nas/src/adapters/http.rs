//! HTTP bridge adapter.
//!
//! Forwards commands as JSON to an external adapter service, which speaks
//! the vendor protocol (RouterOS API, UniFi controller, RADIUS CoA, ...).

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use accessgate_core::config::nas::HttpBridgeConfig;
use accessgate_core::error::{AppError, ErrorKind};
use accessgate_core::result::AppResult;

use crate::adapter::{ControlCommand, NasAdapter, NasResponse};
use crate::method::ConnectionMethod;

#[derive(Serialize)]
struct BridgeRequest<'a> {
    connection_method: ConnectionMethod,
    #[serde(flatten)]
    command: &'a ControlCommand,
}

/// Sends `POST {base_url}/control` for one connection method.
#[derive(Debug, Clone)]
pub struct HttpNasAdapter {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
    method: ConnectionMethod,
}

impl HttpNasAdapter {
    /// Create a bridge adapter for `method`.
    pub fn new(
        config: &HttpBridgeConfig,
        method: ConnectionMethod,
        timeout: Duration,
    ) -> AppResult<Self> {
        if config.base_url.trim().is_empty() {
            return Err(AppError::configuration(
                "nas.http.base_url is required for the HTTP bridge",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;
        Ok(Self {
            client,
            endpoint: format!("{}/control", config.base_url.trim_end_matches('/')),
            auth_token: config.auth_token.clone(),
            method,
        })
    }
}

#[async_trait]
impl NasAdapter for HttpNasAdapter {
    fn name(&self) -> &str {
        self.method.as_str()
    }

    async fn send_control(&self, command: &ControlCommand) -> AppResult<NasResponse> {
        let body = BridgeRequest {
            connection_method: self.method,
            command,
        };
        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::adapter_timeout(format!("NAS bridge timed out: {e}"))
            } else {
                AppError::with_source(
                    ErrorKind::AdapterRejected,
                    format!("NAS bridge request failed: {e}"),
                    e,
                )
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(
                request_id = %command.request_id,
                method = %self.method,
                status = status.as_u16(),
                "NAS bridge returned an error status"
            );
            return Ok(NasResponse::nak(
                Some(i32::from(status.as_u16())),
                format!("bridge returned HTTP {status}"),
            ));
        }

        let answer: NasResponse = response.json().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::AdapterRejected,
                format!("Malformed NAS bridge response: {e}"),
                e,
            )
        })?;
        debug!(
            request_id = %command.request_id,
            success = answer.success,
            "NAS bridge answered"
        );
        Ok(answer)
    }
}
