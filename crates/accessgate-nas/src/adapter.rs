//! NAS adapter contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use accessgate_core::result::AppResult;
use accessgate_core::types::ControlRequestId;
use accessgate_entity::control::{ControlAttributes, ControlRequest, ControlRequestType};

/// A control command addressed to one NAS.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlCommand {
    /// Queue entry this command was built from.
    pub request_id: ControlRequestId,
    /// Target session.
    pub session_id: String,
    /// NAS address.
    pub nas_ip_address: String,
    /// NAS port identifier.
    pub nas_port_id: Option<String>,
    /// Disconnect or reauthorize.
    pub request_type: ControlRequestType,
    /// Reason and parameters.
    pub attributes: ControlAttributes,
}

impl From<&ControlRequest> for ControlCommand {
    fn from(request: &ControlRequest) -> Self {
        Self {
            request_id: request.id,
            session_id: request.session_id.clone(),
            nas_ip_address: request.nas_ip_address.clone(),
            nas_port_id: request.nas_port_id.clone(),
            request_type: request.request_type,
            attributes: request.attributes.clone(),
        }
    }
}

/// What the NAS said.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NasResponse {
    /// `true` for ACK, `false` for NAK.
    pub success: bool,
    /// Vendor or RADIUS response code.
    #[serde(default)]
    pub response_code: Option<i32>,
    /// Error detail for a NAK.
    #[serde(default)]
    pub error: Option<String>,
}

impl NasResponse {
    /// An acknowledgement.
    pub fn ack(response_code: Option<i32>) -> Self {
        Self {
            success: true,
            response_code,
            error: None,
        }
    }

    /// A negative acknowledgement.
    pub fn nak(response_code: Option<i32>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            response_code,
            error: Some(error.into()),
        }
    }
}

/// Delivers control commands to network equipment.
///
/// Implementations return `Ok` for any answer from the NAS, including a NAK,
/// and `Err` only when no answer could be obtained. Callers bound every call
/// with a timeout.
#[async_trait]
pub trait NasAdapter: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Send one command.
    async fn send_control(&self, command: &ControlCommand) -> AppResult<NasResponse>;
}
