//! Response envelope shared by every HTTP endpoint.
//!
//! NAS firmware and admin tooling receive the same `{status, message}` shape
//! whatever the outcome, with endpoint-specific fields flattened alongside.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Outcome marker carried in every envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The request was handled.
    Ok,
    /// The request failed.
    Error,
}

/// Standard API envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// `ok` or `error`.
    pub status: ResponseStatus,
    /// Human-readable message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Machine-readable error code; only set on errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Endpoint-specific payload.
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying a payload.
    pub fn ok(data: T) -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: None,
            code: None,
            data: Some(data),
        }
    }

    /// Attach a message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    /// Successful response with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: Some(message.into()),
            code: None,
            data: None,
        }
    }

    /// Error envelope built from an application error.
    pub fn error(err: &AppError) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(err.message.clone()),
            code: Some(err.kind.code().to_string()),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Processed {
        processed_requests: u32,
    }

    #[test]
    fn test_payload_is_flattened() {
        let body = ApiResponse::ok(Processed {
            processed_requests: 3,
        })
        .with_message("drained");
        let json = serde_json::to_value(&body).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"status": "ok", "message": "drained", "processed_requests": 3})
        );
    }

    #[test]
    fn test_error_envelope_has_code() {
        let json = serde_json::to_value(ApiResponse::error(&AppError::session_not_found("s1")))
            .expect("serialize");
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "SESSION_NOT_FOUND");
        assert_eq!(json["message"], "Session 's1' not found");
    }
}
