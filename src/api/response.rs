use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorCode};

/// Uniform envelope for the action endpoint. Business failures still
/// travel as HTTP 200 with `success=false`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
}

impl ActionResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            code: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
            code: None,
        }
    }

    pub fn failure(message: impl Into<String>, code: Option<ErrorCode>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            data: None,
            code,
        }
    }
}

impl From<ApiError> for ActionResponse {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Business { code, message } => Self::failure(message, Some(code)),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "store failure while handling action");
                Self::failure(e.to_string(), None)
            }
        }
    }
}
