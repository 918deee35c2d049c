use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::store::StoreError;

/// Closed set of business failure codes returned in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthRequired,
    AdminRequired,
    DeviceNotRegistered,
    InvalidSignature,
    DuplicateCheckIn,
    DuplicateCheckOut,
    LateCheckIn,
    CheckoutWindowBlocked,
    AttendanceLocked,
    MissingReason,
    DuplicateHoliday,
    LocationInvalid,
    ValidationError,
    NotFound,
    AlreadyExists,
    InvalidAction,
    MissingCheckIn,
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// A business rule rejected the request. Rendered with `success=false`
    /// and the code; never logged as a server error.
    #[error("{message}")]
    Business { code: ErrorCode, message: String },

    /// The store or another piece of infrastructure failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn business(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Business {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(what: &str) -> Self {
        Self::business(ErrorCode::NotFound, format!("{what} not found"))
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Business { code, .. } => Some(*code),
            Self::Store(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_wire_form() {
        let json = serde_json::to_string(&ErrorCode::LateCheckIn).unwrap();
        assert_eq!(json, "\"LATE_CHECK_IN\"");
        let json = serde_json::to_string(&ErrorCode::CheckoutWindowBlocked).unwrap();
        assert_eq!(json, "\"CHECKOUT_WINDOW_BLOCKED\"");
    }

    #[test]
    fn business_error_exposes_code_and_message() {
        let err = ApiError::business(ErrorCode::MissingReason, "Reason must be at least 10 characters");
        assert_eq!(err.code(), Some(ErrorCode::MissingReason));
        assert_eq!(err.to_string(), "Reason must be at least 10 characters");
    }
}
