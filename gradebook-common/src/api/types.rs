//! Shared API response types

use serde::{Deserialize, Serialize};

/// Error body returned by every failing endpoint
///
/// # Examples
///
/// ```
/// use gradebook_common::api::types::ErrorResponse;
///
/// let body = ErrorResponse::new("BAD_REQUEST", "Missing firstName");
/// let json = serde_json::to_value(&body).unwrap();
/// assert_eq!(json["error"]["code"], "BAD_REQUEST");
/// assert_eq!(json["error"]["message"], "Missing firstName");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Machine-readable code plus a short human-readable message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
