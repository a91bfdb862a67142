use serde::{Deserialize, Serialize};

pub const MSG_PHONE_REQUIRED: &str = "phone number is required";
pub const MSG_MALFORMED_BODY: &str = "request body must be JSON with a phoneNumber string";
pub const MSG_NOT_FOUND: &str = "no record for this phone number";
pub const MSG_INTERNAL: &str = "server error while searching";
pub const MSG_STORE_UNAVAILABLE: &str = "record store unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    Unavailable,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    pub fn not_found() -> Self {
        Self::new(ErrorCode::NotFound, MSG_NOT_FOUND)
    }

    /// The public face of any infrastructure failure. Callers log the
    /// underlying cause before converting.
    pub fn internal() -> Self {
        Self::new(ErrorCode::Internal, MSG_INTERNAL)
    }
}
