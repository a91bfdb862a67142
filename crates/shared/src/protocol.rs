use serde::{Deserialize, Serialize};

use crate::domain::InvitationRecord;

pub const SEARCH_ROUTE: &str = "/api/search";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: Option<String>,
}

impl SearchRequest {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: Some(phone_number.into()),
        }
    }
}

/// `{ "success": true, "data": { ... } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<InvitationRecord>,
}

impl SearchResponse {
    pub fn found(record: InvitationRecord) -> Self {
        Self {
            success: true,
            data: Some(record),
        }
    }
}

/// Body of every non-2xx response: `{ "error": "..." }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
        }
    }
}
