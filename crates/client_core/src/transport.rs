use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::InvitationRecord,
    protocol::{ErrorBody, SearchRequest, SearchResponse, SEARCH_ROUTE},
};

use crate::error::{LookupError, MSG_NO_INFORMATION};

#[async_trait]
pub trait LookupTransport: Send + Sync {
    async fn search(&self, phone_number: &str) -> Result<InvitationRecord, LookupError>;
}

/// Talks to `POST /api/search`. No retries and no client-side timeout.
#[derive(Clone)]
pub struct HttpLookupClient {
    http: Client,
    server_url: String,
}

impl HttpLookupClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into().trim_end_matches('/').to_string();
        Self { http, server_url }
    }

    pub fn search_url(&self) -> String {
        format!("{}{SEARCH_ROUTE}", self.server_url)
    }
}

#[async_trait]
impl LookupTransport for HttpLookupClient {
    async fn search(&self, phone_number: &str) -> Result<InvitationRecord, LookupError> {
        let response = self
            .http
            .post(self.search_url())
            .json(&SearchRequest::new(phone_number))
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let error: ErrorBody = serde_json::from_slice(&body)?;
            let message = error
                .error
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| MSG_NO_INFORMATION.to_string());
            return Err(LookupError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        match serde_json::from_slice::<SearchResponse>(&body)? {
            SearchResponse {
                success: true,
                data: Some(record),
            } => Ok(record),
            _ => Err(LookupError::EmptyResult),
        }
    }
}
