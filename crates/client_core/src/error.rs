use thiserror::Error;

pub const MSG_NO_INFORMATION: &str = "no information found";
pub const MSG_SEARCH_FAILED: &str = "an error occurred while searching, please try again";

#[derive(Debug, Error)]
pub enum LookupError {
    /// Non-2xx response carrying a readable `{ "error": ... }` body.
    #[error("lookup rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    /// 2xx response without a record in it.
    #[error("lookup succeeded without a record")]
    EmptyResult,
    #[error("failed to decode lookup response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("lookup request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl LookupError {
    /// Text shown inline under the form.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message, .. } => message.clone(),
            Self::EmptyResult => MSG_NO_INFORMATION.to_string(),
            Self::Decode(_) | Self::Transport(_) => MSG_SEARCH_FAILED.to_string(),
        }
    }
}
