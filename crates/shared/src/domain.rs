use serde::{Deserialize, Serialize};

/// An invitation letter as exposed to visitors.
///
/// Exactly the four public fields; the store's native id never leaves the
/// server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationRecord {
    pub name: String,
    pub email: String,
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    #[serde(
        rename = "letterURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub letter_url: Option<String>,
}

impl InvitationRecord {
    /// Returns the letter link when one is present and non-blank.
    pub fn letter_url(&self) -> Option<&str> {
        self.letter_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}
