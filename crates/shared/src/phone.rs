//! Phone-number rules shared by the form controller and the lookup endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PHONE_NUMBER_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PhoneInputError {
    #[error("phone number required")]
    Missing,
    #[error("phone number must be exactly 10 digits")]
    WrongLength,
}

/// Keeps ASCII digits only and caps the result at [`PHONE_NUMBER_LEN`].
pub fn normalize_input(raw: &str) -> String {
    raw.chars()
        .filter(char::is_ascii_digit)
        .take(PHONE_NUMBER_LEN)
        .collect()
}

/// Client-side gate applied before any request leaves the form.
pub fn precheck(normalized: &str) -> Result<(), PhoneInputError> {
    if normalized.trim().is_empty() {
        return Err(PhoneInputError::Missing);
    }
    if normalized.chars().count() != PHONE_NUMBER_LEN {
        return Err(PhoneInputError::WrongLength);
    }
    Ok(())
}

/// How the server turns the submitted value into the store query key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhoneMatch {
    /// Trim surrounding whitespace, then compare byte for byte.
    #[default]
    Exact,
    /// Drop every non-digit before comparing.
    DigitsOnly,
}

impl PhoneMatch {
    /// `None` means there is nothing left to search for.
    pub fn query_key(self, raw: &str) -> Option<String> {
        let key = match self {
            Self::Exact => raw.trim().to_string(),
            Self::DigitsOnly => raw.chars().filter(char::is_ascii_digit).collect(),
        };
        (!key.is_empty()).then_some(key)
    }
}
