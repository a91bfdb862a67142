//! Read-only access to the invitation record store.
//!
//! Records are written by an external import process; nothing in this crate
//! creates, updates or deletes them.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use shared::domain::InvitationRecord;
use tracing::warn;
use url::Url;

mod handle;
mod memory;
#[cfg(feature = "mongodb")]
mod mongo;
mod sqlite;

pub use handle::{StoreConnector, StoreHandle, UrlConnector};
pub use memory::InMemoryInvitationStore;
#[cfg(feature = "mongodb")]
pub use mongo::{MongoInvitationStore, COLLECTION_NAME, DEFAULT_DATABASE_NAME};
pub use sqlite::{SqliteInvitationStore, SQLITE_SCHEMA};

/// Lookups fetch one row more than they return so duplicates can be reported.
pub(crate) const DUPLICATE_PROBE_LIMIT: i64 = 2;

/// A record as held by the store, including its native id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredInvitation {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone_number: String,
    pub letter_url: Option<String>,
}

impl From<StoredInvitation> for InvitationRecord {
    fn from(value: StoredInvitation) -> Self {
        Self {
            name: value.name,
            email: value.email,
            phone_number: value.phone_number,
            letter_url: value.letter_url,
        }
    }
}

#[async_trait]
pub trait InvitationStore: Send + Sync {
    fn backend(&self) -> &'static str;

    /// First record whose phone number equals `phone_number` byte for byte,
    /// in store order.
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<StoredInvitation>>;

    async fn health_check(&self) -> Result<()>;
}

/// Picks the first match and reports when the phone number is not unique.
pub(crate) fn first_match(
    backend: &'static str,
    phone_number: &str,
    matches: Vec<StoredInvitation>,
) -> Option<StoredInvitation> {
    if matches.len() > 1 {
        warn!(
            backend,
            phone_number,
            "multiple invitation records share this phone number; returning the first"
        );
    }
    matches.into_iter().next()
}

pub fn is_mongodb_url(database_url: &str) -> bool {
    database_url.starts_with("mongodb://") || database_url.starts_with("mongodb+srv://")
}

/// Opens the backend matching the URL scheme.
pub async fn open_store(
    database_url: &str,
    database_name: Option<&str>,
) -> Result<Arc<dyn InvitationStore>> {
    if is_mongodb_url(database_url) {
        #[cfg(feature = "mongodb")]
        {
            let store = MongoInvitationStore::connect(database_url, database_name).await?;
            return Ok(Arc::new(store));
        }
        #[cfg(not(feature = "mongodb"))]
        {
            let _ = database_name;
            bail!("this build has no MongoDB support; enable the `mongodb` feature");
        }
    }

    if database_url.starts_with("sqlite:") {
        let store = SqliteInvitationStore::connect(database_url).await?;
        return Ok(Arc::new(store));
    }

    bail!(
        "unsupported record store url '{}'",
        redact_database_url(database_url)
    )
}

/// Masks the password of a connection string so it can be logged.
pub fn redact_database_url(database_url: &str) -> String {
    let Ok(mut parsed) = Url::parse(database_url) else {
        return database_url.to_string();
    };
    if parsed.password().is_some() && parsed.set_password(Some("***")).is_ok() {
        return parsed.to_string();
    }
    database_url.to_string()
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
