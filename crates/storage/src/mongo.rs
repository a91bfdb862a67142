//! MongoDB backend, gated behind the `mongodb` feature.
//!
//! Documents live in the `invitationLetter` collection with camelCase field
//! names. Fields the import left out decode as empty strings.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Bson},
    Client, Collection, Database,
};
use serde::Deserialize;

use crate::{first_match, InvitationStore, StoredInvitation, DUPLICATE_PROBE_LIMIT};

pub const COLLECTION_NAME: &str = "invitationLetter";
pub const DEFAULT_DATABASE_NAME: &str = "invitations";

#[derive(Debug, Deserialize)]
struct InvitationDocument {
    #[serde(rename = "_id")]
    id: Bson,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "phoneNumber", default)]
    phone_number: Option<String>,
    #[serde(rename = "letterURL", default)]
    letter_url: Option<String>,
}

impl From<InvitationDocument> for StoredInvitation {
    fn from(value: InvitationDocument) -> Self {
        let id = match value.id {
            Bson::ObjectId(oid) => oid.to_hex(),
            Bson::String(id) => id,
            other => other.to_string(),
        };
        Self {
            id,
            email: value.email.unwrap_or_default(),
            name: value.name.unwrap_or_default(),
            phone_number: value.phone_number.unwrap_or_default(),
            letter_url: value.letter_url,
        }
    }
}

#[derive(Clone, Debug)]
pub struct MongoInvitationStore {
    database: Database,
}

impl MongoInvitationStore {
    /// Parses the connection string, selects the database and pings it.
    ///
    /// The database is `database_name` if given, else the one named in the
    /// URL path, else [`DEFAULT_DATABASE_NAME`].
    pub async fn connect(uri: &str, database_name: Option<&str>) -> Result<Self> {
        let client = Client::with_uri_str(uri)
            .await
            .context("failed to parse mongodb connection string")?;
        let database = match database_name {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE_NAME)),
        };
        let store = Self { database };
        store.health_check().await?;
        Ok(store)
    }

    fn collection(&self) -> Collection<InvitationDocument> {
        self.database.collection(COLLECTION_NAME)
    }
}

#[async_trait]
impl InvitationStore for MongoInvitationStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<StoredInvitation>> {
        let cursor = self
            .collection()
            .find(doc! { "phoneNumber": phone_number })
            .limit(DUPLICATE_PROBE_LIMIT)
            .await
            .context("invitation lookup query failed")?;
        let documents: Vec<InvitationDocument> = cursor
            .try_collect()
            .await
            .context("failed to read invitation lookup results")?;

        let matches = documents.into_iter().map(StoredInvitation::from).collect();
        Ok(first_match(self.backend(), phone_number, matches))
    }

    async fn health_check(&self) -> Result<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .context("mongodb ping failed")?;
        Ok(())
    }
}
