use std::str::FromStr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};

use crate::{first_match, InvitationStore, StoredInvitation, DUPLICATE_PROBE_LIMIT};

/// Layout the SQLite backend reads from. The import process owns it; it is
/// published here so operators can provision a compatible file.
pub const SQLITE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS invitation_letters (
    id           INTEGER PRIMARY KEY,
    email        TEXT,
    name         TEXT,
    phone_number TEXT,
    letter_url   TEXT
);
CREATE INDEX IF NOT EXISTS idx_invitation_letters_phone_number
    ON invitation_letters (phone_number);
"#;

#[derive(Clone)]
pub struct SqliteInvitationStore {
    pool: Pool<Sqlite>,
}

impl SqliteInvitationStore {
    /// Opens an existing database file read-only.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(database_url)
            .context("invalid sqlite database url")?
            .read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await
            .context("failed to open sqlite record store")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

fn stored_invitation(row: &SqliteRow) -> Result<StoredInvitation> {
    Ok(StoredInvitation {
        id: row.try_get::<i64, _>("id")?.to_string(),
        email: row
            .try_get::<Option<String>, _>("email")?
            .unwrap_or_default(),
        name: row.try_get::<Option<String>, _>("name")?.unwrap_or_default(),
        phone_number: row
            .try_get::<Option<String>, _>("phone_number")?
            .unwrap_or_default(),
        letter_url: row.try_get::<Option<String>, _>("letter_url")?,
    })
}

#[async_trait]
impl InvitationStore for SqliteInvitationStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<StoredInvitation>> {
        let rows = sqlx::query(
            "SELECT id, email, name, phone_number, letter_url
             FROM invitation_letters
             WHERE phone_number = ?
             ORDER BY id
             LIMIT ?",
        )
        .bind(phone_number)
        .bind(DUPLICATE_PROBE_LIMIT)
        .fetch_all(&self.pool)
        .await
        .context("invitation lookup query failed")?;

        let matches = rows
            .iter()
            .map(stored_invitation)
            .collect::<Result<Vec<_>>>()?;
        Ok(first_match(self.backend(), phone_number, matches))
    }

    async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}
