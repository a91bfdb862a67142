use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::{open_store, redact_database_url, InvitationStore};

/// Establishes a connection to the record store.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn InvitationStore>>;
}

/// Connects by URL scheme, see [`crate::open_store`].
#[derive(Debug, Clone)]
pub struct UrlConnector {
    database_url: String,
    database_name: Option<String>,
}

impl UrlConnector {
    pub fn new(database_url: impl Into<String>, database_name: Option<String>) -> Self {
        Self {
            database_url: database_url.into(),
            database_name,
        }
    }
}

#[async_trait]
impl StoreConnector for UrlConnector {
    async fn connect(&self) -> Result<Arc<dyn InvitationStore>> {
        info!(
            database_url = %redact_database_url(&self.database_url),
            "connecting to record store"
        );
        open_store(&self.database_url, self.database_name.as_deref()).await
    }
}

struct Preconnected(Arc<dyn InvitationStore>);

#[async_trait]
impl StoreConnector for Preconnected {
    async fn connect(&self) -> Result<Arc<dyn InvitationStore>> {
        Ok(Arc::clone(&self.0))
    }
}

struct Inner {
    connector: Box<dyn StoreConnector>,
    store: OnceCell<Arc<dyn InvitationStore>>,
}

/// Process-wide handle to the record store.
///
/// The connection is opened on first use and kept for the life of the
/// handle. Concurrent first callers wait on the same in-flight attempt; a
/// failed attempt leaves the handle empty and the next caller tries again.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Inner>,
}

impl StoreHandle {
    pub fn lazy(connector: impl StoreConnector + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector: Box::new(connector),
                store: OnceCell::new(),
            }),
        }
    }

    pub fn from_url(database_url: impl Into<String>, database_name: Option<String>) -> Self {
        Self::lazy(UrlConnector::new(database_url, database_name))
    }

    /// Wraps a store that is already open.
    pub fn ready(store: Arc<dyn InvitationStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector: Box::new(Preconnected(Arc::clone(&store))),
                store: OnceCell::new_with(Some(store)),
            }),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.store.initialized()
    }

    pub async fn get(&self) -> Result<Arc<dyn InvitationStore>> {
        let store = self
            .inner
            .store
            .get_or_try_init(|| async {
                match self.inner.connector.connect().await {
                    Ok(store) => {
                        info!(backend = store.backend(), "record store connected");
                        Ok(store)
                    }
                    Err(error) => {
                        warn!(error = %format!("{error:#}"), "record store connection failed");
                        Err(error)
                    }
                }
            })
            .await?;
        Ok(Arc::clone(store))
    }
}
