use shared::{
    domain::InvitationRecord,
    error::{ApiError, ErrorCode, MSG_PHONE_REQUIRED, MSG_STORE_UNAVAILABLE},
    phone::PhoneMatch,
};
use storage::StoreHandle;
use tracing::{debug, error};

#[derive(Clone)]
pub struct ApiContext {
    pub store: StoreHandle,
    pub phone_match: PhoneMatch,
}

impl ApiContext {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            phone_match: PhoneMatch::default(),
        }
    }

    pub fn with_phone_match(mut self, phone_match: PhoneMatch) -> Self {
        self.phone_match = phone_match;
        self
    }
}

/// Looks up the invitation registered under `phone_number`.
///
/// Input is validated before the store is touched, so a missing or blank
/// number never opens a connection or issues a query.
pub async fn search_invitation(
    ctx: &ApiContext,
    phone_number: Option<&str>,
) -> Result<InvitationRecord, ApiError> {
    let key = phone_number
        .and_then(|raw| ctx.phone_match.query_key(raw))
        .ok_or_else(|| ApiError::validation(MSG_PHONE_REQUIRED))?;

    let store = ctx.store.get().await.map_err(internal)?;
    let stored = store
        .find_by_phone(&key)
        .await
        .map_err(internal)?
        .ok_or_else(ApiError::not_found)?;

    debug!(record_id = %stored.id, backend = store.backend(), "invitation found");
    Ok(stored.into())
}

/// Connects if needed and pings the store.
pub async fn check_ready(ctx: &ApiContext) -> Result<(), ApiError> {
    let store = ctx.store.get().await.map_err(unavailable)?;
    store.health_check().await.map_err(unavailable)
}

fn internal(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "invitation search failed");
    ApiError::internal()
}

fn unavailable(err: anyhow::Error) -> ApiError {
    error!(error = %format!("{err:#}"), "record store is not ready");
    ApiError::new(ErrorCode::Unavailable, MSG_STORE_UNAVAILABLE)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
