use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use server_api::{check_ready, search_invitation, ApiContext};
use shared::{
    error::{ApiError, ErrorCode, MSG_MALFORMED_BODY},
    protocol::{ErrorBody, SearchRequest, SearchResponse, SEARCH_ROUTE},
};
use storage::{redact_database_url, StoreHandle};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod settings;

use app_state::AppState;
use settings::{load_settings, normalize_database_url};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings()?;
    if settings.uses_insecure_default() {
        warn!("no database_url configured; using the built-in development connection string");
    }
    let database_url = normalize_database_url(&settings.database_url);

    // The store connects on the first request that needs it.
    let store = StoreHandle::from_url(database_url.clone(), settings.database_name.clone());
    let api = ApiContext::new(store).with_phone_match(settings.phone_match);
    let app = build_router(Arc::new(AppState { api }), settings.max_body_bytes);

    let addr: SocketAddr = settings
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.bind_addr))?;
    info!(
        %addr,
        database_url = %redact_database_url(&database_url),
        phone_match = ?settings.phone_match,
        "server listening"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route(SEARCH_ROUTE, post(search))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `ApiError` rendered as `{ "error": message }` with the matching status.
struct HttpError(ApiError);

impl From<ApiError> for HttpError {
    fn from(value: ApiError) -> Self {
        Self(value)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::Validation => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody::new(self.0.message))).into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn readyz(State(state): State<Arc<AppState>>) -> Result<&'static str, HttpError> {
    check_ready(&state.api).await?;
    Ok("ok")
}

// The body is parsed by hand so a missing or wrong content-type is not an
// error of its own.
async fn search(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SearchResponse>, HttpError> {
    let request: SearchRequest = serde_json::from_slice(&body).map_err(|error| {
        debug!(%error, "rejected search request body");
        ApiError::validation(MSG_MALFORMED_BODY)
    })?;

    let record = search_invitation(&state.api, request.phone_number.as_deref()).await?;
    Ok(Json(SearchResponse::found(record)))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
