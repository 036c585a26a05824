use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all registry endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route("/v1/stats", get(handler::stats_handler))
        .route("/v1/audit", get(handler::audit_range_handler))
        .route("/v1/audit/verify", get(handler::verify_handler))
        .route("/v1/assets", post(handler::register_handler))
        .route("/v1/assets/:id", get(handler::read_handler))
        .route(
            "/v1/assets/:id/versions",
            get(handler::history_handler).post(handler::revise_handler),
        )
        .route("/v1/assets/:id/versions/:version", get(handler::version_handler))
        .route("/v1/assets/:id/metadata", put(handler::metadata_handler))
        .route(
            "/v1/assets/:id/grants",
            get(handler::list_grants_handler).post(handler::grant_handler),
        )
        .route("/v1/assets/:id/grants/:user", delete(handler::revoke_handler))
        .route("/v1/assets/:id/access", get(handler::access_handler))
        .route("/v1/assets/:id/transfer", post(handler::transfer_handler))
        .route("/v1/assets/:id/retire", post(handler::retire_handler))
        .route("/v1/assets/:id/ratings", post(handler::rate_handler))
        .route("/v1/assets/:id/downloads", post(handler::download_handler))
        .route("/v1/assets/:id/analytics", get(handler::analytics_handler))
        .route("/v1/assets/:id/owner", get(handler::owner_handler))
        .route("/v1/assets/:id/audit", get(handler::audit_handler))
        .route("/v1/assets/:id/sessions", post(handler::session_handler))
        .route("/v1/assets/:id/subscriptions", post(handler::subscribe_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS layer for the configured origins, or `None` when none are set.
pub fn build_cors_layer(config: &ServerConfig) -> ServerResult<Option<CorsLayer>> {
    if config.cors_origins.is_empty() {
        return Ok(None);
    }
    let origins = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| ServerError::Config(format!("cors origin '{o}': {e}")))
        })
        .collect::<ServerResult<Vec<_>>>()?;
    let header = |name: &str| {
        HeaderName::try_from(name.to_ascii_lowercase())
            .map_err(|e| ServerError::Config(format!("header '{name}': {e}")))
    };

    let layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            CONTENT_TYPE,
            header(&config.caller_header)?,
            header(&config.sequence_header)?,
        ])
        .max_age(Duration::from_secs(3600));
    Ok(Some(layer))
}
