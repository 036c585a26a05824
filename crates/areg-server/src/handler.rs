use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use areg_registry::{
    AccessStatus, AnalyticsRecord, AssetDraft, AssetId, AssetView, AuditEntry, AuditId, GrantRequest,
    MetadataUpdate, Permissions, RevisionDraft, Sequence, SessionRequest, SystemStatistics,
    VersionNumber, VersionRecord,
};
use areg_types::Principal;

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "areg-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn stats_handler(State(app): State<AppState>) -> ServerResult<Json<SystemStatistics>> {
    Ok(Json(app.registry.system_statistics()?))
}

pub async fn verify_handler(State(app): State<AppState>) -> ServerResult<Json<Value>> {
    let entries = app.registry.verify_audit_chain()?;
    Ok(Json(json!({ "valid": true, "entries": entries })))
}

// ---- Lifecycle ----

pub async fn register_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Json(draft): Json<AssetDraft>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let ctx = app.context(&headers).await?;
    let id = app.registry.register(draft, &ctx)?;
    app.persist().await?;
    Ok((StatusCode::CREATED, Json(json!({ "asset_id": id, "version": VersionNumber::INITIAL }))))
}

pub async fn read_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<Json<AssetView>> {
    let ctx = app.context(&headers).await?;
    let view = app.registry.read(AssetId::new(id), &ctx)?;
    app.persist_counters().await?;
    Ok(Json(view))
}

pub async fn revise_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(draft): Json<RevisionDraft>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let ctx = app.context(&headers).await?;
    let version = app.registry.revise(AssetId::new(id), draft, &ctx)?;
    app.persist().await?;
    Ok((StatusCode::CREATED, Json(json!({ "asset_id": id, "version": version }))))
}

pub async fn history_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<Json<Vec<VersionRecord>>> {
    let ctx = app.context(&headers).await?;
    Ok(Json(app.registry.history(AssetId::new(id), &ctx)?))
}

pub async fn version_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path((id, version)): Path<(u64, u64)>,
) -> ServerResult<Json<VersionRecord>> {
    let ctx = app.context(&headers).await?;
    Ok(Json(app.registry.version(AssetId::new(id), VersionNumber::new(version), &ctx)?))
}

pub async fn metadata_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(update): Json<MetadataUpdate>,
) -> ServerResult<StatusCode> {
    let ctx = app.context(&headers).await?;
    app.registry.update_metadata(AssetId::new(id), update, &ctx)?;
    app.persist().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn retire_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<StatusCode> {
    let ctx = app.context(&headers).await?;
    app.registry.retire(AssetId::new(id), &ctx)?;
    app.persist().await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- Access control ----

#[derive(Debug, Deserialize, Serialize)]
pub struct GrantBody {
    pub user: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub admin: bool,
    pub expires_at: Option<u64>,
}

pub async fn grant_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<GrantBody>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let ctx = app.context(&headers).await?;
    let target = parse_principal(&body.user)?;
    let request = GrantRequest::new(
        target.clone(),
        Permissions::new(body.read, body.write, body.admin),
        body.expires_at.map(Sequence::new),
    );
    let grant = app.registry.grant_access(AssetId::new(id), request, &ctx)?;
    app.persist().await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": target, "grant": grant }))))
}

pub async fn list_grants_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<Json<Value>> {
    let ctx = app.context(&headers).await?;
    let grants: Vec<Value> = app
        .registry
        .grants(AssetId::new(id), &ctx)?
        .into_iter()
        .map(|(user, grant)| json!({ "user": user, "grant": grant }))
        .collect();
    Ok(Json(Value::Array(grants)))
}

pub async fn revoke_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path((id, user)): Path<(u64, String)>,
) -> ServerResult<Json<Value>> {
    let ctx = app.context(&headers).await?;
    let target = parse_principal(&user)?;
    let removed = app.registry.revoke_access(AssetId::new(id), &target, &ctx)?;
    app.persist().await?;
    Ok(Json(json!({ "removed": removed })))
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub user: Option<String>,
}

pub async fn access_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(query): Query<AccessQuery>,
) -> ServerResult<Json<AccessStatus>> {
    let ctx = app.context(&headers).await?;
    let now = match ctx.sequence() {
        Some(now) => now,
        None => app.registry.next_sequence()?,
    };
    let user = match query.user {
        Some(user) => parse_principal(&user)?,
        None => ctx.caller,
    };
    Ok(Json(app.registry.access_status(AssetId::new(id), &user, now)?))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TransferBody {
    pub new_owner: String,
}

pub async fn transfer_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<TransferBody>,
) -> ServerResult<Json<Value>> {
    let ctx = app.context(&headers).await?;
    let new_owner = parse_principal(&body.new_owner)?;
    app.registry.transfer_ownership(AssetId::new(id), &new_owner, &ctx)?;
    app.persist().await?;
    Ok(Json(json!({ "asset_id": id, "owner": new_owner })))
}

pub async fn owner_handler(State(app): State<AppState>, Path(id): Path<u64>) -> ServerResult<Json<Value>> {
    let owner = app.registry.owner(AssetId::new(id))?;
    Ok(Json(json!({ "asset_id": id, "owner": owner })))
}

// ---- Ratings, analytics, passthroughs ----

#[derive(Debug, Deserialize, Serialize)]
pub struct RatingBody {
    pub rating: u8,
}

pub async fn rate_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<RatingBody>,
) -> ServerResult<Json<AnalyticsRecord>> {
    let ctx = app.context(&headers).await?;
    let analytics = app.registry.rate(AssetId::new(id), body.rating, &ctx)?;
    app.persist().await?;
    Ok(Json(analytics))
}

pub async fn download_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<Json<AnalyticsRecord>> {
    let ctx = app.context(&headers).await?;
    let analytics = app.registry.record_download(AssetId::new(id), &ctx)?;
    app.persist_counters().await?;
    Ok(Json(analytics))
}

pub async fn analytics_handler(
    State(app): State<AppState>,
    Path(id): Path<u64>,
) -> ServerResult<Json<AnalyticsRecord>> {
    Ok(Json(app.registry.analytics(AssetId::new(id))?))
}

#[derive(Debug, Deserialize)]
pub struct AuditRangeQuery {
    pub from: Option<u64>,
    pub to: Option<u64>,
}

pub async fn audit_range_handler(
    State(app): State<AppState>,
    Query(query): Query<AuditRangeQuery>,
) -> ServerResult<Json<Vec<AuditEntry>>> {
    let from = AuditId::new(query.from.unwrap_or(1));
    let to = AuditId::new(query.to.unwrap_or(u64::MAX));
    Ok(Json(app.registry.audit_range(from, to)?))
}

pub async fn audit_handler(
    State(app): State<AppState>,
    Path(id): Path<u64>,
) -> ServerResult<Json<Vec<AuditEntry>>> {
    Ok(Json(app.registry.audit_trail(Some(AssetId::new(id)))?))
}

pub async fn session_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(request): Json<SessionRequest>,
) -> ServerResult<(StatusCode, Json<Value>)> {
    let ctx = app.context(&headers).await?;
    let session = app
        .registry
        .create_collaboration_session(AssetId::new(id), request, &ctx)?;
    app.persist().await?;
    Ok((StatusCode::CREATED, Json(json!({ "asset_id": id, "session_id": session }))))
}

pub async fn subscribe_handler(
    State(app): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> ServerResult<Json<Value>> {
    let ctx = app.context(&headers).await?;
    let added = app.registry.subscribe(AssetId::new(id), &ctx)?;
    if added {
        app.persist().await?;
    }
    Ok(Json(json!({ "asset_id": id, "subscribed": true, "new": added })))
}

fn parse_principal(text: &str) -> ServerResult<Principal> {
    Principal::parse(text).map_err(|e| ServerError::BadRequest(format!("principal '{text}': {e}")))
}
