//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, HealthResponse, InfoResponse, ReadQuery, ReadResponse, WriteRequest,
    WriteResponse,
};
use crate::orchestrator::CacheContext;
use crate::record::{Body, CacheProfile, CacheRequest, Connection, Expiration};

/// Host recorded in the connection of every request the service caches.
pub const SERVICE_HOST: &str = "tiercache.local";

/// Response header carrying the read status.
pub const CACHE_STATUS_HEADER: &str = "x-cache-status";

/// Application state shared across all handlers.
///
/// The cache context is built once at startup; each request gets its own
/// orchestrator.
#[derive(Debug, Clone)]
pub struct AppState {
    pub context: Arc<CacheContext>,
    /// TTL applied to records written through the service
    pub default_expiration_seconds: u64,
}

impl AppState {
    pub fn new(context: Arc<CacheContext>, default_expiration_seconds: u64) -> Self {
        Self {
            context,
            default_expiration_seconds,
        }
    }

    /// Maps a path key onto a cacheable request.
    pub fn request_for(&self, key: &str, private: bool) -> CacheRequest {
        let profile = CacheProfile::new(
            "service",
            Expiration::Ttl(self.default_expiration_seconds),
        )
        .encrypted(private);
        CacheRequest::new(Connection::new(SERVICE_HOST, format!("/{}", key)), profile)
    }
}

/// Handler for GET /cache/:key
///
/// Reads through L0 and the remote tiers. Backend outages are reported in
/// the status, not as errors; only an empty record yields 404.
pub async fn read_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<ReadQuery>,
) -> Result<Response> {
    if let Some(error_msg) = validate_key(&key) {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut orchestrator = state.context.orchestrator(state.request_for(&key, query.private));
    let result = orchestrator.read().await?;

    let code = if result.record.is_empty() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    let status = HeaderValue::from_static(result.status.as_str());
    let mut response = (code, Json(ReadResponse::new(key, result))).into_response();
    response
        .headers_mut()
        .insert(HeaderName::from_static(CACHE_STATUS_HEADER), status);
    Ok(response)
}

/// Handler for PUT /cache/:key
///
/// Writes straight through to the remote tier selected by size. Backend
/// failures surface as 502.
pub async fn write_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<WriteRequest>,
) -> Result<Json<WriteResponse>> {
    if let Some(error_msg) = validate_key(&key).or_else(|| req.validate()) {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    if req.private && !state.context.codec().seals_private_records() {
        return Err(CacheError::InvalidRequest(
            "private records require encryption, which is not configured".to_string(),
        ));
    }

    let mut orchestrator = state.context.orchestrator(state.request_for(&key, req.private));
    let record = orchestrator
        .write(Body::Text(req.body), &req.headers, req.status_code.to_string())
        .await?;

    Ok(Json(WriteResponse::new(key, &record)))
}

/// Handler for GET /info
pub async fn info_handler(State(state): State<AppState>) -> Json<InfoResponse> {
    Json(InfoResponse::from(state.context.info()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
