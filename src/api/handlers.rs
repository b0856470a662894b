//! HTTP request handlers for the chash service.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::Error;
use crate::registry::Registry;
use crate::ring::RingStats;
use crate::types::ServiceConfig;

/// Application state shared across handlers.
pub struct AppState {
    pub registry: Arc<Registry>,
    pub config: ServiceConfig,
}

/// Error body returned for failed requests.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::GroupNotFound | Error::NoResultMatched => StatusCode::NOT_FOUND,
            Error::GroupExists | Error::KeyExists => StatusCode::CONFLICT,
            Error::Decode(_) | Error::InvalidReplicas(_) => StatusCode::BAD_REQUEST,
        };
        let body = ErrorResponse {
            code: self.code(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Run ring work that hashes or sorts positions on the blocking pool.
///
/// A ring with many replicas can spend milliseconds rebuilding its index,
/// which must not stall the async workers.
async fn run_blocking<F, T>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(result) => result.map_err(IntoResponse::into_response),
        Err(e) => {
            error!(error = %e, "Ring task failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
    groups: usize,
}

/// Health check endpoint.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        groups: state.registry.len(),
    })
}

/// List group names.
pub async fn list_groups(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.registry.group_names())
}

/// Request to create a group.
#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    /// Falls back to the configured default
    pub replicas: Option<usize>,
}

/// Create a group. The replica count must be within `1..=MAX_REPLICAS`.
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<RingStats>), Error> {
    let replicas = request.replicas.unwrap_or(state.config.default_replicas);
    let ring = state.registry.create_group(&request.name, replicas)?;
    Ok((StatusCode::CREATED, Json(ring.stats())))
}

/// Get a group's distribution statistics.
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Result<Json<RingStats>, Error> {
    let ring = state.registry.get_group(&group)?;
    Ok(Json(ring.stats()))
}

/// Remove a group.
pub async fn remove_group(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
) -> Result<StatusCode, Error> {
    state.registry.remove_group(&group)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Options for storing an entry.
#[derive(Debug, Default, Deserialize)]
pub struct PutEntryParams {
    /// Replace an existing entry instead of failing
    #[serde(default)]
    pub upsert: bool,
}

/// Store an entry. The request body is the payload.
pub async fn put_entry(
    State(state): State<Arc<AppState>>,
    Path((group, key)): Path<(String, String)>,
    Query(params): Query<PutEntryParams>,
    payload: Bytes,
) -> Result<StatusCode, Response> {
    let registry = Arc::clone(&state.registry);
    run_blocking(move || {
        if params.upsert {
            let replaced = registry.upsert(&group, &key, payload.to_vec())?;
            return Ok(if replaced {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            });
        }

        registry.insert(&group, &key, payload.to_vec())?;
        Ok(StatusCode::CREATED)
    })
    .await
}

/// Delete an entry. Absent keys still succeed.
pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path((group, key)): Path<(String, String)>,
) -> Result<StatusCode, Response> {
    let registry = Arc::clone(&state.registry);
    run_blocking(move || registry.delete(&group, &key)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Query carrying the key to resolve.
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    pub key: String,
}

/// Matched owner of a key.
#[derive(Debug, Serialize, Deserialize)]
pub struct MatchResponse {
    pub key: String,
    /// Base64-encoded payload
    pub payload: String,
    /// Ring position of the queried key
    pub hash: u32,
}

/// Resolve the entry responsible for a key.
pub async fn match_key(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<MatchResponse>, Error> {
    let ring = state.registry.get_group(&group)?;
    let hash = ring.hash_of(&query.key);
    let owner = ring.match_hash(hash)?;
    Ok(Json(MatchResponse {
        key: owner.key.clone(),
        payload: STANDARD.encode(&owner.payload),
        hash,
    }))
}

/// Ring position of a key.
#[derive(Debug, Serialize, Deserialize)]
pub struct HashResponse {
    pub key: String,
    pub hash: u32,
}

/// Report where a key lands on a group's ring.
pub async fn hash_key(
    State(state): State<Arc<AppState>>,
    Path(group): Path<String>,
    Query(query): Query<KeyQuery>,
) -> Result<Json<HashResponse>, Error> {
    let ring = state.registry.get_group(&group)?;
    let hash = ring.hash_of(&query.key);
    Ok(Json(HashResponse {
        key: query.key,
        hash,
    }))
}

/// Serialize the whole registry.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Result<Response, Error> {
    let data = state.registry.serialize()?;
    Ok(([(header::CONTENT_TYPE, "application/json")], data).into_response())
}

/// Restore groups from a snapshot body.
pub async fn put_snapshot(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<StatusCode, Response> {
    let registry = Arc::clone(&state.registry);
    run_blocking(move || {
        registry.restore(&body).map_err(|e| {
            warn!(error = %e, "Rejected snapshot");
            e
        })
    })
    .await?;
    info!(groups = state.registry.len(), "Snapshot restored over HTTP");
    Ok(StatusCode::NO_CONTENT)
}
