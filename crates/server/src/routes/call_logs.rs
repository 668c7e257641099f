use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use loadline_core::{CallLogEntry, CallLogId, LoadId, NewCallLog, RepositoryError};

use super::{ApiError, AppState};

const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 500;

#[derive(Debug, Deserialize)]
pub struct CreateCallLogRequest {
    pub load_id: String,
    pub call_started_at: DateTime<Utc>,
    pub sentiment: Option<String>,
    pub outcome: String,
    pub round_count: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CallLogListResponse {
    pub data: Vec<CallLogEntry>,
    pub total: u64,
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateCallLogRequest>,
) -> Result<(StatusCode, Json<CallLogEntry>), (StatusCode, Json<ApiError>)> {
    if request.outcome.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError { error: "outcome must not be empty".to_string() }),
        ));
    }

    let entry = state
        .call_logs
        .create(NewCallLog {
            load_id: LoadId(request.load_id),
            call_started_at: request.call_started_at,
            sentiment: request.sentiment,
            outcome: request.outcome,
            round_count: request.round_count,
        })
        .await
        .map_err(|repository_error| store_failure("create", repository_error))?;

    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CallLogListResponse>, (StatusCode, Json<ApiError>)> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError { error: format!("limit must be in range 1..={MAX_PAGE_SIZE}") }),
        ));
    }
    let offset = query.offset.unwrap_or(0);

    let (data, total) = state
        .call_logs
        .list(limit, offset)
        .await
        .map_err(|repository_error| store_failure("list", repository_error))?;

    Ok(Json(CallLogListResponse { data, total }))
}

pub async fn get_by_id(
    State(state): State<AppState>,
    Path(call_id): Path<String>,
) -> Result<Json<CallLogEntry>, (StatusCode, Json<ApiError>)> {
    let entry = state
        .call_logs
        .find_by_id(&CallLogId(call_id))
        .await
        .map_err(|repository_error| store_failure("get", repository_error))?;

    match entry {
        Some(entry) => Ok(Json(entry)),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(ApiError { error: "Call log not found".to_string() }),
        )),
    }
}

fn store_failure(
    operation: &'static str,
    repository_error: RepositoryError,
) -> (StatusCode, Json<ApiError>) {
    error!(
        event_name = "call_logs.store_failure",
        operation,
        error = %repository_error,
        "call log operation failed against the data store"
    );
    (StatusCode::BAD_GATEWAY, Json(ApiError { error: "Failed to query data store".to_string() }))
}
