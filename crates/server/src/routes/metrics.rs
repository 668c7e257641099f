use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::error;

use loadline_core::{summarize, CallMetricsSummary};

use super::{ApiError, AppState};

const MAX_AGGREGATION_LIMIT: u32 = 10_000;

#[derive(Debug, Default, Deserialize)]
pub struct MetricsQuery {
    /// Optional cap on how many recent call records to aggregate; all records
    /// when omitted.
    pub limit: Option<u32>,
}

pub async fn summary(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<CallMetricsSummary>, (StatusCode, Json<ApiError>)> {
    if let Some(limit) = query.limit {
        if limit == 0 || limit > MAX_AGGREGATION_LIMIT {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(ApiError {
                    error: format!("limit must be in range 1..={MAX_AGGREGATION_LIMIT}"),
                }),
            ));
        }
    }

    let logs = state.call_logs.fetch_recent(query.limit).await.map_err(|repository_error| {
        error!(
            event_name = "metrics.fetch_failed",
            error = %repository_error,
            "call metrics query failed against the data store"
        );
        (
            StatusCode::BAD_GATEWAY,
            Json(ApiError { error: "Failed to query call metrics".to_string() }),
        )
    })?;

    Ok(Json(summarize(&logs)))
}
