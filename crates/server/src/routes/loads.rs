use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use loadline_core::Load;
use loadline_db::repositories::LoadFilters;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct LoadSearchQuery {
    pub origin: String,
    pub destination: String,
    pub equipment_type: String,
}

#[derive(Debug, Serialize)]
pub struct LoadListResponse {
    pub data: Vec<Load>,
}

/// Search unbooked loads by lane and equipment. Booked loads are filtered at
/// the query, never surfaced to carriers.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<LoadSearchQuery>,
) -> Result<Json<LoadListResponse>, (StatusCode, Json<ApiError>)> {
    info!(
        event_name = "loads.search",
        origin = %query.origin,
        destination = %query.destination,
        equipment_type = %query.equipment_type,
        "searching loads"
    );

    let filters = LoadFilters {
        origin: query.origin,
        destination: query.destination,
        equipment_type: query.equipment_type,
    };

    let data = state.loads.search(&filters).await.map_err(|repository_error| {
        error!(
            event_name = "loads.search_failed",
            error = %repository_error,
            "load search failed against the data store"
        );
        (
            StatusCode::BAD_GATEWAY,
            Json(ApiError { error: "Failed to query data store".to_string() }),
        )
    })?;

    Ok(Json(LoadListResponse { data }))
}
