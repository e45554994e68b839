use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::{AuthenticatedUser, RequestId};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct LocationsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct LocationItem {
    id: i64,
    name: String,
    latitude: f64,
    longitude: f64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct LocationsPage {
    total: i64,
    locations: Vec<LocationItem>,
}

/// The caller's locations, newest first, with the caller's total count.
pub(super) async fn list_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<LocationsQuery>,
) -> Result<Json<ApiResponse<LocationsPage>>, ApiError> {
    let total = geoload_db::count_locations_for_user(&state.pool, user.0)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let rows =
        geoload_db::list_locations_for_user(&state.pool, user.0, normalize_limit(query.limit))
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let locations = rows
        .into_iter()
        .map(|row| LocationItem {
            id: row.id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data: LocationsPage { total, locations },
        meta: ResponseMeta::new(req_id.0),
    }))
}
