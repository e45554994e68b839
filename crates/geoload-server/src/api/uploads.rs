use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use geoload_import::{
    run_import, ImportError, ImportRequest, ImportSummary, LocationPreview, PgImportStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::{AuthenticatedUser, RequestId};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

/// Multipart part holding the archive.
const UPLOAD_FIELD: &str = "file";
const NO_FILE_MESSAGE: &str = "No file uploaded";
const NOT_ZIP_MESSAGE: &str = "Only .zip files are allowed. Please upload a .zip file.";

#[derive(Debug, Serialize)]
pub(super) struct UploadData {
    success: bool,
    message: String,
    count: usize,
    skipped_rows: usize,
    locations: Vec<LocationPreview>,
}

impl From<ImportSummary> for UploadData {
    fn from(summary: ImportSummary) -> Self {
        Self {
            success: true,
            message: format!("{} locations uploaded successfully", summary.count),
            count: summary.count,
            skipped_rows: summary.skipped_rows,
            locations: summary.preview,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct UploadsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct UploadItem {
    upload_id: Uuid,
    filename: String,
    success: bool,
    location_count: i32,
    skipped_rows: i32,
    error_message: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

struct Upload {
    filename: String,
    bytes: Bytes,
}

pub(super) async fn upload_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthenticatedUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<UploadData>>, ApiError> {
    let mut multipart =
        multipart.map_err(|e| ApiError::bad_request(req_id.0.clone(), e.body_text()))?;

    let upload = read_upload(&mut multipart, state.limits.max_upload_bytes)
        .await
        .map_err(|message| ApiError::bad_request(req_id.0.clone(), message))?;

    let store = PgImportStore::new(state.pool.clone());
    let request = ImportRequest {
        user_id: user.0,
        filename: &upload.filename,
        archive: &upload.bytes,
    };

    let summary = run_import(&store, &store, state.limits, request)
        .await
        .map_err(|e| map_import_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: UploadData::from(summary),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_uploads(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(user): Extension<AuthenticatedUser>,
    Query(query): Query<UploadsQuery>,
) -> Result<Json<ApiResponse<Vec<UploadItem>>>, ApiError> {
    let rows = geoload_db::list_import_attempts(&state.pool, user.0, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows
        .into_iter()
        .map(|row| UploadItem {
            upload_id: row.public_id,
            filename: row.filename,
            success: row.success,
            location_count: row.location_count,
            skipped_rows: row.skipped_rows,
            error_message: row.error_message,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Pull the `file` part out of the request. Errors are uploader-facing
/// messages; nothing has been audited yet when one is returned.
async fn read_upload(multipart: &mut Multipart, max_upload_bytes: usize) -> Result<Upload, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error_message(&e, max_upload_bytes))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if !has_zip_extension(&filename) {
            return Err(NOT_ZIP_MESSAGE.to_string());
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error_message(&e, max_upload_bytes))?;

        return Ok(Upload { filename, bytes });
    }

    Err(NO_FILE_MESSAGE.to_string())
}

fn has_zip_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".zip")
}

fn multipart_error_message(error: &MultipartError, max_upload_bytes: usize) -> String {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        format!("File size too large. Maximum size is {max_upload_bytes} bytes")
    } else {
        error.body_text()
    }
}

fn map_import_error(request_id: String, error: &ImportError) -> ApiError {
    ApiError::new(request_id, error.code(), error.public_message())
}
