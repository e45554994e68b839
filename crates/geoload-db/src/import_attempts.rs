//! Database operations for `import_attempts`, the per-upload audit trail.

use chrono::{DateTime, Utc};
use geoload_core::{truncate_chars, ImportAttempt, MAX_ERROR_MESSAGE_LEN, MAX_FILENAME_LEN};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `import_attempts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImportAttemptRow {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: i64,
    pub filename: String,
    pub success: bool,
    /// The schema defines this as `INTEGER NOT NULL DEFAULT 0`.
    pub location_count: i32,
    pub skipped_rows: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl From<ImportAttemptRow> for ImportAttempt {
    fn from(row: ImportAttemptRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            user_id: row.user_id,
            filename: row.filename,
            success: row.success,
            location_count: row.location_count,
            skipped_rows: row.skipped_rows,
            error_message: row.error_message,
            created_at: row.created_at,
            completed_at: row.completed_at,
        }
    }
}

const ATTEMPT_COLUMNS: &str = "id, public_id, user_id, filename, success, location_count, \
                               skipped_rows, error_message, created_at, completed_at";

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Records a new upload attempt with `success = false` and `location_count = 0`.
///
/// Generates a UUID in Rust and binds it to `public_id`. Filenames longer than
/// the column allows are truncated. Returns the full newly-created row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_import_attempt(
    pool: &PgPool,
    user_id: i64,
    filename: &str,
) -> Result<ImportAttemptRow, DbError> {
    let public_id = Uuid::new_v4();
    let filename = truncate_chars(filename, MAX_FILENAME_LEN);

    let row = sqlx::query_as::<_, ImportAttemptRow>(&format!(
        "INSERT INTO import_attempts (public_id, user_id, filename) \
         VALUES ($1, $2, $3) \
         RETURNING {ATTEMPT_COLUMNS}"
    ))
    .bind(public_id)
    .bind(user_id)
    .bind(&filename)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks an attempt as successful with the number of persisted and skipped rows.
///
/// Only an attempt that has not been completed yet is updated.
///
/// # Errors
///
/// Returns [`DbError::AttemptAlreadyCompleted`] if the attempt was already
/// completed (or does not exist), or [`DbError::Sqlx`] if the update fails.
pub async fn complete_import_attempt(
    pool: &PgPool,
    id: i64,
    location_count: i32,
    skipped_rows: i32,
) -> Result<ImportAttemptRow, DbError> {
    sqlx::query_as::<_, ImportAttemptRow>(&format!(
        "UPDATE import_attempts \
         SET success = TRUE, location_count = $1, skipped_rows = $2, completed_at = NOW() \
         WHERE id = $3 AND completed_at IS NULL \
         RETURNING {ATTEMPT_COLUMNS}"
    ))
    .bind(location_count)
    .bind(skipped_rows)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::AttemptAlreadyCompleted { id })
}

/// Marks an attempt as failed, storing `error_message` truncated to 500 characters.
///
/// `success` stays `false` and `location_count` stays `0`.
///
/// # Errors
///
/// Returns [`DbError::AttemptAlreadyCompleted`] if the attempt was already
/// completed (or does not exist), or [`DbError::Sqlx`] if the update fails.
pub async fn fail_import_attempt(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<ImportAttemptRow, DbError> {
    let error_message = truncate_chars(error_message, MAX_ERROR_MESSAGE_LEN);

    sqlx::query_as::<_, ImportAttemptRow>(&format!(
        "UPDATE import_attempts \
         SET error_message = $1, completed_at = NOW() \
         WHERE id = $2 AND completed_at IS NULL \
         RETURNING {ATTEMPT_COLUMNS}"
    ))
    .bind(&error_message)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::AttemptAlreadyCompleted { id })
}

/// Fetches a single attempt by its internal `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_import_attempt(pool: &PgPool, id: i64) -> Result<ImportAttemptRow, DbError> {
    sqlx::query_as::<_, ImportAttemptRow>(&format!(
        "SELECT {ATTEMPT_COLUMNS} FROM import_attempts WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Returns a user's most recent `limit` attempts, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_import_attempts(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<ImportAttemptRow>, DbError> {
    let rows = sqlx::query_as::<_, ImportAttemptRow>(&format!(
        "SELECT {ATTEMPT_COLUMNS} \
         FROM import_attempts \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
