//! Read operations for the `locations` table.

use sqlx::PgPool;

use super::types::LocationRow;
use crate::DbError;

/// List a user's locations, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_locations_for_user(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<LocationRow>, DbError> {
    let rows = sqlx::query_as::<_, LocationRow>(
        "SELECT id, user_id, name, latitude, longitude, created_at \
         FROM locations \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count the locations owned by `user_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_locations_for_user(pool: &PgPool, user_id: i64) -> Result<i64, DbError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM locations WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(count)
}
