//! Write operations for the `locations` table.

use geoload_core::ValidatedLocation;
use sqlx::PgPool;

use super::types::LocationRow;
use crate::DbError;

/// Insert a whole batch of validated locations for `user_id` atomically.
///
/// The batch is written with a single `INSERT … SELECT FROM UNNEST(…)` inside
/// a transaction: either every row is committed or none is. Returned rows
/// carry their generated `id` and `created_at` and are in input order.
///
/// An empty slice is a no-op and returns an empty vector.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the transaction cannot be opened, the insert
/// violates a table constraint, or the commit fails. Nothing is persisted in
/// any of those cases.
pub async fn insert_location_batch(
    pool: &PgPool,
    user_id: i64,
    locations: &[ValidatedLocation],
) -> Result<Vec<LocationRow>, DbError> {
    if locations.is_empty() {
        return Ok(Vec::new());
    }

    let mut names: Vec<String> = Vec::with_capacity(locations.len());
    let mut latitudes: Vec<f64> = Vec::with_capacity(locations.len());
    let mut longitudes: Vec<f64> = Vec::with_capacity(locations.len());

    for loc in locations {
        names.push(loc.name.clone());
        latitudes.push(loc.latitude);
        longitudes.push(loc.longitude);
    }

    let mut tx = pool.begin().await?;

    let mut rows = sqlx::query_as::<_, LocationRow>(
        "INSERT INTO locations (user_id, name, latitude, longitude) \
         SELECT $1, t.name, t.latitude, t.longitude \
         FROM UNNEST($2::text[], $3::float8[], $4::float8[]) \
              WITH ORDINALITY AS t(name, latitude, longitude, ord) \
         ORDER BY t.ord \
         RETURNING id, user_id, name, latitude, longitude, created_at",
    )
    .bind(user_id)
    .bind(&names)
    .bind(&latitudes)
    .bind(&longitudes)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    // Ids are assigned in insert order, which follows the ordinality above.
    rows.sort_by_key(|row| row.id);

    Ok(rows)
}
