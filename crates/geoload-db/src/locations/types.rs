//! Row types for the `locations` table.

use chrono::{DateTime, Utc};
use geoload_core::PersistedLocation;

/// A row from the `locations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

impl From<LocationRow> for PersistedLocation {
    fn from(row: LocationRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            created_at: row.created_at,
        }
    }
}
