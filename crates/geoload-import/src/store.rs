//! Storage seams used by the import pipeline.
//!
//! [`ImportLog`] owns the audit trail and [`LocationSink`] the atomic batch
//! write. [`PgImportStore`] implements both on top of `geoload-db`.

use std::future::Future;

use geoload_core::{ImportAttempt, ImportOutcome, PersistedLocation, ValidatedLocation};
use geoload_db::DbError;
use sqlx::PgPool;

/// Audit trail for upload attempts.
pub trait ImportLog {
    /// Record a new attempt (`success = false`, `location_count = 0`).
    fn begin(
        &self,
        user_id: i64,
        filename: &str,
    ) -> impl Future<Output = Result<ImportAttempt, DbError>> + Send;

    /// Record the final outcome of `attempt`. Called once per attempt.
    fn complete(
        &self,
        attempt: &ImportAttempt,
        outcome: &ImportOutcome,
    ) -> impl Future<Output = Result<ImportAttempt, DbError>> + Send;
}

/// Atomic, user-scoped batch write of validated locations.
pub trait LocationSink {
    /// Persist every record or none. Returned rows are in input order.
    fn persist(
        &self,
        user_id: i64,
        locations: &[ValidatedLocation],
    ) -> impl Future<Output = Result<Vec<PersistedLocation>, DbError>> + Send;
}

/// Postgres-backed [`ImportLog`] and [`LocationSink`].
#[derive(Debug, Clone)]
pub struct PgImportStore {
    pool: PgPool,
}

impl PgImportStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ImportLog for PgImportStore {
    async fn begin(&self, user_id: i64, filename: &str) -> Result<ImportAttempt, DbError> {
        let row = geoload_db::create_import_attempt(&self.pool, user_id, filename).await?;
        Ok(row.into())
    }

    async fn complete(
        &self,
        attempt: &ImportAttempt,
        outcome: &ImportOutcome,
    ) -> Result<ImportAttempt, DbError> {
        let row = match outcome {
            ImportOutcome::Succeeded {
                location_count,
                skipped_rows,
            } => {
                geoload_db::complete_import_attempt(
                    &self.pool,
                    attempt.id,
                    *location_count,
                    *skipped_rows,
                )
                .await?
            }
            ImportOutcome::Failed { message } => {
                geoload_db::fail_import_attempt(&self.pool, attempt.id, message).await?
            }
        };
        Ok(row.into())
    }
}

impl LocationSink for PgImportStore {
    async fn persist(
        &self,
        user_id: i64,
        locations: &[ValidatedLocation],
    ) -> Result<Vec<PersistedLocation>, DbError> {
        let rows = geoload_db::insert_location_batch(&self.pool, user_id, locations).await?;
        Ok(rows.into_iter().map(PersistedLocation::from).collect())
    }
}
