//! End-to-end import of one uploaded archive.
//!
//! ```text
//! Created -> Extracting -> Parsing -> Validating -> Persisting -> Completed(success)
//!                \____________\____________\____________\______> Completed(failure)
//! ```
//!
//! `Created` is entered by [`ImportLog::begin`]. Whatever happens afterwards,
//! the attempt is completed exactly once.

use std::fmt;

use geoload_core::{
    AppConfig, ImportAttempt, ImportOutcome, PersistedLocation, ValidatedLocation,
    DEFAULT_MAX_BATCH_SIZE, DEFAULT_MAX_UPLOAD_BYTES,
};
use serde::Serialize;

use crate::archive::extract_text;
use crate::error::{ImportError, ValidationError};
use crate::parser::parse_records;
use crate::store::{ImportLog, LocationSink};
use crate::validate::validate_batch;

/// Number of persisted records echoed back in an [`ImportSummary`].
pub const PREVIEW_LIMIT: usize = 10;

/// Resource bounds applied to every import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_upload_bytes: usize,
    pub max_batch_size: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl ImportLimits {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            max_batch_size: config.max_batch_size,
        }
    }
}

/// One upload to import on behalf of `user_id`.
#[derive(Debug, Clone, Copy)]
pub struct ImportRequest<'a> {
    pub user_id: i64,
    pub filename: &'a str,
    pub archive: &'a [u8],
}

/// The non-terminal pipeline states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Extracting,
    Parsing,
    Validating,
    Persisting,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStage::Extracting => write!(f, "extracting"),
            ImportStage::Parsing => write!(f, "parsing"),
            ImportStage::Validating => write!(f, "validating"),
            ImportStage::Persisting => write!(f, "persisting"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationPreview {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&PersistedLocation> for LocationPreview {
    fn from(loc: &PersistedLocation) -> Self {
        Self {
            id: loc.id,
            name: loc.name.clone(),
            latitude: loc.latitude,
            longitude: loc.longitude,
        }
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub attempt_id: i64,
    /// Records persisted.
    pub count: usize,
    /// Malformed rows the parser dropped.
    pub skipped_rows: usize,
    /// The first [`PREVIEW_LIMIT`] persisted records, in input order.
    pub preview: Vec<LocationPreview>,
}

struct Persisted {
    locations: Vec<PersistedLocation>,
    skipped_rows: usize,
}

/// Run the whole pipeline for one upload.
///
/// An audit attempt is created before anything else and completed exactly
/// once on every exit path. A failure to write the final audit update is
/// logged but does not change the result: a committed batch is still
/// reported as a success, and a failed import still returns its own error.
///
/// # Errors
///
/// Returns [`ImportError::AuditLog`] if the attempt cannot be created, or the
/// error of the first failing stage otherwise.
pub async fn run_import<L, S>(
    log: &L,
    sink: &S,
    limits: ImportLimits,
    request: ImportRequest<'_>,
) -> Result<ImportSummary, ImportError>
where
    L: ImportLog + Sync,
    S: LocationSink + Sync,
{
    let attempt = log
        .begin(request.user_id, request.filename)
        .await
        .map_err(ImportError::AuditLog)?;

    tracing::info!(
        user_id = request.user_id,
        attempt_id = attempt.id,
        filename = request.filename,
        bytes = request.archive.len(),
        "import started"
    );

    match process(sink, limits, request).await {
        Ok(persisted) => {
            let count = persisted.locations.len();
            let outcome = ImportOutcome::Succeeded {
                location_count: to_i32(count),
                skipped_rows: to_i32(persisted.skipped_rows),
            };
            complete_best_effort(log, &attempt, &outcome).await;

            tracing::info!(
                user_id = request.user_id,
                attempt_id = attempt.id,
                count,
                skipped_rows = persisted.skipped_rows,
                "import completed"
            );

            Ok(ImportSummary {
                attempt_id: attempt.id,
                count,
                skipped_rows: persisted.skipped_rows,
                preview: persisted
                    .locations
                    .iter()
                    .take(PREVIEW_LIMIT)
                    .map(LocationPreview::from)
                    .collect(),
            })
        }
        Err((stage, error)) => {
            if error.is_client_error() {
                tracing::warn!(
                    user_id = request.user_id,
                    attempt_id = attempt.id,
                    %stage,
                    error = %error,
                    "import rejected"
                );
            } else {
                tracing::error!(
                    user_id = request.user_id,
                    attempt_id = attempt.id,
                    %stage,
                    error = %error,
                    "import failed"
                );
            }

            let outcome = ImportOutcome::failed(&error.to_string());
            complete_best_effort(log, &attempt, &outcome).await;
            Err(error)
        }
    }
}

async fn process<S>(
    sink: &S,
    limits: ImportLimits,
    request: ImportRequest<'_>,
) -> Result<Persisted, (ImportStage, ImportError)>
where
    S: LocationSink + Sync,
{
    tracing::debug!(stage = %ImportStage::Extracting, "import stage");
    let extracted = extract_text(request.archive, limits.max_upload_bytes)
        .map_err(|e| (ImportStage::Extracting, ImportError::from(e)))?;

    tracing::debug!(
        stage = %ImportStage::Parsing,
        entry = %extracted.entry_name,
        "import stage"
    );
    tracing::debug!(stage = %ImportStage::Validating, "import stage");
    let (validated, skipped_rows) = parse_and_validate(&extracted.text, limits.max_batch_size);
    if skipped_rows > 0 {
        tracing::info!(skipped_rows, "dropped malformed rows");
    }

    let validated = validated.map_err(|e| (ImportStage::Validating, ImportError::from(e)))?;

    tracing::debug!(
        stage = %ImportStage::Persisting,
        count = validated.len(),
        "import stage"
    );
    let locations = sink
        .persist(request.user_id, &validated)
        .await
        .map_err(|e| (ImportStage::Persisting, ImportError::Persistence(e)))?;

    Ok(Persisted {
        locations,
        skipped_rows,
    })
}

/// Parse `text` and validate the candidates as one batch. The dropped-row
/// count is returned whether or not validation succeeds.
fn parse_and_validate(
    text: &str,
    max_batch_size: usize,
) -> (Result<Vec<ValidatedLocation>, ValidationError>, usize) {
    let mut records = parse_records(text);
    let validated = validate_batch(records.by_ref(), max_batch_size);
    (validated, records.skipped())
}

async fn complete_best_effort<L>(log: &L, attempt: &ImportAttempt, outcome: &ImportOutcome)
where
    L: ImportLog + Sync,
{
    if let Err(e) = log.complete(attempt, outcome).await {
        tracing::error!(
            attempt_id = attempt.id,
            success = outcome.is_success(),
            error = %e,
            "failed to record import outcome"
        );
    }
}

fn to_i32(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
