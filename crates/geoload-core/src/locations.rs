use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default cap on archive size accepted for import (5 MB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
/// Hard cap on the number of records persisted by one import.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;
/// Maximum location name length, in characters, after trimming.
pub const MAX_NAME_LEN: usize = 100;
/// Maximum stored length of an import attempt's error message, in characters.
pub const MAX_ERROR_MESSAGE_LEN: usize = 500;
/// Maximum stored length of an uploaded filename, in characters.
pub const MAX_FILENAME_LEN: usize = 255;

pub const LATITUDE_RANGE: RangeInclusive<f64> = -90.0..=90.0;
pub const LONGITUDE_RANGE: RangeInclusive<f64> = -180.0..=180.0;

/// An unvalidated `(name, latitude, longitude)` triple lifted from one line of
/// the text payload. Coordinates are kept verbatim; numeric conversion happens
/// during batch validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub name: String,
    pub raw_latitude: String,
    pub raw_longitude: String,
}

/// A candidate record whose name and coordinates passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A location row committed to the store for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedLocation {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

/// Durable audit record of one upload.
///
/// Inserted with `success = false` and `location_count = 0` before any
/// processing, then completed exactly once with the final [`ImportOutcome`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportAttempt {
    pub id: i64,
    pub public_id: Uuid,
    pub user_id: i64,
    pub filename: String,
    pub success: bool,
    pub location_count: i32,
    /// Rows the parser dropped as malformed (too few fields, empty name).
    pub skipped_rows: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    /// `None` until the attempt has been completed.
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportAttempt {
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Final result recorded against an [`ImportAttempt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    Succeeded {
        location_count: i32,
        skipped_rows: i32,
    },
    Failed {
        message: String,
    },
}

impl ImportOutcome {
    /// Build a failure outcome, truncating `message` to
    /// [`MAX_ERROR_MESSAGE_LEN`] characters.
    #[must_use]
    pub fn failed(message: &str) -> Self {
        Self::Failed {
            message: truncate_chars(message, MAX_ERROR_MESSAGE_LEN),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Truncate `s` to at most `max` characters without splitting a code point.
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
