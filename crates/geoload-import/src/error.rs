use geoload_db::DbError;
use thiserror::Error;

/// Problems with the uploaded archive container or its text member.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("File size too large. Maximum size is {limit} bytes (got {actual})")]
    TooLarge { limit: usize, actual: usize },

    #[error("ZIP must contain a .txt file")]
    NoTextFile,

    #[error(
        "ZIP must contain exactly one .txt file (found {}: {})",
        .names.len(),
        .names.join(", ")
    )]
    MultipleTextFiles { names: Vec<String> },

    #[error("Failed to parse ZIP file: {0}")]
    Corrupt(#[source] zip::result::ZipError),

    #[error("Text file {name} exceeds the {limit} byte extraction limit")]
    PayloadTooLarge { name: String, limit: u64 },

    #[error("Text file {name} is not valid UTF-8")]
    NotUtf8 { name: String },
}

/// Batch-level content errors. Any one of these rejects the whole upload.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("No valid locations found in the file")]
    NoValidRecords,

    #[error("Too many locations. Maximum allowed is {limit} (found {actual})")]
    BatchSizeExceeded { limit: usize, actual: usize },

    #[error("Invalid coordinates at row {index}: {name}")]
    CoordinateFormat { index: usize, name: String },

    #[error(
        "Coordinates out of range at row {index}: {name} \
         (latitude {latitude}, longitude {longitude})"
    )]
    CoordinateRange {
        index: usize,
        name: String,
        latitude: f64,
        longitude: f64,
    },

    #[error("Location name too long at row {index}: {length} characters (maximum {max})")]
    NameTooLong {
        index: usize,
        length: usize,
        max: usize,
    },
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("failed to persist locations: {0}")]
    Persistence(#[source] DbError),

    #[error("failed to record import attempt: {0}")]
    AuditLog(#[source] DbError),
}

impl ImportError {
    /// `true` when the uploader can fix the problem by correcting the file.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Archive(_) | Self::Validation(_))
    }

    /// Stable machine-readable error code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        if self.is_client_error() {
            "bad_request"
        } else {
            "internal_error"
        }
    }

    /// Message safe to show the uploader. Server-side failures are not
    /// described beyond a generic hint; the full text goes to the audit row.
    #[must_use]
    pub fn public_message(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            "Upload failed. Please try again later.".to_string()
        }
    }
}
