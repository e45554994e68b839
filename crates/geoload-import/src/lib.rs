//! Bulk location import: archive extraction, lenient record parsing, strict
//! batch validation, and atomic persistence with an audit trail.

pub mod archive;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod store;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_support;

pub use archive::{extract_text, ExtractedText};
pub use error::{ArchiveError, ImportError, ValidationError};
pub use parser::{parse_records, RecordParser};
pub use pipeline::{
    run_import, ImportLimits, ImportRequest, ImportStage, ImportSummary, LocationPreview,
    PREVIEW_LIMIT,
};
pub use store::{ImportLog, LocationSink, PgImportStore};
pub use validate::validate_batch;
