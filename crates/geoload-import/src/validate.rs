//! Strict, whole-batch validation of parsed candidates.

use geoload_core::{
    CandidateRecord, ValidatedLocation, LATITUDE_RANGE, LONGITUDE_RANGE, MAX_NAME_LEN,
};

use crate::error::ValidationError;

/// Convert candidates into validated locations, failing the entire batch on
/// the first bad record.
///
/// Row indexes in errors are 1-based positions among the candidates, not
/// source line numbers.
///
/// # Errors
///
/// - [`ValidationError::NoValidRecords`] for an empty batch
/// - [`ValidationError::BatchSizeExceeded`] when there are more than
///   `max_batch_size` candidates; no record is examined in that case
/// - [`ValidationError::CoordinateFormat`], [`ValidationError::CoordinateRange`]
///   or [`ValidationError::NameTooLong`] for the first offending record
pub fn validate_batch<I>(
    candidates: I,
    max_batch_size: usize,
) -> Result<Vec<ValidatedLocation>, ValidationError>
where
    I: IntoIterator<Item = CandidateRecord>,
{
    let candidates: Vec<CandidateRecord> = candidates.into_iter().collect();

    if candidates.is_empty() {
        return Err(ValidationError::NoValidRecords);
    }

    if candidates.len() > max_batch_size {
        return Err(ValidationError::BatchSizeExceeded {
            limit: max_batch_size,
            actual: candidates.len(),
        });
    }

    candidates
        .into_iter()
        .enumerate()
        .map(|(i, candidate)| validate_record(i + 1, candidate))
        .collect()
}

fn validate_record(
    index: usize,
    candidate: CandidateRecord,
) -> Result<ValidatedLocation, ValidationError> {
    let (Some(latitude), Some(longitude)) = (
        parse_coordinate(&candidate.raw_latitude),
        parse_coordinate(&candidate.raw_longitude),
    ) else {
        return Err(ValidationError::CoordinateFormat {
            index,
            name: candidate.name,
        });
    };

    if !LATITUDE_RANGE.contains(&latitude) || !LONGITUDE_RANGE.contains(&longitude) {
        return Err(ValidationError::CoordinateRange {
            index,
            name: candidate.name,
            latitude,
            longitude,
        });
    }

    let length = candidate.name.chars().count();
    if length > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong {
            index,
            length,
            max: MAX_NAME_LEN,
        });
    }

    Ok(ValidatedLocation {
        name: candidate.name,
        latitude,
        longitude,
    })
}

/// Parse a decimal coordinate. `NaN` and infinities are rejected.
fn parse_coordinate(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
