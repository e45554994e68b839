//! Lenient line-oriented parsing of the comma-separated payload.
//!
//! The first line is a header and is always discarded. Blank lines are
//! ignored. Lines with fewer than three fields, or an empty name, are dropped
//! and counted; they never abort parsing.

use std::iter::Skip;
use std::str::Lines;

use geoload_core::CandidateRecord;

/// Lazy iterator over the candidate records of a payload.
///
/// Finite and single-pass. After it has been drained, [`RecordParser::skipped`]
/// reports how many non-blank lines were dropped as malformed.
#[derive(Debug, Clone)]
pub struct RecordParser<'a> {
    lines: Skip<Lines<'a>>,
    skipped: usize,
}

/// Start parsing `text`. Handles both `\n` and `\r\n` line endings.
#[must_use]
pub fn parse_records(text: &str) -> RecordParser<'_> {
    RecordParser {
        lines: text.lines().skip(1),
        skipped: 0,
    }
}

impl RecordParser<'_> {
    /// Malformed lines dropped so far.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl Iterator for RecordParser<'_> {
    type Item = CandidateRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?.trim();
            if line.is_empty() {
                continue;
            }

            let mut fields = line.split(',');
            let (Some(name), Some(latitude), Some(longitude)) =
                (fields.next(), fields.next(), fields.next())
            else {
                self.skipped += 1;
                continue;
            };

            let name = name.trim();
            if name.is_empty() {
                self.skipped += 1;
                continue;
            }

            return Some(CandidateRecord {
                name: name.to_string(),
                raw_latitude: latitude.trim().to_string(),
                raw_longitude: longitude.trim().to_string(),
            });
        }
    }
}
