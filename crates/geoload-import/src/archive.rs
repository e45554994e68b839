//! Locating and decoding the single text payload inside an uploaded ZIP.

use std::io::{Cursor, Read};

use zip::result::ZipError;
use zip::ZipArchive;

use crate::error::ArchiveError;

/// Extension (compared case-insensitively) of the one member we import.
pub const TEXT_EXTENSION: &str = ".txt";

/// Resource-fork directory added by macOS archivers.
const METADATA_DIR: &str = "__MACOSX";

/// Upper bound on the decompressed size of the text member.
pub const MAX_PAYLOAD_BYTES: u64 = 32 * 1024 * 1024;

/// The decoded text member and the archive path it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub entry_name: String,
    pub text: String,
}

/// Validate the archive and return its single qualifying text member.
///
/// Directories and OS junk (anything under `__MACOSX/`, `.DS_Store`,
/// AppleDouble `._*` files) are ignored. Of what remains exactly one entry
/// must end in `.txt`.
///
/// # Errors
///
/// - [`ArchiveError::TooLarge`] if `bytes` exceeds `max_upload_bytes`
/// - [`ArchiveError::Corrupt`] if the container cannot be read
/// - [`ArchiveError::NoTextFile`] / [`ArchiveError::MultipleTextFiles`] if
///   the number of qualifying entries is not exactly one
/// - [`ArchiveError::PayloadTooLarge`] / [`ArchiveError::NotUtf8`] if the
///   selected entry cannot be decoded
pub fn extract_text(bytes: &[u8], max_upload_bytes: usize) -> Result<ExtractedText, ArchiveError> {
    if bytes.len() > max_upload_bytes {
        return Err(ArchiveError::TooLarge {
            limit: max_upload_bytes,
            actual: bytes.len(),
        });
    }

    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(ArchiveError::Corrupt)?;

    let mut matches: Vec<(usize, String)> = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(ArchiveError::Corrupt)?;
        if entry.is_dir() || is_junk(entry.name()) {
            continue;
        }
        if entry.name().to_lowercase().ends_with(TEXT_EXTENSION) {
            matches.push((index, entry.name().to_string()));
        }
    }

    let (index, entry_name) = match matches.len() {
        0 => return Err(ArchiveError::NoTextFile),
        1 => matches.swap_remove(0),
        _ => {
            return Err(ArchiveError::MultipleTextFiles {
                names: matches.into_iter().map(|(_, name)| name).collect(),
            })
        }
    };

    let entry = archive.by_index(index).map_err(ArchiveError::Corrupt)?;
    let mut buf = Vec::new();
    entry
        .take(MAX_PAYLOAD_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ArchiveError::Corrupt(ZipError::Io(e)))?;

    if buf.len() as u64 > MAX_PAYLOAD_BYTES {
        return Err(ArchiveError::PayloadTooLarge {
            name: entry_name,
            limit: MAX_PAYLOAD_BYTES,
        });
    }

    let text = String::from_utf8(buf).map_err(|_| ArchiveError::NotUtf8 {
        name: entry_name.clone(),
    })?;

    Ok(ExtractedText { entry_name, text })
}

/// `true` for entries written by the OS rather than the user.
fn is_junk(name: &str) -> bool {
    let mut components = name.split('/').filter(|c| !c.is_empty()).peekable();
    while let Some(component) = components.next() {
        let is_last = components.peek().is_none();
        if !is_last && component == METADATA_DIR {
            return true;
        }
        if is_last && (component == ".DS_Store" || component.starts_with("._")) {
            return true;
        }
    }
    false
}
