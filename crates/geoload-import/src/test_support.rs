use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build an in-memory ZIP archive. Names ending in `/` become directories.
pub(crate) fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
    let raw: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(name, contents)| (*name, contents.as_bytes()))
        .collect();
    zip_of_bytes(&raw)
}

pub(crate) fn zip_of_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).expect("add directory");
        } else {
            writer.start_file(*name, options).expect("start file");
            writer.write_all(contents).expect("write entry");
        }
    }

    writer.finish().expect("finish archive").into_inner()
}

/// A payload with a header line followed by `rows`.
pub(crate) fn payload(rows: &[&str]) -> String {
    let mut text = String::from("Name,Latitude,Longitude\n");
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}
