//! Record decoding for line-delimited JSON sources
//!
//! Each non-blank line of a source must be an independently parseable JSON
//! object. Decoding is all-or-nothing: the first malformed line fails the
//! whole file with its 1-based line number, and no partial result escapes.
//!
//! A successful decode also persists the records as a pretty-printed JSON
//! array next to the source (`movies.json` -> `movies_array.json`), which can
//! be read back to skip re-decoding on later runs.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::types::Record;

/// Suffix appended to the source file stem for the array artifact
pub const ARRAY_ARTIFACT_SUFFIX: &str = "_array";

/// Errors raised while decoding a source or its array artifact
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed JSON on line {line} of '{}': {source}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Line {line} of '{}' is not a JSON object", path.display())]
    NotAnObject { path: PathBuf, line: usize },

    #[error("'{}' does not contain a JSON array", path.display())]
    NotAnArray { path: PathBuf },

    #[error("Element {index} of '{}' is not a JSON object", path.display())]
    BadArrayElement { path: PathBuf, index: usize },
}

/// Decode every line of a line-delimited JSON source into records.
///
/// Blank lines are skipped; any other line that fails to parse as a JSON
/// object fails the whole decode. Record order matches source order.
pub fn decode_records(path: &Path) -> Result<Vec<Record>, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let value: Value =
            serde_json::from_str(trimmed).map_err(|source| DecodeError::Malformed {
                path: path.to_path_buf(),
                line: line_no,
                source,
            })?;

        match value {
            Value::Object(record) => records.push(record),
            _ => {
                return Err(DecodeError::NotAnObject {
                    path: path.to_path_buf(),
                    line: line_no,
                })
            },
        }
    }

    debug!(
        path = %path.display(),
        records = records.len(),
        "Decoded line-delimited source"
    );
    Ok(records)
}

/// Array artifact path for a source: `movies.json` -> `movies_array.json`
pub fn artifact_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}{ARRAY_ARTIFACT_SUFFIX}.json"))
}

/// Write records to `path` as a pretty-printed JSON array
pub fn write_array(path: &Path, records: &[Record]) -> Result<(), DecodeError> {
    let file = File::create(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, records).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source: source.into(),
    })?;
    writer.flush().map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Read records back from an array artifact
pub fn read_array(path: &Path) -> Result<Vec<Record>, DecodeError> {
    let file = File::open(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);

    let value: Value =
        serde_json::from_reader(reader).map_err(|source| DecodeError::Malformed {
            path: path.to_path_buf(),
            line: source.line(),
            source,
        })?;

    let Value::Array(items) = value else {
        return Err(DecodeError::NotAnArray {
            path: path.to_path_buf(),
        });
    };

    let mut records = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(record) => records.push(record),
            _ => {
                return Err(DecodeError::BadArrayElement {
                    path: path.to_path_buf(),
                    index,
                })
            },
        }
    }

    Ok(records)
}

/// Decode a source and persist its array artifact, returning both
pub fn decode_to_artifact(source: &Path) -> Result<(Vec<Record>, PathBuf), DecodeError> {
    let records = decode_records(source)?;
    let artifact = artifact_path(source);
    write_array(&artifact, &records)?;

    debug!(
        artifact = %artifact.display(),
        records = records.len(),
        "Wrote array artifact"
    );
    Ok((records, artifact))
}
