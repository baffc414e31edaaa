use crate::parser::Record;
use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create output file '{path}': {source}")]
    Create {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write output file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the surviving records to `path`, one newline-terminated record
/// per line, and flushes before returning. The file is created before
/// anything is serialized, so an invalid output path aborts with no
/// partial output.
pub fn write_records(
    path: &Path,
    records: &[Record],
    multi_line: bool,
) -> Result<usize, WriteError> {
    let shown = path.display().to_string();
    let file = File::create(path).map_err(|source| WriteError::Create {
        path: shown.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    for record in records {
        writeln!(writer, "{}", render(record, multi_line)).map_err(|source| WriteError::Write {
            path: shown.clone(),
            source,
        })?;
    }

    writer.flush().map_err(|source| WriteError::Write {
        path: shown,
        source,
    })?;
    Ok(records.len())
}

/// Compact passthrough of the original content by default; re-indented
/// serialization of the same object when multi-line output is requested.
fn render(record: &Record, multi_line: bool) -> String {
    if multi_line
        && let Ok(value) = serde_json::from_str::<Value>(&record.raw_content)
        && let Ok(pretty) = serde_json::to_string_pretty(&value)
    {
        return pretty;
    }
    record.raw_content.clone()
}
