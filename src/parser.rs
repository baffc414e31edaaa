use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

mod entities;

pub use entities::{Record, TIMESTAMP_FORMAT, parse_timestamp};

/// How records that fail to parse are handled during ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MalformedPolicy {
    /// Skip the offending record, count it, and keep loading
    #[default]
    Skip,
    /// Fail the load on the first malformed record
    Abort,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Failed to read input file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed record at byte offset {offset}: {source}")]
    Malformed {
        offset: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Record at byte offset {offset} is not a JSON object")]
    NotAnObject { offset: usize },
}

/// Result of ingesting an input stream
#[derive(Debug, Default)]
pub struct Ingested {
    /// Records in input order
    pub records: Vec<Record>,
    /// Values dropped under [`MalformedPolicy::Skip`]: parse failures and
    /// top-level values without the JSON-object shape
    pub skipped: usize,
}

/// Reads and tokenizes every JSON record in the input file.
pub fn ingest_file(
    path: impl AsRef<Path>,
    policy: MalformedPolicy,
) -> Result<Ingested, IngestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    ingest_str(&content, policy)
}

/// Parses a stream of top-level JSON values. Values may be separated by
/// newlines, other whitespace, or nothing at all.
pub fn ingest_str(content: &str, policy: MalformedPolicy) -> Result<Ingested, IngestError> {
    let mut ingested = Ingested::default();
    let mut pos = 0;

    while pos < content.len() {
        let rest = &content[pos..];
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            break;
        }
        let value_start = rest.len() - trimmed.len();

        let mut stream = serde_json::Deserializer::from_str(rest).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => {
                if value.is_object() {
                    ingested.records.push(Record::from_value(&value));
                } else {
                    match policy {
                        MalformedPolicy::Skip => ingested.skipped += 1,
                        MalformedPolicy::Abort => {
                            return Err(IngestError::NotAnObject {
                                offset: pos + value_start,
                            });
                        }
                    }
                }
                pos += stream.byte_offset();
            }
            Some(Err(source)) => match policy {
                MalformedPolicy::Abort => {
                    return Err(IngestError::Malformed {
                        offset: pos + value_start,
                        source,
                    });
                }
                MalformedPolicy::Skip => {
                    ingested.skipped += 1;
                    // The stream deserializer cannot resume after an error;
                    // re-sync at the next object start.
                    let resume = value_start + trimmed.chars().next().map_or(1, char::len_utf8);
                    match rest[resume..].find('{') {
                        Some(next) => pos += resume + next,
                        None => break,
                    }
                }
            },
            None => break,
        }
    }

    Ok(ingested)
}
