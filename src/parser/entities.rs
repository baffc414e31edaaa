use chrono::NaiveDateTime;
use serde_json::Value;

/// Fixed layout of the `timeStamp` field and the config time bounds.
/// Hours are read on the 24-hour clock; the upstream format carries no
/// AM/PM marker.
pub const TIMESTAMP_FORMAT: &str = "%m-%d-%Y %H:%M:%S";

/// Leading tokens of the flattened text that belong to the record structure
/// rather than the body: the `timeStamp` key and its four parts, the
/// `delayMillis` key and value, and the key preceding the body.
const STRUCTURAL_TOKEN_COUNT: usize = 8;

/// One ingested JSON log record with its derived search fields.
///
/// All derived fields are pure functions of the parsed value and never
/// change after construction.
#[derive(Debug, Clone)]
pub struct Record {
    /// Compact JSON text of the record, emitted verbatim on output
    pub raw_content: String,
    /// Flattened single-line form with JSON punctuation replaced by spaces,
    /// used for regex matching
    pub search_text: String,
    /// Body tokens used for exact-keyword and phrase matching
    pub tokens: Vec<String>,
    /// Parsed `timeStamp` field; `None` when missing, non-string, or
    /// unparsable
    pub timestamp: Option<NaiveDateTime>,
}

impl Record {
    /// Builds a record from one parsed top-level JSON object.
    pub fn from_value(value: &Value) -> Record {
        let raw_content = value.to_string();
        let search_text = flatten(&raw_content);
        let tokens = body_tokens(&search_text);
        let timestamp = value
            .get("timeStamp")
            .and_then(Value::as_str)
            .and_then(parse_timestamp);

        Record {
            raw_content,
            search_text,
            tokens,
            timestamp,
        }
    }
}

/// Parses a raw timestamp under the fixed `MM-DD-YYYY hh:mm:ss` layout.
/// Any failure, including out-of-range components, yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).ok()
}

/// Replaces JSON punctuation with spaces and collapses runs of whitespace
/// into single spaces, producing one flat line.
fn flatten(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| match c {
            '{' | '}' | '"' | ',' | ':' => ' ',
            other => other,
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits the flattened text into body tokens: the structural prefix is
/// dropped positionally, then any token spelled `body` is dropped as well.
/// Records with fewer tokens than the prefix simply end up with none.
fn body_tokens(search_text: &str) -> Vec<String> {
    search_text
        .split_whitespace()
        .skip(STRUCTURAL_TOKEN_COUNT)
        .filter(|token| !token.eq_ignore_ascii_case("body"))
        .map(str::to_string)
        .collect()
}
