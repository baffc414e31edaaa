use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A malformed typed value. The caller reports it and falls back to a
/// default; it never aborts the run.
#[derive(Debug, Error)]
#[error("Malformed {expected} value for '{key}': '{value}'")]
pub struct ValueError {
    pub key: String,
    pub expected: &'static str,
    pub value: String,
}

/// Ordered view of a `key=value` config file.
///
/// The whole file is parsed once into an ordered entry list; repeated keys
/// keep every occurrence and are queried with [`ConfigFile::values`]. There
/// is no consumption state, so reading a key twice returns the same result.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    entries: Vec<(String, String)>,
}

impl ConfigFile {
    pub fn load(path: impl AsRef<Path>) -> Result<ConfigFile, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(ConfigFile::parse(&content))
    }

    /// Parses config text into an ordered entry list.
    ///
    /// Grammar: everything after an unescaped `#` is comment (`\#` escapes a
    /// literal `#`); the text before the first `=` is the key and must not
    /// contain whitespace, so `a` never matches a line `ab=1` or `a b=1`;
    /// lines without `=` are ignored; values are trimmed and empty entries
    /// dropped.
    pub fn parse(content: &str) -> ConfigFile {
        let entries = content.lines().filter_map(parse_line).collect();
        ConfigFile { entries }
    }

    /// All values recorded for `key`, in file order.
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// The first value recorded for `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The first value for `key` read as a boolean. Absence is not an error.
    pub fn first_bool(&self, key: &str) -> Result<Option<bool>, ValueError> {
        self.first(key)
            .map(|value| match value.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ValueError {
                    key: key.to_string(),
                    expected: "boolean",
                    value: value.to_string(),
                }),
            })
            .transpose()
    }

    /// The first value for `key` read as an integer. Absence is not an error.
    pub fn first_int(&self, key: &str) -> Result<Option<i64>, ValueError> {
        self.first(key)
            .map(|value| {
                value.parse::<i64>().map_err(|_| ValueError {
                    key: key.to_string(),
                    expected: "integer",
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

fn parse_line(line: &str) -> Option<(String, String)> {
    let uncommented = strip_comment(line);
    let (key, value) = uncommented.split_once('=')?;
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return None;
    }
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'#') => {
                out.push('#');
                chars.next();
            }
            '#' => break,
            _ => out.push(c),
        }
    }
    out
}
