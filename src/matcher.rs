use crate::parser::Record;
use regex::Regex;
use thiserror::Error;

/// Errors raised while resolving raw keyword values into match specs
#[derive(Debug, Error)]
pub enum MatcherError {
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A search criterion, resolved once from its raw config value.
///
/// The config carries the criterion kind in-band: a `regex(<pattern>)`
/// wrapper selects regex matching, interior whitespace makes a phrase, and
/// anything else is a bare token. Patterns are compiled here and nowhere
/// else.
#[derive(Debug, Clone)]
pub enum MatchSpec {
    /// Bare keyword, matched by exact token equality (case-sensitive)
    Token(String),
    /// Multi-word keyword; a record matches when its token list contains
    /// every sub-word, in any order
    Phrase(Vec<String>),
    /// Unwrapped `regex(<pattern>)`, matched against the flattened search
    /// text with search semantics
    Pattern(Regex),
}

impl MatchSpec {
    pub fn resolve(raw: &str) -> Result<MatchSpec, MatcherError> {
        if let Some(pattern) = unwrap_regex(raw) {
            let regex = Regex::new(pattern).map_err(|source| MatcherError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
            return Ok(MatchSpec::Pattern(regex));
        }

        let words: Vec<&str> = raw.split_whitespace().collect();
        if words.len() > 1 {
            Ok(MatchSpec::Phrase(
                words.into_iter().map(str::to_string).collect(),
            ))
        } else {
            Ok(MatchSpec::Token(raw.to_string()))
        }
    }

    /// Whether `record` satisfies this criterion.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            MatchSpec::Token(token) => record.tokens.iter().any(|t| t == token),
            MatchSpec::Phrase(words) => words
                .iter()
                .all(|word| record.tokens.iter().any(|t| t == word)),
            MatchSpec::Pattern(regex) => regex.is_match(&record.search_text),
        }
    }
}

fn unwrap_regex(raw: &str) -> Option<&str> {
    raw.strip_prefix("regex(")?.strip_suffix(')')
}
