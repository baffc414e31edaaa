use crate::config::ConfigFile;
use crate::matcher::MatchSpec;
use crate::parser::{MalformedPolicy, parse_timestamp};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;

/// Human-readable form of the fixed timestamp layout, used in warnings
const TIMESTAMP_SHAPE: &str = "MM-DD-YYYY hh:mm:ss";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("No input file configured; set `input_file` in the config or pass --input")]
    MissingInput,
    #[error("No output file configured; set `output_file` in the config or pass --output")]
    MissingOutput,
}

/// Inclusive time window. At least one bound is present whenever the range
/// itself is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// CLI-supplied values that take precedence over the config file
#[derive(Debug, Default)]
pub struct Overrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub malformed_records: Option<MalformedPolicy>,
}

/// Resolved run configuration, immutable after resolution.
///
/// Resolution happens exactly once at startup; every malformed or
/// inconsistent value is turned into a warning and a safe default rather
/// than an abort.
#[derive(Debug)]
pub struct Settings {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    /// Search criteria, each occurrence ORed; duplicates collapsed
    pub search_keywords: Vec<MatchSpec>,
    pub start_keyword: Option<MatchSpec>,
    pub time_range: Option<TimeRange>,
    pub multi_line_output: bool,
    pub malformed_records: MalformedPolicy,
}

impl Settings {
    /// Resolves the run configuration from the parsed config file and CLI
    /// overrides. Returns the settings together with the warnings collected
    /// along the way; only a missing input or output path is an error.
    pub fn resolve(
        config: &ConfigFile,
        overrides: Overrides,
    ) -> Result<(Settings, Vec<String>), SettingsError> {
        let mut warnings = Vec::new();

        let mut seen = HashSet::new();
        let mut search_keywords = Vec::new();
        for raw in config.values("search_keyword") {
            if !seen.insert(raw) {
                continue;
            }
            match MatchSpec::resolve(raw) {
                Ok(spec) => search_keywords.push(spec),
                Err(err) => warnings.push(format!("Ignoring search_keyword '{raw}': {err}")),
            }
        }

        let start_keyword = config.first("start_keyword").and_then(|raw| {
            MatchSpec::resolve(raw)
                .map_err(|err| warnings.push(format!("Ignoring start_keyword '{raw}': {err}")))
                .ok()
        });

        let time_range = resolve_time_range(config, &mut warnings);

        let multi_line_output = match config.first_bool("multi_line_output") {
            Ok(value) => value.unwrap_or(false),
            Err(err) => {
                warnings.push(format!("{err}; multi-line output disabled"));
                false
            }
        };

        let malformed_records = match overrides.malformed_records {
            Some(policy) => policy,
            None => resolve_malformed_policy(config, &mut warnings),
        };

        let input_file = overrides
            .input
            .or_else(|| config.first("input_file").map(PathBuf::from))
            .ok_or(SettingsError::MissingInput)?;
        let output_file = overrides
            .output
            .or_else(|| config.first("output_file").map(PathBuf::from))
            .ok_or(SettingsError::MissingOutput)?;

        let settings = Settings {
            input_file,
            output_file,
            search_keywords,
            start_keyword,
            time_range,
            multi_line_output,
            malformed_records,
        };

        if !settings.any_filter_active() {
            warnings.push(
                "No filters configured (search_keyword, start_keyword and \
                 start_time/stop_time are all absent); records will pass through unfiltered"
                    .to_string(),
            );
        }

        Ok((settings, warnings))
    }

    pub fn time_search_active(&self) -> bool {
        self.time_range.is_some()
    }

    pub fn start_keyword_active(&self) -> bool {
        self.start_keyword.is_some()
    }

    pub fn search_keyword_active(&self) -> bool {
        !self.search_keywords.is_empty()
    }

    fn any_filter_active(&self) -> bool {
        self.time_search_active() || self.start_keyword_active() || self.search_keyword_active()
    }
}

fn resolve_malformed_policy(config: &ConfigFile, warnings: &mut Vec<String>) -> MalformedPolicy {
    match config.first("malformed_records") {
        None => MalformedPolicy::Skip,
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "skip" => MalformedPolicy::Skip,
            "abort" => MalformedPolicy::Abort,
            _ => {
                warnings.push(format!(
                    "Unknown malformed_records value '{raw}' (expected 'skip' or 'abort'); \
                     defaulting to skip"
                ));
                MalformedPolicy::Skip
            }
        },
    }
}

fn resolve_time_range(config: &ConfigFile, warnings: &mut Vec<String>) -> Option<TimeRange> {
    let start = resolve_time_bound(config, "start_time", warnings);
    let end = resolve_time_bound(config, "stop_time", warnings);

    match (start, end) {
        (None, None) => None,
        (Some(start), Some(end)) if start > end => {
            warnings.push(format!(
                "start_time '{start}' is after stop_time '{end}'; time filtering disabled"
            ));
            None
        }
        (start, end) => Some(TimeRange { start, end }),
    }
}

fn resolve_time_bound(
    config: &ConfigFile,
    key: &str,
    warnings: &mut Vec<String>,
) -> Option<NaiveDateTime> {
    let raw = config.first(key)?;
    let parsed = parse_timestamp(raw);
    if parsed.is_none() {
        warnings.push(format!(
            "Unparsable {key} '{raw}' (expected {TIMESTAMP_SHAPE}); bound ignored"
        ));
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(content: &str) -> (Settings, Vec<String>) {
        let config = ConfigFile::parse(content);
        Settings::resolve(&config, Overrides::default()).unwrap()
    }

    const PATHS: &str = "input_file=in.txt\noutput_file=out.txt\n";

    #[test]
    fn test_missing_paths_are_errors() {
        let config = ConfigFile::parse("search_keyword=x\n");
        assert!(matches!(
            Settings::resolve(&config, Overrides::default()),
            Err(SettingsError::MissingInput)
        ));

        let config = ConfigFile::parse("input_file=in.txt\n");
        assert!(matches!(
            Settings::resolve(&config, Overrides::default()),
            Err(SettingsError::MissingOutput)
        ));
    }

    #[test]
    fn test_overrides_win_over_config_paths() {
        let config = ConfigFile::parse(PATHS);
        let overrides = Overrides {
            input: Some(PathBuf::from("other.txt")),
            ..Overrides::default()
        };
        let (settings, _) = Settings::resolve(&config, overrides).unwrap();
        assert_eq!(settings.input_file, PathBuf::from("other.txt"));
        assert_eq!(settings.output_file, PathBuf::from("out.txt"));
    }

    #[test]
    fn test_duplicate_search_keywords_collapse() {
        let (settings, _) = resolve(&format!(
            "{PATHS}search_keyword=foo\nsearch_keyword=foo\nsearch_keyword=bar\n"
        ));
        assert_eq!(settings.search_keywords.len(), 2);
    }

    #[test]
    fn test_invalid_search_pattern_is_dropped_with_a_warning() {
        let (settings, warnings) = resolve(&format!(
            "{PATHS}search_keyword=regex([bad)\nsearch_keyword=good\n"
        ));
        assert_eq!(settings.search_keywords.len(), 1);
        assert!(warnings.iter().any(|w| w.contains("regex([bad)")));
    }

    #[test]
    fn test_unparsable_time_bound_is_ignored_with_a_warning() {
        let (settings, warnings) = resolve(&format!(
            "{PATHS}start_time=not a time\nstop_time=01-01-2020 10:00:00\n"
        ));
        let range = settings.time_range.unwrap();
        assert_eq!(range.start, None);
        assert!(range.end.is_some());
        assert!(warnings.iter().any(|w| w.contains("start_time")));
    }

    #[test]
    fn test_inverted_range_disables_time_filtering() {
        let (settings, warnings) = resolve(&format!(
            "{PATHS}start_time=01-01-2021 00:00:00\nstop_time=01-01-2020 00:00:00\n"
        ));
        assert!(settings.time_range.is_none());
        assert!(warnings.iter().any(|w| w.contains("time filtering disabled")));
    }

    #[test]
    fn test_equal_bounds_are_a_valid_range() {
        let (settings, _) = resolve(&format!(
            "{PATHS}start_time=01-01-2020 00:00:00\nstop_time=01-01-2020 00:00:00\n"
        ));
        let range = settings.time_range.unwrap();
        assert_eq!(range.start, range.end);
        assert!(range.start.is_some());
    }

    #[test]
    fn test_malformed_boolean_defaults_with_a_warning() {
        let (settings, warnings) = resolve(&format!("{PATHS}multi_line_output=yes please\n"));
        assert!(!settings.multi_line_output);
        assert!(warnings.iter().any(|w| w.contains("multi_line_output")));
    }

    #[test]
    fn test_no_filters_configured_warns_but_resolves() {
        let (settings, warnings) = resolve(PATHS);
        assert!(!settings.any_filter_active());
        assert!(warnings.iter().any(|w| w.contains("pass through unfiltered")));
    }

    #[test]
    fn test_malformed_policy_from_config_and_override() {
        let (settings, _) = resolve(&format!("{PATHS}malformed_records=abort\n"));
        assert_eq!(settings.malformed_records, MalformedPolicy::Abort);

        let config = ConfigFile::parse(&format!("{PATHS}malformed_records=abort\n"));
        let overrides = Overrides {
            malformed_records: Some(MalformedPolicy::Skip),
            ..Overrides::default()
        };
        let (settings, _) = Settings::resolve(&config, overrides).unwrap();
        assert_eq!(settings.malformed_records, MalformedPolicy::Skip);
    }
}
