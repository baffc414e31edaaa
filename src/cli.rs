use crate::parser::MalformedPolicy;
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::PathBuf;

/// A tool to filter a file of JSON log records by time range, start
/// keyword, and search keywords, as directed by a key=value config file
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the key=value run configuration file
    #[arg(short, long, default_value = "config.txt", env = "LOGSIFT_CONFIG")]
    pub config: PathBuf,

    /// Override the configured input file
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Override the configured output file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// How to handle records that fail to parse
    #[arg(long, value_enum)]
    pub on_malformed: Option<OnMalformed>,

    /// Format of the run summary
    #[arg(long, value_enum, default_value_t = SummaryFormat::Text)]
    pub format: SummaryFormat,

    /// Print resolution diagnostics to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress warnings and the run summary
    #[arg(short, long)]
    pub quiet: bool,
}

/// CLI-facing malformed-record policy
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum OnMalformed {
    /// Skip the offending record and report a count
    Skip,
    /// Fail the whole load on the first malformed record
    Abort,
}

impl From<OnMalformed> for MalformedPolicy {
    fn from(value: OnMalformed) -> Self {
        match value {
            OnMalformed::Skip => MalformedPolicy::Skip,
            OnMalformed::Abort => MalformedPolicy::Abort,
        }
    }
}

/// Output format of the run summary
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum SummaryFormat {
    Text,
    Json,
}

impl fmt::Display for SummaryFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryFormat::Text => write!(f, "text"),
            SummaryFormat::Json => write!(f, "json"),
        }
    }
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
