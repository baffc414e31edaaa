pub mod cli;
pub mod config;
pub mod engine;
pub mod matcher;
pub mod parser;
pub mod report;
pub mod settings;
pub mod writer;

pub use cli::{Cli, OnMalformed, SummaryFormat, cli_parse};
pub use config::{ConfigError, ConfigFile};
pub use engine::{FilterEngine, StageCounts};
pub use matcher::{MatchSpec, MatcherError};
pub use parser::{
    IngestError, Ingested, MalformedPolicy, Record, TIMESTAMP_FORMAT, ingest_file, ingest_str,
    parse_timestamp,
};
pub use report::{RunReport, format_report_json, format_report_text};
pub use settings::{Overrides, Settings, SettingsError, TimeRange};
pub use writer::{WriteError, write_records};

use anyhow::Context;
use colored::Colorize;
use std::time::Instant;

fn report_warning(quiet: bool, message: &str) {
    if !quiet {
        eprintln!("{} {message}", "Warning:".yellow().bold());
    }
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    let started = Instant::now();

    let config = ConfigFile::load(&cli.config)
        .with_context(|| format!("Failed to load config '{}'", cli.config.display()))?;

    let overrides = Overrides {
        input: cli.input.clone(),
        output: cli.output.clone(),
        malformed_records: cli.on_malformed.map(Into::into),
    };
    let (settings, warnings) = Settings::resolve(&config, overrides)?;
    for warning in &warnings {
        report_warning(cli.quiet, warning);
    }

    if cli.verbose > 0 && !cli.quiet {
        eprintln!("Config file: {}", cli.config.display());
        eprintln!("Input file: {}", settings.input_file.display());
        eprintln!("Output file: {}", settings.output_file.display());
        eprintln!(
            "Active filters: time range={}, start keyword={}, search keywords={}",
            settings.time_search_active(),
            settings.start_keyword_active(),
            settings.search_keywords.len()
        );
    }

    // A missing or unreadable input is reported, not fatal: the run
    // continues on an empty record set and still produces the output file.
    let Ingested { records, skipped } =
        match ingest_file(&settings.input_file, settings.malformed_records) {
            Ok(ingested) => ingested,
            Err(err @ IngestError::Read { .. }) => {
                report_warning(cli.quiet, &format!("{err}; continuing with no records"));
                Ingested::default()
            }
            Err(err) => return Err(err).context("Failed to load input records"),
        };
    if skipped > 0 {
        report_warning(
            cli.quiet,
            &format!("Skipped {skipped} malformed record(s) while loading"),
        );
    }

    let mut engine = FilterEngine::new();
    engine.ingest(records);
    let ingested = engine.len();
    let stages = engine.apply(&settings);
    let survivors = engine.into_records();

    let written = write_records(
        &settings.output_file,
        &survivors,
        settings.multi_line_output,
    )?;

    let report = RunReport {
        ingested,
        skipped_malformed: skipped,
        stages,
        written,
        elapsed_seconds: started.elapsed().as_secs_f64(),
    };
    if !cli.quiet {
        match cli.format {
            SummaryFormat::Text => print!("{}", format_report_text(&report)),
            SummaryFormat::Json => println!("{}", format_report_json(&report)),
        }
    }

    Ok(())
}
