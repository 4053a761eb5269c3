//! CLI entry point for the survey report tool.
//!
//! Provides subcommands for building the full report, tallying a single field,
//! joining county answers against coordinates, counting condition overlaps, and
//! listing the columns of an export.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use survey_report::analyzers::aggregate::IMPACT_FIELD;
use survey_report::analyzers::analyzer::{
    ReportSources, analyze, load_config, load_counties, load_table,
};
use survey_report::analyzers::geo::geographic_join;
use survey_report::analyzers::overlap::{ConditionIndex, condition_tally, merge_conditions};
use survey_report::analyzers::tally::{TallyOptions, categorical_tally};
use survey_report::output::{STDOUT, write_json, write_tally_csv};
use survey_report::survey::fields;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "survey_report")]
#[command(about = "Aggregate survey exports into chart-ready count tables", long_about = None)]
struct Cli {
    /// Field delimiter of the survey export
    #[arg(short, long, global = true, default_value_t = ',')]
    delimiter: char,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full report: tallies, county map, overlaps and bubble series
    Report {
        /// Survey export (CSV, optionally .gz)
        #[arg(short, long, env = "SURVEY_INPUT")]
        input: PathBuf,

        /// Report layout JSON; the built-in arts-survey layout when omitted
        #[arg(short, long, env = "SURVEY_REPORT_CONFIG")]
        config: Option<PathBuf>,

        /// County coordinate table (CSV or JSON); New York counties when omitted
        #[arg(long, env = "SURVEY_COUNTY_GEO")]
        counties: Option<PathBuf>,

        /// Output path, or "stdout"
        #[arg(short, long, default_value = STDOUT)]
        output: String,

        /// Gzip compress the output file
        #[arg(long, default_value_t = false)]
        gzip: bool,
    },
    /// Count the answers to a single field
    Tally {
        #[arg(short, long, env = "SURVEY_INPUT")]
        input: PathBuf,

        /// Column to tally
        #[arg(short, long)]
        field: String,

        /// Also compute each answer's share of the total
        #[arg(short, long, default_value_t = false)]
        percent: bool,

        /// Count missing answers under "Missing"
        #[arg(long, default_value_t = false)]
        include_missing: bool,

        /// Write the table as CSV to this path (or "stdout") instead of JSON to stdout
        #[arg(long)]
        csv: Option<String>,
    },
    /// Join county answers against county coordinates
    Map {
        #[arg(short, long, env = "SURVEY_INPUT")]
        input: PathBuf,

        #[arg(short, long, default_value = fields::COUNTY)]
        field: String,

        #[arg(long, env = "SURVEY_COUNTY_GEO")]
        counties: Option<PathBuf>,

        /// Suffix removed from county answers before matching
        #[arg(long, default_value = " County")]
        strip_suffix: String,
    },
    /// Count three-way overlaps of the configured condition groupings
    Overlap {
        #[arg(short, long, env = "SURVEY_INPUT")]
        input: PathBuf,

        #[arg(short, long, env = "SURVEY_REPORT_CONFIG")]
        config: Option<PathBuf>,
    },
    /// List the columns of an export with their non-missing counts
    Columns {
        #[arg(short, long, env = "SURVEY_INPUT")]
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/survey_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("survey_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let delimiter = delimiter_byte(cli.delimiter)?;

    match cli.command {
        Commands::Report {
            input,
            config,
            counties,
            output,
            gzip,
        } => {
            let sources = ReportSources {
                input: &input,
                config: config.as_deref(),
                counties: counties.as_deref(),
                delimiter,
            };
            run_report(sources, &output, gzip)?;
        }
        Commands::Tally {
            input,
            field,
            percent,
            include_missing,
            csv,
        } => {
            run_tally(&input, delimiter, &field, percent, include_missing, csv)?;
        }
        Commands::Map {
            input,
            field,
            counties,
            strip_suffix,
        } => {
            let table = load_table(&input, delimiter)?;
            let geo = load_counties(counties.as_deref())?;
            let options = TallyOptions {
                strip_suffix: Some(strip_suffix).filter(|s| !s.is_empty()),
                ..Default::default()
            };
            let counts = categorical_tally(&table, &field, &options)?;
            let join = geographic_join(&counts, &geo);
            info!(
                mapped = join.points.len(),
                unmatched = join.unmatched.len(),
                "County map built"
            );
            write_json(STDOUT, &join, false)?;
        }
        Commands::Overlap { input, config } => {
            run_overlap(&input, delimiter, config.as_deref())?;
        }
        Commands::Columns { input } => {
            let table = load_table(&input, delimiter)?;
            for header in table.headers() {
                let answered = table.non_missing(header)?;
                println!("{}\t{}", header, answered);
            }
        }
    }

    Ok(())
}

fn delimiter_byte(delimiter: char) -> Result<u8> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("Delimiter {:?} is not a single ASCII character", delimiter))
}

/// Builds the full report and writes it as JSON.
#[tracing::instrument(skip(sources), fields(input = %sources.input.display()))]
fn run_report(sources: ReportSources<'_>, output: &str, gzip: bool) -> Result<()> {
    let report = analyze(sources)?;
    for warning in &report.warnings {
        warn!(warning = %warning, "Report warning");
    }
    write_json(output, &report, gzip)
}

/// Tallies one field, printing JSON or writing a CSV table.
#[tracing::instrument(skip(input, delimiter, csv), fields(input = %input.display()))]
fn run_tally(
    input: &Path,
    delimiter: u8,
    field: &str,
    percent: bool,
    include_missing: bool,
    csv: Option<String>,
) -> Result<()> {
    let table = load_table(input, delimiter)?;
    let options = TallyOptions {
        include_missing,
        ..Default::default()
    };
    let counts = categorical_tally(&table, field, &options)?;
    let percentages = if percent {
        Some(
            counts
                .percentages()
                .with_context(|| format!("Cannot compute percentages for {}", field))?,
        )
    } else {
        None
    };

    match csv {
        Some(dest) => write_tally_csv(&dest, &counts, percentages.as_ref()),
        None => match &percentages {
            Some(p) => write_json(STDOUT, p, false),
            None => write_json(STDOUT, &counts, false),
        },
    }
}

/// Counts the configured condition groupings and prints them as JSON.
#[tracing::instrument(skip(input, delimiter, config), fields(input = %input.display()))]
fn run_overlap(input: &Path, delimiter: u8, config: Option<&Path>) -> Result<()> {
    let table = load_table(input, delimiter)?;
    let config = load_config(config)?;
    let conditions_config = config
        .conditions
        .context("Report config has no condition section")?;

    let conditions = merge_conditions(&table, &conditions_config.columns)?;
    let index = ConditionIndex::build(&conditions, &conditions_config.tracked_names())?;
    let overlaps: Vec<_> = conditions_config
        .groupings
        .iter()
        .map(|g| index.overlap(g.sets()))
        .collect();

    info!(
        respondents = index.respondents(),
        groupings = overlaps.len(),
        "Overlaps counted"
    );
    write_json(
        STDOUT,
        &serde_json::json!({
            "impacts": condition_tally(IMPACT_FIELD, &conditions),
            "overlaps": overlaps,
        }),
        false,
    )
}
