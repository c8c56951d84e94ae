use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use ltr_cohort::{CohortAnalysis, CsvRows, StudyConfig, open_row_source};

#[global_allocator]
static ALLOC: snmalloc_rs::SnMalloc = snmalloc_rs::SnMalloc;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Plain-text tables
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser)]
#[command(name = "ltr-cohort")]
#[command(about = "Readmission analysis for liver-transplant registry extracts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the readmission analysis
    Analyze {
        /// Primary transplant encounters (.parquet or .csv)
        #[arg(long)]
        primary: PathBuf,
        /// Follow-up encounters (.parquet or .csv)
        #[arg(long)]
        follow_up: PathBuf,
        /// Study configuration (JSON); defaults apply to missing keys
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Write the report to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Convert a CSV extract to Parquet
    Convert {
        /// CSV extract with a header line
        input: PathBuf,
        /// Parquet file to write
        output: PathBuf,
        /// Field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
}

fn analyze(
    primary: &Path,
    follow_up: &Path,
    config: Option<&Path>,
    format: Format,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => StudyConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => StudyConfig::default(),
    };

    let primary_source = open_row_source(primary)
        .with_context(|| format!("Cannot read primary encounters {}", primary.display()))?;
    let follow_up_source = open_row_source(follow_up)
        .with_context(|| format!("Cannot read follow-up encounters {}", follow_up.display()))?;

    let outcome = CohortAnalysis::new(config)
        .run(primary_source.as_ref(), follow_up_source.as_ref())
        .context("Readmission analysis failed")?;
    info!("\n{outcome}");

    match (format, output) {
        (Format::Json, Some(path)) => outcome
            .report
            .save_to_json(path)
            .with_context(|| format!("Failed to write report {}", path.display()))?,
        (Format::Text, Some(path)) => {
            std::fs::write(path, outcome.report.to_string())
                .with_context(|| format!("Failed to write report {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        (Format::Json, None) => {
            let json = outcome.report.to_json().context("Failed to serialize report")?;
            println!("{json}");
        }
        (Format::Text, None) => println!("{}", outcome.report),
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze {
            primary,
            follow_up,
            config,
            format,
            output,
        } => analyze(primary, follow_up, config.as_deref(), *format, output.as_deref()),
        Commands::Convert {
            input,
            output,
            delimiter,
        } => {
            let delimiter = u8::try_from(*delimiter)
                .context("Delimiter must be a single-byte character")?;
            let rows = CsvRows::new(input)
                .with_delimiter(delimiter)
                .write_parquet(output)
                .with_context(|| format!("Failed to convert {}", input.display()))?;
            info!("Converted {rows} rows to {}", output.display());
            Ok(())
        }
    }
}
