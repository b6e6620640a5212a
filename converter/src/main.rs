//! survey2dwc CLI - convert survey workbooks to Darwin Core tables
//!
//! ```bash
//! survey2dwc convert Data_sample.xlsx            # write outputs/dwc_*.csv
//! survey2dwc convert survey/ -o dwca --dry-run   # CSV directory, check only
//! survey2dwc inspect Data_sample.xlsx -t CPUE    # dump a loaded table as JSON
//! survey2dwc vocabulary                          # show the measurement mapping
//! ```
//!
//! `RUST_LOG` controls log verbosity (default `info`).

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use survey2dwc::{convert, load_survey, vocabulary_description, ConvertOptions, RunSummary};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "survey2dwc")]
#[command(about = "Convert pot-survey workbooks to Darwin Core event, occurrence and MoF tables", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full conversion
    Convert {
        /// Workbook (.xlsx, .xls, .ods) or directory with Station.csv, CPUE.csv, Measurements.csv
        #[arg(default_value = "Data_sample.xlsx")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "SURVEY2DWC_OUTPUT_DIR", default_value = "outputs")]
        output_dir: PathBuf,

        /// Output file name prefix
        #[arg(long, env = "SURVEY2DWC_PREFIX", default_value = "dwc_")]
        prefix: String,

        /// Save the run summary as JSON
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Build and check without writing tables
        #[arg(long)]
        dry_run: bool,
    },

    /// Load the input and print tables as JSON
    Inspect {
        /// Workbook or CSV directory
        input: PathBuf,

        /// Only this table (Station, CPUE or Measurements)
        #[arg(short, long)]
        table: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the measurement-or-fact mapping
    Vocabulary {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output_dir,
            prefix,
            summary,
            dry_run,
        } => {
            let options = ConvertOptions {
                output_dir,
                prefix,
                dry_run,
            };
            cmd_convert(&input, &options, summary.as_deref())
        }

        Commands::Inspect {
            input,
            table,
            output,
        } => cmd_inspect(&input, table.as_deref(), output.as_deref()),

        Commands::Vocabulary { json } => cmd_vocabulary(json),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    input: &Path,
    options: &ConvertOptions,
    summary_path: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let summary = convert(input, options)?;
    print_summary(&summary);

    if let Some(path) = summary_path {
        fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        eprintln!("💾 Summary written to: {}", path.display());
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    eprintln!("\n📊 {}", summary.input.display());
    eprintln!(
        "   Input rows: Station {}, CPUE {}, Measurements {}",
        summary.rows.station, summary.rows.cpue, summary.rows.measurements
    );
    eprintln!(
        "   Events: {} ({} cruise, {} station)",
        summary.events.total, summary.events.cruises, summary.events.stations
    );
    eprintln!(
        "   Occurrences: {} ({} catch, {} measured)",
        summary.occurrences.total, summary.occurrences.catch, summary.occurrences.measurement
    );
    eprintln!("   Measurements/facts: {}", summary.measurements);

    if !summary.integrity.unknown_stations.is_empty() {
        eprintln!(
            "   ⚠️  Unknown stations: {}",
            summary.integrity.unknown_stations.join(", ")
        );
    }
    if summary.integrity.unlinked_occurrences > 0 {
        eprintln!(
            "   ⚠️  Occurrences without station: {}",
            summary.integrity.unlinked_occurrences
        );
    }

    match &summary.outputs {
        Some(paths) => {
            eprintln!("   💾 {}", paths.event.display());
            eprintln!("   💾 {}", paths.occurrence.display());
            eprintln!("   💾 {}", paths.measurement_or_fact.display());
        }
        None => eprintln!("   (dry run, nothing written)"),
    }
}

fn cmd_inspect(
    input: &Path,
    table: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let tables = load_survey(input)?;

    let json = match table {
        Some(name) => {
            let selected = tables
                .tables()
                .into_iter()
                .find(|t| t.name.eq_ignore_ascii_case(name))
                .ok_or_else(|| format!("Unknown table: {}", name))?;
            serde_json::to_string_pretty(selected)?
        }
        None => serde_json::to_string_pretty(&tables)?,
    };

    write_output(&json, output)
}

fn cmd_vocabulary(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(survey2dwc::transform::FACT_SOURCES)?);
    } else {
        println!("{}", vocabulary_description());
    }
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
