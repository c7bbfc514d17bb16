//! OAS Hoist CLI
//!
//! Command-line interface for hoisting inline OpenAPI schemas and checking
//! document equivalence.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use oas_hoist::{
    find_divergence, hoist, hoist_to_file, load_document_auto, HoistOptions, HoistReport,
    OutputFormat,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "oas-hoist")]
#[command(about = "Hoist inline OpenAPI schemas into named components")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract inline schemas and emit the verified document
    Hoist {
        /// Document source: file path or URL (http:// or https://)
        source: String,

        /// Output file (stdout if not specified); only written if verification passes
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Location of the definitions table
        #[arg(long, default_value = "components/schemas")]
        definitions: String,

        /// Output format: yaml (default) or json
        #[arg(long, default_value = "yaml")]
        format: String,

        /// Print the extraction report as JSON on stderr
        #[arg(long)]
        json_report: bool,
    },

    /// Check that a transformed document is equivalent to its original
    Check {
        /// Original document
        original: String,

        /// Transformed document
        transformed: String,

        /// Location of the definitions table
        #[arg(long, default_value = "components/schemas")]
        definitions: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Hoist {
            source,
            output,
            definitions,
            format,
            json_report,
        } => run_hoist(&source, output, &definitions, &format, json_report),

        Commands::Check {
            original,
            transformed,
            definitions,
        } => run_check(&original, &transformed, &definitions),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_hoist(
    source: &str,
    output: Option<PathBuf>,
    definitions: &str,
    format: &str,
    json_report: bool,
) -> Result<(), u8> {
    let format = OutputFormat::parse(format).ok_or_else(|| {
        eprintln!("Error: unknown format \"{}\": expected yaml or json", format);
        2u8
    })?;
    let options = HoistOptions::new()
        .definitions_path(definitions)
        .format(format);

    let text = load_document_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let report = match output {
        Some(path) => {
            let report = hoist_to_file(&text, &path, &options).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            info!(path = %path.display(), "wrote transformed document");
            report
        }
        None => {
            let hoisted = hoist(&text, &options).map_err(|e| {
                eprintln!("Error: {}", e);
                e.exit_code() as u8
            })?;
            print!("{}", hoisted.document);
            hoisted.report
        }
    };

    print_report(&report, json_report)
}

fn print_report(report: &HoistReport, json: bool) -> Result<(), u8> {
    if json {
        let rendered = serde_json::to_string(report).map_err(|e| {
            eprintln!("Error serializing report: {}", e);
            2u8
        })?;
        eprintln!("{}", rendered);
    } else {
        eprintln!("Extracted {} definition(s)", report.count());
        for name in &report.extracted {
            eprintln!("  {}", name);
        }
    }
    Ok(())
}

fn run_check(original: &str, transformed: &str, definitions: &str) -> Result<(), u8> {
    let options = HoistOptions::new().definitions_path(definitions);

    let load = |source: &str| {
        load_document_auto(source).map_err(|e| {
            eprintln!("Error: {}", e);
            e.exit_code() as u8
        })
    };
    let original = load(original)?;
    let transformed = load(transformed)?;

    match find_divergence(&original, &transformed, &options) {
        Ok(None) => {
            println!("Equivalent");
            Ok(())
        }
        Ok(Some(divergence)) => {
            eprintln!("Not equivalent: {}", divergence);
            Err(1)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            Err(e.exit_code() as u8)
        }
    }
}
