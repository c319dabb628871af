//! # osm-osw CLI
//!
//! Command-line interface for the osm-osw-reformatter library.
//! Converts OpenStreetMap extracts to OpenSidewalks GeoJSON and back.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::LevelFilter;
use osm_osw_reformatter::{ConvertOptions, Formatter, Response};

mod cli;

/// Command-line interface for osm-osw
#[derive(Parser)]
#[command(name = "osm-osw")]
#[command(version)]
#[command(about = "Converts OpenStreetMap extracts to OpenSidewalks GeoJSON and back")]
#[command(long_about = "Converts between OpenStreetMap and OpenSidewalks (OSW):
  osm-osw osm2osw wa.osm.pbf --workdir out     # OSM extract to OSW GeoJSON collections
  osm-osw osw2osm wa.zip --workdir out         # OSW archive to OSM XML

The result is printed to stdout as JSON: {status, generated_files, error}.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an .osm.pbf or .osm extract to OSW GeoJSON collections
    Osm2osw {
        /// Input OSM extract
        input: PathBuf,
        /// Working directory for the generated files
        #[arg(short, long, default_value = ".")]
        workdir: PathBuf,
        /// Prefix of the generated file names (defaults to the input name)
        #[arg(long)]
        prefix: Option<String>,
        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
        /// Do not show progress bars
        #[arg(long)]
        no_progress: bool,
    },
    /// Convert an OSW zip archive to an OSM XML document
    Osw2osm {
        /// Input OSW archive
        archive: PathBuf,
        /// Working directory for the generated file
        #[arg(short, long, default_value = ".")]
        workdir: PathBuf,
        /// Prefix of the generated file name (defaults to the archive name)
        #[arg(long)]
        prefix: Option<String>,
        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let response = match cli.command {
        Commands::Osm2osw {
            input,
            workdir,
            prefix,
            verbose,
            no_progress,
        } => {
            init_logging(verbose);
            let progress = (!no_progress).then(|| Arc::new(cli::ProgressManager::new()));
            let options = ConvertOptions {
                progress: progress.as_ref().map(|manager| manager.callback()),
                prefix,
            };

            let mut formatter = Formatter::new(&workdir, &input)?.with_options(options);
            let response = formatter.osm2osw()?;
            if let Some(manager) = progress {
                manager.finish();
            }
            response
        }
        Commands::Osw2osm {
            archive,
            workdir,
            prefix,
            verbose,
        } => {
            init_logging(verbose);
            let options = ConvertOptions {
                prefix,
                ..Default::default()
            };
            Formatter::new(&workdir, &archive)?.with_options(options).osw2osm()?
        }
    };

    report(&response)
}

/// Prints the response as JSON and exits with 1 when the conversion failed
fn report(response: &Response) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(response)?);
    if !response.status {
        std::process::exit(1);
    }
    Ok(())
}
