//! GenBase Import Binary
//!
//! Converts a GEDCOM file into a fully indexed database directory.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use genbase::gedcom;
use genbase::DatabaseBuilder;

/// GenBase GEDCOM importer
#[derive(Parser, Debug)]
#[command(name = "genbase-import")]
#[command(about = "Import a GEDCOM file into a genealogical database")]
#[command(version)]
struct Args {
    /// GEDCOM file to import
    gedcom: PathBuf,

    /// Output database directory
    #[arg(short, long, default_value = "./genbase_data")]
    output: PathBuf,

    /// Overwrite an existing database directory
    #[arg(short, long)]
    force: bool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,genbase=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    tracing::info!("GenBase Import v{}", genbase::VERSION);
    tracing::info!("GEDCOM file: {}", args.gedcom.display());
    tracing::info!("Output directory: {}", args.output.display());

    if args.output.join("base").exists() && !args.force {
        tracing::error!(
            "{} already holds a database (use --force to overwrite)",
            args.output.display()
        );
        std::process::exit(1);
    }

    let data = match gedcom::import_file(&args.gedcom) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("Import failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = DatabaseBuilder::write(&args.output, &data) {
        tracing::error!("Failed to write database: {}", e);
        std::process::exit(1);
    }

    println!(
        "Imported {} persons, {} families into {}",
        data.persons.len(),
        data.families.len(),
        args.output.display()
    );
}
