mod check;
mod codes;
mod export;
mod identify;
mod info;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fw_ir::{Brand, FirmwareDatabase};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "fwprint",
    about = "Identify vehicle platforms from ECU firmware versions",
    version
)]
struct Cli {
    /// Log match decisions and database loading
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve observation files to platforms
    Identify {
        /// Observation files (.yml)
        #[arg(required = true)]
        observed: Vec<PathBuf>,

        /// Firmware database files, merged in order
        #[arg(long = "db", required = true)]
        db: Vec<PathBuf>,

        /// Brand to match against, overriding the observation file
        #[arg(long)]
        brand: Option<Brand>,

        /// Skip the exact firmware comparison
        #[arg(long)]
        no_exact: bool,

        /// Skip the platform-code fallback
        #[arg(long)]
        no_fuzzy: bool,
    },

    /// Validate database files (schema and consistency checks)
    Check {
        /// Firmware database files, merged in order
        #[arg(long = "db", required = true)]
        db: Vec<PathBuf>,

        /// Suppress output, only set exit code
        #[arg(short, long)]
        quiet: bool,

        /// Print issue counts only
        #[arg(long)]
        summary: bool,
    },

    /// Show database statistics
    Info {
        /// Firmware database files, merged in order
        #[arg(long = "db", required = true)]
        db: Vec<PathBuf>,
    },

    /// Print the platform codes extracted from firmware strings
    Codes {
        /// Brand whose extractor to use
        #[arg(long)]
        brand: Brand,

        /// Firmware strings, with \xNN escapes for non-printable bytes
        #[arg(required = true)]
        firmware: Vec<String>,
    },

    /// Merge database files and write them back as YAML
    Export {
        /// Firmware database files, merged in order
        #[arg(long = "db", required = true)]
        db: Vec<PathBuf>,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Read, parse and merge database files.
pub fn load_database(paths: &[PathBuf]) -> Result<FirmwareDatabase> {
    let mut parts = Vec::with_capacity(paths.len());
    for path in paths {
        let text = read_text(path)?;
        let db = fw_yaml::parse_database_yaml(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        log::debug!("{}: {} platforms", path.display(), db.len());
        parts.push(db);
    }
    fw_yaml::merge_databases(parts).context("merging databases")
}

pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match cli.command {
        Command::Identify {
            observed,
            db,
            brand,
            no_exact,
            no_fuzzy,
        } => identify::run_identify(&observed, &db, brand, !no_exact, !no_fuzzy),

        Command::Check { db, quiet, summary } => check::run_check(&db, quiet, summary),

        Command::Info { db } => info::run_info(&db),

        Command::Codes { brand, firmware } => codes::run_codes(brand, &firmware),

        Command::Export { db, output } => export::run_export(&db, &output),
    }
}
