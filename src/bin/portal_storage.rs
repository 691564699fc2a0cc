//! Command-line driver for the archive core: record extraction, bitmap
//! export, and landblock map aggregation.
//!
//! This binary is illustrative of the core's contract (spec.md §6) rather
//! than part of it: argument parsing and on-screen diagnostic formatting
//! are explicitly out of the library's scope.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use portal_storage::{ArchiveDialect, BitmapDecoder, DirectoryIndex, Key, LandblockAggregator, RecordReader, RunConfig, SectorReader};

#[derive(Parser)]
#[command(
    name = "portal-storage",
    about = "Reads PORTAL.DAT/CELL.DAT archives: extract records, export bitmaps, aggregate landblock maps",
    version
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

/// Which archive dialect a host file uses. Mirrors [`ArchiveDialect`] but
/// lives here so the library stays free of a `clap` dependency.
#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliDialect {
    Portal,
    Cell,
}

impl From<CliDialect> for ArchiveDialect {
    fn from(value: CliDialect) -> Self {
        match value {
            CliDialect::Portal => ArchiveDialect::Portal,
            CliDialect::Cell => ArchiveDialect::Cell,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract a single record to a standalone file by its 32-bit key.
    Extract {
        /// Path to the host archive file.
        archive: PathBuf,
        /// Archive dialect: `portal` (1024-byte sectors) or `cell` (256-byte sectors).
        dialect: CliDialect,
        /// Record key, as bare hex (e.g. `05000001`).
        hex_key: String,
        /// Path the extracted record is written to.
        out_file: PathBuf,
    },

    /// Decode every graphic record in a PORTAL archive and emit 24-bit BMPs.
    ExportBitmaps {
        /// Path to the PORTAL-dialect archive.
        portal: PathBuf,
        /// Directory `gr%04d.bmp` files are written into.
        out_dir: PathBuf,
    },

    /// Build or update the 2041x2041 landblock height/type map.
    #[command(subcommand)]
    Map(MapCommands),
}

#[derive(Subcommand)]
enum MapCommands {
    /// Write a zero-filled map file without touching any archive.
    New {
        /// Path the zeroed map file is written to.
        mapfile: PathBuf,
    },
    /// Scan a CELL archive and overlay its landblocks onto an existing map file.
    Merge {
        /// Path to the CELL-dialect archive.
        cell: PathBuf,
        /// Existing map file to read, overlay onto, and rewrite.
        mapfile: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Extract {
            archive,
            dialect,
            hex_key,
            out_file,
        } => extract(archive, dialect.into(), &hex_key, out_file),
        Commands::ExportBitmaps { portal, out_dir } => export_bitmaps(portal, out_dir),
        Commands::Map(MapCommands::New { mapfile }) => {
            LandblockAggregator::new_map(&mapfile)?;
            Ok(())
        }
        Commands::Map(MapCommands::Merge { cell, mapfile }) => merge_map(cell, mapfile),
    }
}

fn extract(archive: PathBuf, dialect: ArchiveDialect, hex_key: &str, out_file: PathBuf) -> anyhow::Result<()> {
    let key: Key = hex_key
        .parse()
        .map_err(|_| anyhow::anyhow!("'{hex_key}' is not a valid hex key"))?;

    let config = RunConfig::new(archive, dialect, out_file);
    let mut sectors = SectorReader::open(&config.archive_path, config.dialect)?;
    let root = u64::from(sectors.read_root_pointer()?);

    let locator = DirectoryIndex::new(&mut sectors, root).locate(key)?;
    let record = RecordReader::read(&mut sectors, locator.offset, locator.length)?;

    std::fs::write(&config.output_path, &record)?;
    println!("wrote {} bytes to {}", record.len(), config.output_path.display());
    Ok(())
}

fn export_bitmaps(portal: PathBuf, out_dir: PathBuf) -> anyhow::Result<()> {
    let config = RunConfig::new(portal, ArchiveDialect::Portal, out_dir);
    let mut sectors = SectorReader::open(&config.archive_path, config.dialect)?;
    let root = u64::from(sectors.read_root_pointer()?);

    let manifest = BitmapDecoder::export_all(&mut sectors, root, &config.output_path)?;
    for entry in &manifest {
        println!("{entry}");
    }
    eprintln!("exported {} bitmaps", manifest.len());
    Ok(())
}

fn merge_map(cell: PathBuf, mapfile: PathBuf) -> anyhow::Result<()> {
    let config = RunConfig::new(cell, ArchiveDialect::Cell, mapfile);
    let mut sectors = SectorReader::open(&config.archive_path, config.dialect)?;
    let root = u64::from(sectors.read_root_pointer()?);

    let written = LandblockAggregator::merge(&mut sectors, root, &config.output_path)?;
    println!("merged {written} landblocks into {}", config.output_path.display());
    Ok(())
}
