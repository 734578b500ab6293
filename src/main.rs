//! Ghostsift - recover text hidden in image pixels
//!
//! Command-line front end: full analysis plus each stage on its own.

mod commands;

use std::io::Write;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;

use commands::{
    AnalyzeCommand, AssembleCommand, CommandExecutor, DecodeCommand, ExtractCommand,
    MetadataCommand, SpiralCommand,
};

/// Ghostsift - recover text hidden in image pixels
///
/// Reads LSB planes in raster and spiral order, decodes base64/ROT-13
/// layers, assembles fragments and tries XOR or AES-CBC decryption.
#[derive(Parser)]
#[command(name = "ghostsift")]
#[command(version)]
#[command(about = "Recover text hidden in the least significant bits of images")]
#[command(long_about = None)]
struct Cli {
    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the complete analysis on an image
    Analyze(AnalyzeCommand),

    /// Extract raster LSB data from image channels
    Extract(ExtractCommand),

    /// Read LSB data along a spiral from the image center
    Spiral(SpiralCommand),

    /// Decode base64 / ROT-13 data
    Decode(DecodeCommand),

    /// Assemble fragments and decrypt the result
    Assemble(AssembleCommand),

    /// Show file and image metadata
    Metadata(MetadataCommand),
}

fn init_logger(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let result = match cli.command {
        Commands::Analyze(mut cmd) => {
            cmd.verbose = cli.verbose;
            cmd.execute()
        }
        Commands::Extract(cmd) => cmd.execute(),
        Commands::Spiral(cmd) => cmd.execute(),
        Commands::Decode(cmd) => cmd.execute(),
        Commands::Assemble(cmd) => cmd.execute(),
        Commands::Metadata(cmd) => cmd.execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
