//! niv: convert between CSV, XLSX, JSON and JSON Lines
//!
//! Usage:
//!   # Write to a file
//!   niv json2csv -i events.jsonl -o events.csv
//!
//!   # Write to stdout
//!   niv flatten -i nested.json | jq .
//!
//!   # Merge a directory of JSON files
//!   niv aggregate -i ./dumps -o all.json
//!
//!   # Semicolon-delimited input, no progress bars
//!   niv --no-progress csv2excel -i export.csv -o export.xlsx

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{anyhow, Context, Result};
use clap::{ArgMatches, Args, Command, FromArgMatches};
use colored::Colorize;
use niv::transforms::{lookup, TRANSFORMS};
use niv::{logging, TransformConfig};
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

/// Options shared by every transform
#[derive(Args, Debug)]
struct GlobalArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Separator joining nested key paths
    #[arg(long, env = "NIV_SEPARATOR", default_value = ".")]
    separator: String,

    /// Field delimiter for CSV input and output (a single character, or "tab")
    #[arg(long, env = "NIV_DELIMITER", value_parser = parse_delimiter)]
    delimiter: Option<u8>,

    /// Rows written per batch
    #[arg(long, env = "NIV_BATCH_SIZE", default_value_t = 10_000, value_parser = parse_positive)]
    batch_size: usize,

    /// Rows scanned to infer column types
    #[arg(long, env = "NIV_INFER_SCHEMA_LENGTH", default_value_t = 100_000, value_parser = parse_positive)]
    infer_schema_length: usize,

    /// Don't draw progress bars
    #[arg(long, env = "NIV_NO_PROGRESS")]
    no_progress: bool,
}

impl GlobalArgs {
    fn transform_config(&self) -> TransformConfig {
        TransformConfig {
            separator: self.separator.clone(),
            delimiter: self.delimiter,
            batch_size: self.batch_size,
            infer_schema_length: self.infer_schema_length,
            show_progress: !self.no_progress,
        }
    }
}

/// Paths every transform takes
#[derive(Args, Debug)]
struct IoArgs {
    /// Input file (a directory for aggregate)
    #[arg(short, long, value_name = "PATH", value_parser = existing_path)]
    input: PathBuf,

    /// Output file (stdout if omitted)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

fn parse_delimiter(raw: &str) -> std::result::Result<u8, String> {
    match raw {
        "tab" | "\\t" => Ok(b'\t'),
        _ if raw.len() == 1 && raw.is_ascii() => Ok(raw.as_bytes()[0]),
        _ => Err(format!("expected a single ASCII character, got '{}'", raw)),
    }
}

fn parse_positive(raw: &str) -> std::result::Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

fn existing_path(raw: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("path does not exist: {}", raw))
    }
}

/// `--version` anywhere on the command line, checked before clap parses it
fn wants_version<I: IntoIterator<Item = OsString>>(args: I) -> bool {
    args.into_iter().any(|arg| arg == "--version")
}

fn command() -> Command {
    let root = Command::new("niv")
        .about("Streaming converters between CSV, XLSX, JSON and JSON Lines")
        .subcommand_required(true)
        .arg_required_else_help(true);
    let root = GlobalArgs::augment_args(root);

    TRANSFORMS.iter().fold(root, |cmd, spec| {
        cmd.subcommand(IoArgs::augment_args(
            Command::new(spec.command_name()).about(spec.summary),
        ))
    })
}

fn main() -> ExitCode {
    if wants_version(std::env::args_os().skip(1)) {
        println!("Niv Transforms v{}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    let matches = command().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                format!("An error occurred during transformation: {:#}", e).red()
            );
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    let globals = GlobalArgs::from_arg_matches(matches)?;
    logging::init(globals.verbose, globals.quiet);
    let config = globals.transform_config();

    let (name, sub) = matches
        .subcommand()
        .ok_or_else(|| anyhow!("no transform given"))?;
    let spec = lookup(name).ok_or_else(|| anyhow!("unknown transform '{}'", name))?;
    let io_args = IoArgs::from_arg_matches(sub)?;
    debug!(transform = spec.name, input = %io_args.input.display(), "dispatching");

    match io_args.output {
        Some(output) => {
            let output = absolute(&output)?;
            let report = (spec.run)(&io_args.input, &output, &config)?;
            debug!(records = report.records, "transform finished");
            println!(
                "{}",
                format!("Successfully created output file: {}", output.display()).green()
            );
        }
        None => {
            // Removed on drop, whether or not the transform succeeds
            let temp = tempfile::Builder::new()
                .suffix(".tmp")
                .tempfile()
                .context("Failed to create temporary output file")?;
            let report = (spec.run)(&io_args.input, temp.path(), &config)?;
            debug!(records = report.records, "transform finished");

            let mut file = File::open(temp.path()).context("Failed to reopen temporary output")?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            io::copy(&mut file, &mut handle).context("Failed to copy output to stdout")?;
            handle.flush()?;
        }
    }

    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to resolve the working directory")?;
    Ok(cwd.join(path))
}
