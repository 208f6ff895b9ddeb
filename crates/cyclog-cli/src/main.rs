//! cyclog - decompress a binary cyclog stream into readable log lines
//!
//! Reads a log file produced by the runtime logger, decodes every message
//! with the format catalog generated alongside it, and prints one line per
//! message to stdout. Diagnostics go to stderr.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cyclog_format::FormatCatalog;
use cyclog_replay::{
    render_checkpoint, render_line, ReplayConfig, ReplayEvent, Replayer, TimeConversion,
    DEFAULT_CYCLES_PER_SECOND,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cyclog")]
#[command(about = "Decompress a cyclog binary log")]
#[command(version)]
struct Cli {
    /// Binary log file to decompress
    log_file: PathBuf,

    /// Stop after this many messages (0 = no limit)
    #[arg(default_value_t = 0)]
    max_messages: u64,

    /// Format catalog (JSON) matching the program that wrote the log
    #[arg(short, long)]
    catalog: PathBuf,

    /// Where the cycles-to-nanoseconds rate comes from
    #[arg(long, value_enum, default_value_t = Calibration::Fixed)]
    calibration: Calibration,

    /// Rate for fixed calibration, or the fallback before the first checkpoint
    #[arg(long, default_value_t = DEFAULT_CYCLES_PER_SECOND)]
    cycles_per_second: f64,

    /// Prefix each message with its source file, line and level
    #[arg(long)]
    origin: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Calibration {
    /// Use --cycles-per-second for the whole log
    Fixed,
    /// Adopt the rate carried by each checkpoint
    Checkpoint,
}

impl Cli {
    fn replay_config(&self) -> ReplayConfig {
        let rate = self.cycles_per_second;
        ReplayConfig {
            message_limit: (self.max_messages > 0).then_some(self.max_messages),
            time_conversion: match self.calibration {
                Calibration::Fixed => TimeConversion::Fixed {
                    cycles_per_second: rate,
                },
                Calibration::Checkpoint => TimeConversion::Checkpoint {
                    fallback_cycles_per_second: rate,
                },
            },
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.replay_config();
    config.validate().context("invalid arguments")?;

    let catalog = FormatCatalog::from_path(&cli.catalog)?;
    tracing::info!(formats = catalog.len(), path = %cli.catalog.display(), "catalog loaded");
    let registry = catalog.into_registry(cli.origin);

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(out, "Opening file {}", cli.log_file.display())?;

    let file = File::open(&cli.log_file)
        .with_context(|| format!("failed to open {}", cli.log_file.display()))?;
    let mut replayer = Replayer::from_reader(BufReader::new(file), &registry, config)?;

    let outcome = loop {
        match replayer.next_event() {
            Ok(Some(ReplayEvent::Message(msg))) => writeln!(out, "{}", render_line(&msg))?,
            Ok(Some(ReplayEvent::Checkpoint(cp))) => writeln!(out, "{}", render_checkpoint(&cp))?,
            Ok(Some(ReplayEvent::Padding { .. })) => {}
            Ok(None) => break Ok(()),
            Err(e) => break Err(e),
        }
    };

    let summary = replayer.summary();
    if outcome.is_ok() {
        writeln!(
            out,
            "Decompression complete after printing {} log messages",
            summary.messages_emitted
        )?;
    }
    out.flush()?;

    tracing::info!(
        messages = summary.messages_emitted,
        checkpoints = summary.checkpoints,
        pad_bytes = summary.pad_bytes,
        bytes = summary.bytes_consumed,
        stopped_by_limit = summary.stopped_by_limit,
        "replay finished"
    );
    outcome.with_context(|| format!("failed to decompress {}", cli.log_file.display()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
