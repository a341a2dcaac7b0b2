// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! runstat CLI
//!
//! Runs a command repeatedly and reports timing statistics.

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use runstat_core::Benchmark;

mod error;
mod fd;
mod output;
mod settings;

use error::{CliError, CliResult};

/// runstat - repeat a command and report min/max/average/stdev of its run time
#[derive(Parser, Debug)]
#[command(name = "runstat")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repeat the command N times
    #[arg(short = 'c', long = "count", value_name = "N")]
    pub count: Option<u64>,

    /// Drop the N percent best and worst realtime results
    #[arg(short = 'd', long = "drop", value_name = "N")]
    pub drop: Option<u32>,

    /// Pass environment variable VAR to the command, or set VAR=VALUE
    #[arg(short = 'E', long = "env", value_name = "VAR")]
    pub env: Vec<String>,

    /// Append results to FILE instead of the terminal
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Run N copies of the command concurrently in every trial
    #[arg(short = 'p', long = "parallel", value_name = "N")]
    pub parallel: Option<u32>,

    /// Measure dynamic-linker relocation time (implies --verbose)
    #[arg(short = 'r', long)]
    pub relocations: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Ignore the exit status of the command
    #[arg(short = 'n', long = "ignore")]
    pub ignore: bool,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,

    /// YAML profile with default settings
    #[arg(long, value_name = "FILE")]
    pub profile: Option<PathBuf>,

    /// Command to run, followed by its arguments
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

impl Cli {
    fn verbose(&self) -> bool {
        self.verbose || self.relocations
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose() { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(std::io::stderr)
        .init();

    fd::close_inherited();

    if let Err(e) = run(cli) {
        eprintln!("runstat: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let (config, invocation) = settings::resolve(&cli, |name| std::env::var(name).ok())?;

    let mut sink = output::open(cli.output.as_deref());
    let report = Benchmark::new(&config, &invocation).run()?;

    match cli.format {
        Format::Text => {
            if report.has_results() {
                write!(sink, "{}", report).map_err(|source| CliError::Write { source })?;
            }
        }
        Format::Json => {
            let json = report.to_json()?;
            writeln!(sink, "{}", json).map_err(|source| CliError::Write { source })?;
        }
    }

    sink.flush().map_err(|source| CliError::Write { source })
}
