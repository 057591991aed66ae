//! # tabsim command-line entry point
//!
//! ```bash
//! tabsim run --config simulation.json
//! tabsim verify --file table.csv --md5 4fbb00ba35dd05a29be1f52b7e0faeb6
//! tabsim cache clear
//! tabsim settings init
//! ```
//!
//! Logging goes to stderr and to rotating files (see [`tabsim::logging`]);
//! command output goes to stdout.

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout, clippy::print_stderr)] // Allow println! in main binary

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    if let Err(err) = tabsim::logging::init_with_default(level) {
        eprintln!("Warning: file logging unavailable: {err:#}");
    }

    cli::run_command(cli.command)
}
