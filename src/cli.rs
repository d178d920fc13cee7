// Author: Dustin Pilgrim
// License: MIT

use std::path::PathBuf;

use clap::Parser;

/// Drives a secondary marquee display by reacting to front-end state-change
/// events over a message broker.
#[derive(Debug, Parser)]
#[command(name = "dynquee", version, about)]
pub struct Args {
    /// Path to the config file. Falls back to a documented search path if omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress console log output (file logging, if configured, is unaffected).
    #[arg(long)]
    pub no_console: bool,

    /// Include timestamps in console log lines.
    #[arg(long)]
    pub timestamps: bool,
}
