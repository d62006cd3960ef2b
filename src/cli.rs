//! Command-line surface for the `pwcache-sim` binary.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to a scenario JSON file (SPEC_FULL §6).
    #[arg(required = true)]
    pub scenario: String,

    /// Emit one JSON trace event per line to this path instead of discarding
    /// tick-engine events.
    #[arg(short, long)]
    pub trace_output: Option<String>,

    /// Name given to the simulated PWC instance, used in port labels.
    #[arg(short, long, default_value = "pwc0")]
    pub name: String,
}
