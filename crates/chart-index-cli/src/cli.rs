//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::Parser;

/// Chart Index - Generate a chart repository index filtered by a subscription
#[derive(Parser, Debug)]
#[command(name = "chart-index")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Repository root to scan for charts
    #[arg(short, long, env = "CHART_INDEX_ROOT")]
    pub root: PathBuf,

    /// Subscription document (.toml, .json, .yaml)
    #[arg(short, long)]
    pub subscription: PathBuf,

    /// Write the index here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
