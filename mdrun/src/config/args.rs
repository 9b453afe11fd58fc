//! Command-line argument parsing for MD runs

use clap::Parser;
use std::path::PathBuf;

/// Linked-cell molecular dynamics with YAML configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Log file (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override end time
    #[arg(long)]
    pub end_time: Option<f64>,

    /// Override time step
    #[arg(long)]
    pub delta_t: Option<f64>,

    /// Override steps between two written frames
    #[arg(long)]
    pub output_interval: Option<usize>,

    /// Directory for XYZ frames
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Restart from this checkpoint
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Write a checkpoint of the final state here
    #[arg(long)]
    pub checkpoint_out: Option<PathBuf>,

    /// Override the random seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip writing XYZ frames
    #[arg(long)]
    pub no_output: bool,
}
