//! Molecular dynamics command-line interface
//!
//! Reads a YAML configuration, runs the simulation and writes XYZ frames.

mod app;
mod config;
mod io;

use app::MdApplication;
use color_eyre::eyre::Result;

fn main() -> Result<()> {
    color_eyre::install()?;
    MdApplication::from_cli()?.run()
}
