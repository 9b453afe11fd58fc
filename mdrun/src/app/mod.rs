mod report;

use self::report::{report_setup, report_summary};
use crate::config::{load_config, Args};
use crate::io::{setup_output, FrameSink};
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use md::io::{write_checkpoint, XyzWriter};
use md::{MdConfig, Simulation};
use tracing::info;

pub struct MdApplication {
    args: Args,
    config: MdConfig,
}

impl MdApplication {
    pub fn from_cli() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Install logging, then load the configuration so that override
    /// messages reach the log.
    pub fn from_args(args: Args) -> Result<Self> {
        setup_output(args.output.as_ref());
        let config = load_config(&args)?;
        info!("Configuration loaded from: {}", args.config_file);
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        let mut simulation =
            Simulation::new(&self.config).wrap_err("Failed to set up the simulation")?;
        report_setup(&self.config, &simulation);

        let writer = (!self.args.no_output).then(|| {
            XyzWriter::new(&self.args.out_dir, &self.config.simulation.output_basename)
        });
        let mut frames = FrameSink::new(writer, self.config.simulation.output_interval);
        let summary = simulation
            .run_with(|s| frames.observe(s))
            .wrap_err_with(|| format!("Simulation failed at t = {:.6}", simulation.time()))?;
        report_summary(&summary, &simulation, frames.frames().len());

        if let Some(path) = &self.args.checkpoint_out {
            write_checkpoint(path, &simulation.checkpoint())
                .wrap_err_with(|| format!("Unable to write checkpoint: {}", path.display()))?;
            info!("Checkpoint written to: {}", path.display());
        }

        Ok(())
    }
}
