//! Output formatting and logging utilities

use md::io::XyzWriter;
use md::{Simulation, SimulationError};
use std::fmt;
use std::fs::File;
use std::path::PathBuf;
use std::time::SystemTime as StdSystemTime;
use tracing::info;
use tracing_subscriber::{
    fmt::format::Writer, fmt::layer, fmt::time::FormatTime, layer::SubscriberExt,
    util::SubscriberInitExt, Registry,
};

/// Custom time formatter that shows only seconds
struct SecondPrecisionTimer;

impl FormatTime for SecondPrecisionTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        let now = StdSystemTime::now();
        let duration = now
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();

        let total_seconds = duration.as_secs();
        let hours = (total_seconds / 3600) % 24;
        let minutes = (total_seconds / 60) % 60;
        let seconds = total_seconds % 60;

        write!(w, "{:02}:{:02}:{:02}", hours, minutes, seconds)
    }
}

/// Setup log output to file or stdout
pub fn setup_output(output_path: Option<&String>) {
    match output_path {
        Some(path) => {
            if let Ok(log) = File::create(path) {
                let file_layer = layer()
                    .with_writer(log)
                    .with_timer(SecondPrecisionTimer)
                    .with_ansi(false);
                Registry::default().with(file_layer).init();
                info!("Log written to: {}", path);
            } else {
                eprintln!("Could not create output file: {}", path);
            }
        }
        None => {
            let stdout_layer = layer()
                .with_writer(std::io::stdout)
                .with_timer(SecondPrecisionTimer)
                .with_ansi(true);
            Registry::default().with(stdout_layer).init();
        }
    }
}

/// Writes a frame every `interval` iterations.
pub struct FrameSink {
    writer: Option<XyzWriter>,
    interval: usize,
    written: Vec<PathBuf>,
}

impl FrameSink {
    pub fn new(writer: Option<XyzWriter>, interval: usize) -> Self {
        FrameSink {
            writer,
            interval: interval.max(1),
            written: Vec::new(),
        }
    }

    pub fn frames(&self) -> &[PathBuf] {
        &self.written
    }

    /// Write the current state if the iteration is due.
    pub fn observe(&mut self, simulation: &Simulation) -> Result<(), SimulationError> {
        let Some(writer) = &self.writer else {
            return Ok(());
        };
        let iteration = simulation.iteration();
        if iteration % self.interval != 0 {
            return Ok(());
        }
        let path = writer.write_frame(simulation.container(), iteration, simulation.time())?;
        self.written.push(path);
        Ok(())
    }
}
