//! Logging setup and trajectory output for the runner

mod output;

pub use output::{setup_output, FrameSink};
