//! Configuration handling for the command-line runner
//!
//! The YAML layout lives in [`md::MdConfig`]; this module layers the
//! command-line overrides on top of it.

mod args;

pub use args::Args;

use color_eyre::eyre::{Result, WrapErr};
use md::MdConfig;
use std::fs;
use tracing::info;

/// Read, override and validate the configuration named by `args`.
pub fn load_config(args: &Args) -> Result<MdConfig> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let mut config = serde_yml::from_str::<MdConfig>(&config_content)
        .wrap_err("Failed to parse configuration file")?;
    apply_overrides(&mut config, args);
    config
        .validate()
        .wrap_err("Invalid configuration")?;

    Ok(config)
}

/// Command-line values win over the file.
pub fn apply_overrides(config: &mut MdConfig, args: &Args) {
    if let Some(end_time) = args.end_time {
        info!("Overriding end_time with: {}", end_time);
        config.simulation.end_time = end_time;
    }
    if let Some(delta_t) = args.delta_t {
        info!("Overriding delta_t with: {}", delta_t);
        config.simulation.delta_t = delta_t;
    }
    if let Some(interval) = args.output_interval {
        info!("Overriding output_interval with: {}", interval);
        config.simulation.output_interval = interval;
    }
    if let Some(checkpoint) = &args.checkpoint {
        info!("Restarting from checkpoint: {}", checkpoint.display());
        config.checkpoint = Some(checkpoint.clone());
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SMALL: &str = r#"
simulation:
  end_time: 1.0
  delta_t: 0.01
domain:
  size: [10, 10, 10]
  cutoff: 2.5
particles:
  cuboids:
    - origin: [2, 2, 2]
      counts: [2, 2, 2]
      spacing: 1.2
      mass: 1.0
"#;

    fn config_file(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_leave_the_file_alone() {
        let file = config_file(SMALL);
        let args = Args::parse_from(["mdrun", "-c", file.path().to_str().unwrap()]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.simulation.end_time, 1.0);
        assert_eq!(config.simulation.output_interval, 10);
        assert_eq!(config.checkpoint, None);
        assert!(!args.no_output);
    }

    #[test]
    fn flags_override_the_file() {
        let file = config_file(SMALL);
        let args = Args::parse_from([
            "mdrun",
            "-c",
            file.path().to_str().unwrap(),
            "--end-time",
            "2.5",
            "--delta-t",
            "0.005",
            "--output-interval",
            "3",
            "--checkpoint",
            "state.yaml",
            "--seed",
            "42",
        ]);
        let config = load_config(&args).unwrap();
        assert_eq!(config.simulation.end_time, 2.5);
        assert_eq!(config.simulation.delta_t, 0.005);
        assert_eq!(config.simulation.output_interval, 3);
        assert_eq!(config.checkpoint.as_deref(), Some(std::path::Path::new("state.yaml")));
        assert_eq!(config.seed, Some(42));
    }

    #[test]
    fn overrides_are_validated() {
        let file = config_file(SMALL);
        let args = Args::parse_from([
            "mdrun",
            "-c",
            file.path().to_str().unwrap(),
            "--delta-t",
            "0",
        ]);
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let args = Args::parse_from(["mdrun", "-c", "/nonexistent/config.yaml"]);
        let err = load_config(&args).unwrap_err();
        assert!(err.to_string().contains("Unable to read configuration file"));
    }
}
