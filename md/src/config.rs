use crate::boundary::{Boundary, BoundaryConditions};
use crate::container::ContainerKind;
use crate::error::{ConfigError, IoError, SimulationError};
use crate::forces::{ForceConfig, ForceKind};
use crate::generator::{Cuboid, Disc, Membrane};
use crate::thermostat::ThermostatConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for molecular dynamics simulations
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MdConfig {
    /// Time range and output cadence
    pub simulation: SimulationConfig,
    /// Simulation box, container and boundaries
    pub domain: DomainConfig,
    #[serde(default)]
    pub forces: ForcesConfig,
    #[serde(default)]
    pub thermostat: Option<ThermostatConfig>,
    /// Generated particles
    #[serde(default)]
    pub particles: ParticlesConfig,
    /// Checkpoint to load particles from, in addition to generated ones
    #[serde(default)]
    pub checkpoint: Option<PathBuf>,
    /// Random seed for thermal velocities; drawn from entropy when absent
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulationConfig {
    #[serde(default)]
    pub start_time: f64,
    pub end_time: f64,
    pub delta_t: f64,
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
    /// Iterations between two trajectory frames
    #[serde(default = "default_output_interval")]
    pub output_interval: usize,
    #[serde(default = "default_basename")]
    pub output_basename: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DomainConfig {
    pub size: [f64; 3],
    pub cutoff: f64,
    #[serde(default)]
    pub container: ContainerKind,
    #[serde(default)]
    pub boundaries: BoundaryConditions,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ForcesConfig {
    #[serde(default)]
    pub kind: ForceKind,
    /// Uniform gravity field along y
    #[serde(default)]
    pub g_grav: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct ParticlesConfig {
    #[serde(default)]
    pub cuboids: Vec<Cuboid>,
    #[serde(default)]
    pub discs: Vec<Disc>,
    #[serde(default)]
    pub membranes: Vec<Membrane>,
}

fn default_dimensions() -> usize {
    3
}

fn default_output_interval() -> usize {
    10
}

fn default_basename() -> String {
    "md".to_string()
}

impl MdConfig {
    /// Load configuration from YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SimulationError> {
        let content = fs::read_to_string(path).map_err(IoError::from)?;
        let config: MdConfig = serde_yml::from_str(&content).map_err(IoError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        let content = serde_yml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        if sim.start_time > sim.end_time {
            return Err(ConfigError::TimeRange {
                start: sim.start_time,
                end: sim.end_time,
            });
        }
        if !(sim.delta_t > 0.0) {
            return Err(ConfigError::TimeStep(sim.delta_t));
        }
        if !(2..=3).contains(&sim.dimensions) {
            return Err(ConfigError::Dimensions(sim.dimensions));
        }
        if sim.output_interval == 0 {
            return Err(ConfigError::InvalidParameter(
                "output interval must be positive".to_string(),
            ));
        }

        let domain = &self.domain;
        if !domain.size.iter().all(|&l| l > 0.0) {
            return Err(ConfigError::DomainSize(domain.size));
        }
        if !(domain.cutoff > 0.0) {
            return Err(ConfigError::Cutoff(domain.cutoff));
        }
        domain.boundaries.validate()?;
        if domain.container == ContainerKind::DirectSum {
            if domain.boundaries.any(Boundary::Reflecting) {
                return Err(ConfigError::RequiresGrid("reflecting"));
            }
            if domain.boundaries.any(Boundary::Periodic) {
                return Err(ConfigError::RequiresGrid("periodic"));
            }
        }

        self.forces.kind.validate()?;
        if let Some(thermostat) = &self.thermostat {
            thermostat.validate()?;
        }

        let particles = &self.particles;
        for cuboid in &particles.cuboids {
            cuboid.validate()?;
        }
        for disc in &particles.discs {
            disc.validate()?;
        }
        for membrane in &particles.membranes {
            membrane.validate()?;
        }
        if !particles.membranes.is_empty() && self.forces.kind.harmonic().is_none() {
            return Err(ConfigError::InvalidParameter(
                "membranes need a harmonic force".to_string(),
            ));
        }
        Ok(())
    }

    pub fn force_config(&self) -> ForceConfig {
        ForceConfig {
            kind: self.forces.kind.clone(),
            g_grav: self.forces.g_grav,
            boundaries: self.domain.boundaries,
            dimensions: self.simulation.dimensions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    const FALLING_DROP: &str = r#"
simulation:
  end_time: 15.0
  delta_t: 0.0005
  dimensions: 2
  output_interval: 100
domain:
  size: [303, 180, 1]
  cutoff: 3.0
  boundaries:
    x_low: periodic
    x_high: periodic
    y_low: reflecting
    y_high: reflecting
forces:
  kind:
    type: lennard_jones
  g_grav: -12.44
thermostat:
  initial_temperature: 0.5
  target_temperature: 0.5
  interval: 1000
particles:
  cuboids:
    - origin: [1.5, 2, 0.5]
      counts: [250, 20, 1]
      spacing: 1.2
      mass: 1.0
      epsilon: 1.2
      sigma: 1.2
  discs:
    - center: [150, 150, 0.5]
      radius: 20
      spacing: 1.2
      mass: 1.0
seed: 42
"#;

    fn create_test_config() -> MdConfig {
        serde_yml::from_str(FALLING_DROP).unwrap()
    }

    #[test]
    fn test_yaml_defaults() {
        let config = create_test_config();
        assert_eq!(config.simulation.start_time, 0.0);
        assert_eq!(config.simulation.output_basename, "md");
        assert_eq!(config.domain.container, ContainerKind::LinkedCells);
        assert_eq!(config.domain.boundaries.z_low, Boundary::Reflecting);
        assert_eq!(config.particles.discs[0].sigma, 1.0);
        assert!(config.particles.membranes.is_empty());
        assert!(config.validate().is_ok());

        let forces = config.force_config();
        assert_eq!(forces.dimensions, 2);
        assert_eq!(forces.boundaries.periodic_flags(), [true, false, false]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = create_test_config();

        config.simulation.start_time = 20.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TimeRange {
                start: 20.0,
                end: 15.0
            })
        );
        config.simulation.start_time = 0.0;

        config.simulation.dimensions = 4;
        assert_eq!(config.validate(), Err(ConfigError::Dimensions(4)));
        config.simulation.dimensions = 2;

        config.simulation.delta_t = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::TimeStep(0.0)));
        config.simulation.delta_t = 0.0005;

        config.domain.size[1] = -1.0;
        assert!(matches!(config.validate(), Err(ConfigError::DomainSize(_))));
        config.domain.size[1] = 180.0;

        config.domain.cutoff = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::Cutoff(0.0)));
        config.domain.cutoff = 3.0;

        config.domain.boundaries.x_high = Boundary::Outflow;
        assert_eq!(config.validate(), Err(ConfigError::HalfPeriodic { axis: 'x' }));
        config.domain.boundaries.x_high = Boundary::Periodic;

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_direct_sum_needs_outflow() {
        let mut config = create_test_config();
        config.domain.container = ContainerKind::DirectSum;
        assert_eq!(config.validate(), Err(ConfigError::RequiresGrid("reflecting")));

        config.domain.boundaries.y_low = Boundary::Outflow;
        config.domain.boundaries.y_high = Boundary::Outflow;
        config.domain.boundaries.z_low = Boundary::Outflow;
        config.domain.boundaries.z_high = Boundary::Outflow;
        assert_eq!(config.validate(), Err(ConfigError::RequiresGrid("periodic")));

        config.domain.boundaries = BoundaryConditions::uniform(Boundary::Outflow);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_membrane_needs_harmonic_force() {
        let mut config = create_test_config();
        let membrane: Membrane = serde_yml::from_str(
            "origin: [15, 15, 1.5]\ncounts: [4, 4, 1]\nspacing: 2.2\nmass: 1.0\n",
        )
        .unwrap();
        config.particles.membranes.push(membrane);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidParameter(_))));

        config.forces.kind = ForceKind::Combined {
            parts: vec![
                ForceKind::LennardJones,
                ForceKind::Harmonic {
                    stiffness: 300.0,
                    rest_length: 2.2,
                },
            ],
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_file_io() {
        let config = create_test_config();

        let temp_file = NamedTempFile::new().unwrap();
        config.to_file(temp_file.path()).unwrap();

        let loaded_config = MdConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config, config);
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let mut config = create_test_config();
        config.simulation.delta_t = -1.0;
        let temp_file = NamedTempFile::new().unwrap();
        config.to_file(temp_file.path()).unwrap();

        assert!(matches!(
            MdConfig::from_file(temp_file.path()),
            Err(SimulationError::Config(ConfigError::TimeStep(_)))
        ));
    }
}
