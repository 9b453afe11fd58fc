pub mod boundary;
pub mod config;
pub mod container;
pub mod error;
pub mod forces;
pub mod generator;
pub mod integrator;
pub mod io;
pub mod particle;
pub mod simulation;
pub mod thermostat;

pub use boundary::{Boundary, BoundaryConditions};
pub use config::MdConfig;
pub use container::{ContainerKind, DirectSum, Grid, ParticleContainer};
pub use error::{ConfigError, ForceError, IoError, SimulationError};
pub use forces::{ForceConfig, ForceEvaluator, ForceKind, LennardJones};
pub use integrator::{Integrator, StormerVerlet};
pub use particle::{Particle, ParticleId};
pub use simulation::{RunSummary, Simulation};
pub use thermostat::{Thermostat, ThermostatConfig};
