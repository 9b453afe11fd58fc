//! Error types shared by the simulation library.

use crate::particle::ParticleId;
use thiserror::Error;

/// Static configuration mistakes, detected before the first time step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("domain size must be positive in every dimension, got {0:?}")]
    DomainSize([f64; 3]),

    #[error("cutoff radius must be positive, got {0}")]
    Cutoff(f64),

    #[error("start time {start} is after end time {end}")]
    TimeRange { start: f64, end: f64 },

    #[error("time step must be positive, got {0}")]
    TimeStep(f64),

    #[error("dimensions must be 2 or 3, got {0}")]
    Dimensions(usize),

    #[error("axis {axis} has exactly one periodic face")]
    HalfPeriodic { axis: char },

    #[error("{0} boundaries need the linked-cell container")]
    RequiresGrid(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Numerical failures raised while evaluating forces or moving particles.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForceError {
    #[error("particles {first} and {second} are coincident")]
    CoincidentParticles { first: ParticleId, second: ParticleId },

    #[error("non-finite force on particle {particle}")]
    NonFiniteForce { particle: ParticleId },

    #[error("particle {particle} is still outside the domain at {position:?} after reflection")]
    EscapedParticle { particle: ParticleId, position: [f64; 3] },
}

/// Trajectory and checkpoint I/O failures.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yml::Error),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Force(#[from] ForceError),

    #[error(transparent)]
    Io(#[from] IoError),
}
