//! Velocity-scaling thermostat.
//!
//! Temperatures are in reduced units with `k_B = 1`:
//! `T = sum(m |v|^2) / (dimensions * N)` over active, movable particles.

use crate::container::ParticleContainer;
use crate::error::ConfigError;
use nalgebra::Vector3;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermostatConfig {
    /// Resting particles get Maxwell-Boltzmann velocities of this temperature
    /// before the first step.
    #[serde(default)]
    pub initial_temperature: Option<f64>,
    pub target_temperature: f64,
    /// Steps between two rescalings.
    pub interval: usize,
    /// Largest temperature change per rescaling. Unlimited when absent.
    #[serde(default)]
    pub max_delta: Option<f64>,
}

impl ThermostatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_temperature >= 0.0) {
            return Err(ConfigError::InvalidParameter(format!(
                "target temperature must be non-negative, got {}",
                self.target_temperature
            )));
        }
        if let Some(t) = self.initial_temperature {
            if !(t >= 0.0) {
                return Err(ConfigError::InvalidParameter(format!(
                    "initial temperature must be non-negative, got {t}"
                )));
            }
        }
        if self.interval == 0 {
            return Err(ConfigError::InvalidParameter(
                "thermostat interval must be positive".to_string(),
            ));
        }
        if let Some(delta) = self.max_delta {
            if !(delta > 0.0) {
                return Err(ConfigError::InvalidParameter(format!(
                    "thermostat max_delta must be positive, got {delta}"
                )));
            }
        }
        Ok(())
    }
}

/// Sample a Maxwell-Boltzmann velocity of width `width` along the first
/// `dimensions` axes. The remaining components are zero.
pub fn maxwell_boltzmann_velocity<R: Rng + ?Sized>(
    rng: &mut R,
    width: f64,
    dimensions: usize,
) -> Vector3<f64> {
    let mut v = Vector3::zeros();
    for d in 0..dimensions.min(3) {
        let x: f64 = StandardNormal.sample(rng);
        v[d] = width * x;
    }
    v
}

/// Instantaneous temperature of the active, movable particles.
pub fn temperature<C: ParticleContainer + ?Sized>(container: &C, dimensions: usize) -> f64 {
    let (twice_kinetic, n) = container
        .active_ids()
        .into_iter()
        .map(|id| container.particle(id))
        .filter(|p| !p.is_immovable())
        .fold((0.0, 0usize), |(sum, n), p| {
            (sum + p.mass() * p.velocity.norm_squared(), n + 1)
        });
    if n == 0 {
        return 0.0;
    }
    twice_kinetic / (dimensions as f64 * n as f64)
}

#[derive(Debug, Clone)]
pub struct Thermostat {
    config: ThermostatConfig,
    dimensions: usize,
}

impl Thermostat {
    pub fn new(config: ThermostatConfig, dimensions: usize) -> Self {
        Thermostat { config, dimensions }
    }

    pub fn config(&self) -> &ThermostatConfig {
        &self.config
    }

    pub fn temperature<C: ParticleContainer + ?Sized>(&self, container: &C) -> f64 {
        temperature(container, self.dimensions)
    }

    /// Give every resting particle a thermal velocity of
    /// `sqrt(T_init / m)` per active dimension.
    pub fn initialize<C: ParticleContainer + ?Sized, R: Rng + ?Sized>(
        &self,
        container: &mut C,
        rng: &mut R,
    ) {
        let Some(t_init) = self.config.initial_temperature else {
            return;
        };
        let mut count = 0;
        for id in container.active_ids() {
            let p = container.particle_mut(id);
            if p.is_immovable() || p.velocity != Vector3::zeros() {
                continue;
            }
            let width = (t_init / p.mass()).sqrt();
            p.velocity = maxwell_boltzmann_velocity(rng, width, self.dimensions);
            count += 1;
        }
        debug!("initialised {} particles at temperature {}", count, t_init);
    }

    /// Rescale velocities on every `interval`-th iteration. Returns the new
    /// temperature when a rescaling happened.
    pub fn apply<C: ParticleContainer + ?Sized>(
        &self,
        container: &mut C,
        iteration: usize,
    ) -> Option<f64> {
        if iteration % self.config.interval != 0 {
            return None;
        }
        let current = self.temperature(container);
        if current <= 0.0 {
            warn!("temperature is zero at iteration {}, velocities left unscaled", iteration);
            return None;
        }

        let target = self.config.target_temperature;
        let new = match self.config.max_delta {
            Some(delta) if (target - current).abs() > delta => {
                current + delta.copysign(target - current)
            }
            _ => target,
        };
        let beta = (new / current).sqrt();
        for id in container.active_ids() {
            let p = container.particle_mut(id);
            if !p.is_immovable() {
                p.velocity *= beta;
            }
        }
        debug!("thermostat: {:.6} -> {:.6} (beta = {:.6})", current, new, beta);
        Some(new)
    }
}
