//! Time loop tying container, forces, integrator and thermostat together.

use crate::config::MdConfig;
use crate::container::{ContainerKind, DirectSum, Grid, ParticleContainer};
use crate::error::SimulationError;
use crate::forces::ForceEvaluator;
use crate::generator::{insert_all, insert_membrane};
use crate::integrator::{Integrator, StormerVerlet};
use crate::io::{read_checkpoint, Checkpoint};
use crate::particle::ParticleId;
use crate::thermostat::{self, Thermostat};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct ScheduledPull {
    ids: Vec<ParticleId>,
    force: Vector3<f64>,
    until: f64,
}

/// Outcome of [`Simulation::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub iterations: usize,
    pub final_time: f64,
    pub particles: usize,
    pub halo: usize,
    pub temperature: f64,
}

pub struct Simulation {
    container: Box<dyn ParticleContainer>,
    integrator: StormerVerlet,
    thermostat: Option<Thermostat>,
    pulls: Vec<ScheduledPull>,
    active_pulls: usize,
    dimensions: usize,
    start_time: f64,
    end_time: f64,
    delta_t: f64,
    iteration: usize,
}

impl Simulation {
    /// Build the container, insert every configured particle and compute
    /// the initial forces.
    pub fn new(config: &MdConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let domain = &config.domain;
        let mut container: Box<dyn ParticleContainer> = match domain.container {
            ContainerKind::LinkedCells => Box::new(Grid::new(domain.size, domain.cutoff)),
            ContainerKind::DirectSum => Box::new(
                DirectSum::new()
                    .with_domain(domain.size)
                    .with_cutoff(domain.cutoff),
            ),
        };

        if let Some(path) = &config.checkpoint {
            let checkpoint = read_checkpoint(path)?;
            info!(
                "loaded {} particles from checkpoint {} (saved at t = {})",
                checkpoint.particles.len(),
                path.display(),
                checkpoint.time
            );
            insert_all(container.as_mut(), checkpoint.into_particles()?);
        }

        let particles = &config.particles;
        for cuboid in &particles.cuboids {
            insert_all(container.as_mut(), cuboid.particles());
        }
        for disc in &particles.discs {
            insert_all(container.as_mut(), disc.particles());
        }
        let mut pulls = Vec::new();
        for membrane in &particles.membranes {
            let ids = insert_membrane(container.as_mut(), membrane)?;
            if let Some(pull) = &membrane.pull {
                pulls.push(ScheduledPull {
                    ids: ids.pulled,
                    force: Vector3::from(pull.force),
                    until: pull.until,
                });
            }
        }
        info!(
            "{} particles inserted, {} outside the domain",
            container.len(),
            container.halo().len()
        );

        let dimensions = config.simulation.dimensions;
        let thermostat = config
            .thermostat
            .clone()
            .map(|t| Thermostat::new(t, dimensions));
        if let Some(thermostat) = &thermostat {
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            thermostat.initialize(container.as_mut(), &mut rng);
        }

        let mut simulation = Simulation {
            container,
            integrator: StormerVerlet::new(ForceEvaluator::new(config.force_config())),
            thermostat,
            pulls,
            active_pulls: 0,
            dimensions,
            start_time: config.simulation.start_time,
            end_time: config.simulation.end_time,
            delta_t: config.simulation.delta_t,
            iteration: 0,
        };
        simulation.schedule_pulls();
        simulation
            .integrator
            .evaluator()
            .step(simulation.container.as_mut())?;
        Ok(simulation)
    }

    pub fn container(&self) -> &dyn ParticleContainer {
        self.container.as_ref()
    }

    pub fn time(&self) -> f64 {
        self.start_time + self.iteration as f64 * self.delta_t
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn temperature(&self) -> f64 {
        thermostat::temperature(self.container.as_ref(), self.dimensions)
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::capture(self.container.as_ref(), self.time())
    }

    /// Keep the evaluator's pull forces in line with the current time.
    fn schedule_pulls(&mut self) {
        let time = self.time();
        let active: Vec<&ScheduledPull> = self.pulls.iter().filter(|p| time < p.until).collect();
        if active.len() == self.active_pulls && self.iteration > 0 {
            return;
        }
        let evaluator = self.integrator.evaluator_mut();
        evaluator.clear_pulls();
        for pull in &active {
            evaluator.add_pull(pull.ids.clone(), pull.force);
        }
        if active.len() < self.active_pulls {
            info!("pull force released at t = {:.4}", time);
        }
        self.active_pulls = active.len();
    }

    /// One integration step followed by the thermostat.
    pub fn advance(&mut self) -> Result<(), SimulationError> {
        self.schedule_pulls();
        self.integrator
            .step(self.container.as_mut(), self.delta_t)?;
        self.iteration += 1;
        if let Some(thermostat) = &self.thermostat {
            if let Some(t) = thermostat.apply(self.container.as_mut(), self.iteration) {
                debug!("iteration {}: temperature set to {:.6}", self.iteration, t);
            }
        }
        Ok(())
    }

    pub fn run(&mut self) -> Result<RunSummary, SimulationError> {
        self.run_with(|_| Ok(()))
    }

    /// Step until the end time, calling `observer` after every step.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<RunSummary, SimulationError>
    where
        F: FnMut(&Simulation) -> Result<(), SimulationError>,
    {
        info!(
            "running from t = {} to t = {} with dt = {}",
            self.time(),
            self.end_time,
            self.delta_t
        );
        while self.time() < self.end_time {
            self.advance()?;
            observer(self)?;
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            iterations: self.iteration,
            final_time: self.time(),
            particles: self.container.len(),
            halo: self.container.halo().len(),
            temperature: self.temperature(),
        }
    }
}
