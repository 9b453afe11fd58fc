//! Force evaluation over a particle container.
//!
//! One evaluator handles every force kind. A step resets the accumulators,
//! then adds in turn the periodic-image Lennard-Jones terms, the reflecting
//! wall correction, the plain Lennard-Jones pairs, membrane bonds, pairwise
//! gravity and any external pull.
//!
//! Pair forces are computed in parallel into `(i, j, f)` buffers and added to
//! the particles serially afterwards, `+f` on `i` and `-f` on `j`.

mod lj_pot;

pub use lj_pot::LennardJones;

use crate::boundary::BoundaryConditions;
use crate::container::{CellLattice, Pair, ParticleContainer};
use crate::error::{ConfigError, ForceError};
use crate::particle::{Particle, ParticleId};
use nalgebra::Vector3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;
use tracing::debug;

/// Which interactions act between particles.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ForceKind {
    #[default]
    LennardJones,
    /// Pairwise Newtonian gravity with constant `g`.
    Gravitational { g: f64 },
    /// Springs along membrane bonds.
    Harmonic { stiffness: f64, rest_length: f64 },
    Combined { parts: Vec<ForceKind> },
}

impl ForceKind {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            ForceKind::LennardJones => Ok(()),
            ForceKind::Gravitational { g } if !g.is_finite() => Err(
                ConfigError::InvalidParameter(format!("gravitational constant {g} is not finite")),
            ),
            ForceKind::Gravitational { .. } => Ok(()),
            ForceKind::Harmonic {
                stiffness,
                rest_length,
            } => {
                if !(*stiffness >= 0.0) || !(*rest_length > 0.0) {
                    return Err(ConfigError::InvalidParameter(format!(
                        "harmonic force needs stiffness >= 0 and rest length > 0, \
                         got {stiffness} and {rest_length}"
                    )));
                }
                Ok(())
            }
            ForceKind::Combined { parts } => parts.iter().try_for_each(ForceKind::validate),
        }
    }

    /// Stiffness and rest length of the first harmonic term, if any.
    pub fn harmonic(&self) -> Option<(f64, f64)> {
        self.terms().harmonic.first().copied()
    }

    pub fn has_lennard_jones(&self) -> bool {
        self.terms().lennard_jones
    }

    fn terms(&self) -> Terms {
        let mut terms = Terms::default();
        self.collect_terms(&mut terms);
        terms
    }

    fn collect_terms(&self, terms: &mut Terms) {
        match self {
            ForceKind::LennardJones => terms.lennard_jones = true,
            ForceKind::Gravitational { g } => terms.gravitational.push(*g),
            ForceKind::Harmonic {
                stiffness,
                rest_length,
            } => terms.harmonic.push((*stiffness, *rest_length)),
            ForceKind::Combined { parts } => {
                for part in parts {
                    part.collect_terms(terms);
                }
            }
        }
    }
}

/// Flattened view of a [`ForceKind`].
#[derive(Debug, Clone, Default)]
struct Terms {
    lennard_jones: bool,
    gravitational: Vec<f64>,
    harmonic: Vec<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForceConfig {
    pub kind: ForceKind,
    /// Uniform gravity field along y.
    pub g_grav: f64,
    pub boundaries: BoundaryConditions,
    /// Reflecting walls only act along the first `dimensions` axes.
    pub dimensions: usize,
}

impl Default for ForceConfig {
    fn default() -> Self {
        ForceConfig {
            kind: ForceKind::default(),
            g_grav: 0.0,
            boundaries: BoundaryConditions::default(),
            dimensions: 3,
        }
    }
}

#[derive(Debug, Clone)]
struct Pull {
    ids: Vec<ParticleId>,
    force: Vector3<f64>,
}

type Contribution = (ParticleId, ParticleId, Vector3<f64>);

#[derive(Debug, Clone)]
pub struct ForceEvaluator {
    config: ForceConfig,
    terms: Terms,
    pulls: Vec<Pull>,
}

impl ForceEvaluator {
    pub fn new(config: ForceConfig) -> Self {
        let terms = config.kind.terms();
        ForceEvaluator {
            config,
            terms,
            pulls: Vec::new(),
        }
    }

    pub fn config(&self) -> &ForceConfig {
        &self.config
    }

    /// Add a constant external force to `ids` on every following step.
    pub fn add_pull(&mut self, ids: Vec<ParticleId>, force: Vector3<f64>) {
        debug!("pulling {} particles with {:?}", ids.len(), force.as_slice());
        self.pulls.push(Pull { ids, force });
    }

    pub fn clear_pulls(&mut self) {
        if !self.pulls.is_empty() {
            debug!("{} pull forces released", self.pulls.len());
            self.pulls.clear();
        }
    }

    pub fn is_pulling(&self) -> bool {
        !self.pulls.is_empty()
    }

    /// Recompute the force on every active particle.
    ///
    /// The previous force is kept in `previous_force`. Fails on coincident
    /// particles or when any resulting force is not finite.
    pub fn step<C: ParticleContainer + ?Sized>(&self, container: &mut C) -> Result<(), ForceError> {
        for id in container.active_ids() {
            container.particle_mut(id).begin_step(self.config.g_grav);
        }

        if self.terms.lennard_jones {
            let periodic = self.config.boundaries.periodic_flags();
            if let Some(lattice) = container.lattice().copied() {
                for combination in periodic_combinations(periodic) {
                    let pairs = container.pairs_periodic(combination);
                    let forces = periodic_lennard_jones(
                        container.particles(),
                        &pairs,
                        combination,
                        &lattice,
                        container.cutoff(),
                    )?;
                    accumulate(container, &forces);
                }
                self.reflecting_walls(container, &lattice);
            }

            let pairs = container.pairs();
            let forces = lennard_jones(container.particles(), &pairs, container.cutoff())?;
            accumulate(container, &forces);
        }

        for &(stiffness, rest_length) in &self.terms.harmonic {
            let forces = harmonic_bonds(container, stiffness, rest_length)?;
            accumulate(container, &forces);
        }

        if !self.terms.gravitational.is_empty() {
            let g: f64 = self.terms.gravitational.iter().sum();
            let pairs = container.all_pairs();
            let forces = gravity(container.particles(), &pairs, g)?;
            accumulate(container, &forces);
        }

        for pull in &self.pulls {
            for &id in &pull.ids {
                if container.is_active(id) {
                    container.particle_mut(id).add_force(&pull.force);
                }
            }
        }

        for id in container.active_ids() {
            if !container.particle(id).force.iter().all(|x| x.is_finite()) {
                return Err(ForceError::NonFiniteForce { particle: id });
            }
        }
        Ok(())
    }

    /// Repel boundary particles from reflecting faces with the force of a
    /// mirror image behind the wall. Only the repulsive part is applied.
    fn reflecting_walls<C: ParticleContainer + ?Sized>(
        &self,
        container: &mut C,
        lattice: &CellLattice,
    ) {
        let reflecting = self.config.boundaries.reflecting_flags();
        let dimensions = self.config.dimensions.min(3);
        if !(0..dimensions).any(|d| reflecting[2 * d] || reflecting[2 * d + 1]) {
            return;
        }

        for id in container.boundary_particles() {
            let particle = container.particle(id);
            let lj = LennardJones::new(particle.epsilon(), particle.sigma());
            let reach = lj.zero_force_distance();
            let mut correction = Vector3::zeros();

            for d in 0..dimensions {
                let threshold = lattice.cell_size[d].min(reach);
                let faces = [
                    (reflecting[2 * d], particle.position[d], 1.0),
                    (
                        reflecting[2 * d + 1],
                        lattice.domain_size[d] - particle.position[d],
                        -1.0,
                    ),
                ];
                for (is_reflecting, distance, inward) in faces {
                    // a particle on the face itself has no image to push against
                    if !is_reflecting || distance <= 0.0 || distance >= threshold {
                        continue;
                    }
                    let mut separation = Vector3::zeros();
                    separation[d] = 2.0 * distance * inward;
                    let push = lj.force(&separation, None)[d];
                    correction[d] += if inward > 0.0 { push.max(0.0) } else { push.min(0.0) };
                }
            }

            container.particle_mut(id).add_force(&correction);
        }
    }
}

/// Combinations of wrapped axes, all-false excluded, restricted to axes
/// that are periodic.
fn periodic_combinations(periodic: [bool; 3]) -> impl Iterator<Item = [bool; 3]> {
    (1u8..8)
        .map(|mask| [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0])
        .filter(move |c| (0..3).all(|d| !c[d] || periodic[d]))
}

/// Fold a raw separation onto the periodic images along the wrapped axes.
/// Axes of a single cell reach the partner through both faces at once and
/// yield two images each.
fn periodic_images(
    d: Vector3<f64>,
    combination: [bool; 3],
    lattice: &CellLattice,
) -> Vec<Vector3<f64>> {
    let mut images = vec![d];
    for k in (0..3).filter(|&k| combination[k]) {
        let length = lattice.domain_size[k];
        if lattice.cell_count[k] == 1 {
            images = images
                .into_iter()
                .flat_map(|v| {
                    let mut up = v;
                    let mut down = v;
                    up[k] += length;
                    down[k] -= length;
                    [up, down]
                })
                .collect();
        } else {
            for v in &mut images {
                v[k] -= length.copysign(v[k]);
            }
        }
    }
    images
}

fn separation(
    particles: &[Particle],
    i: ParticleId,
    j: ParticleId,
) -> Result<Vector3<f64>, ForceError> {
    let d = particles[i.index()].position - particles[j.index()].position;
    if d.norm_squared() == 0.0 {
        return Err(ForceError::CoincidentParticles { first: i, second: j });
    }
    Ok(d)
}

fn mixed(particles: &[Particle], i: ParticleId, j: ParticleId) -> LennardJones {
    let (a, b) = (&particles[i.index()], &particles[j.index()]);
    LennardJones::mixed(a.epsilon(), a.sigma(), b.epsilon(), b.sigma())
}

fn pair_forces<F>(pairs: &[Pair], force: F) -> Result<Vec<Contribution>, ForceError>
where
    F: Fn(ParticleId, ParticleId) -> Result<Vector3<f64>, ForceError> + Sync,
{
    pairs
        .par_iter()
        .map(|&(i, j)| force(i, j).map(|f| (i, j, f)))
        .collect()
}

fn accumulate<C: ParticleContainer + ?Sized>(container: &mut C, forces: &[Contribution]) {
    for (i, j, f) in forces {
        container.particle_mut(*i).add_force(f);
        container.particle_mut(*j).add_force(&-*f);
    }
}

fn lennard_jones(
    particles: &[Particle],
    pairs: &[Pair],
    cutoff: Option<f64>,
) -> Result<Vec<Contribution>, ForceError> {
    pair_forces(pairs, |i, j| {
        let d = separation(particles, i, j)?;
        Ok(mixed(particles, i, j).force(&d, cutoff))
    })
}

fn periodic_lennard_jones(
    particles: &[Particle],
    pairs: &[Pair],
    combination: [bool; 3],
    lattice: &CellLattice,
    cutoff: Option<f64>,
) -> Result<Vec<Contribution>, ForceError> {
    pair_forces(pairs, |i, j| {
        let raw = particles[i.index()].position - particles[j.index()].position;
        let lj = mixed(particles, i, j);
        let mut total = Vector3::zeros();
        for image in periodic_images(raw, combination, lattice) {
            if image.norm_squared() == 0.0 {
                return Err(ForceError::CoincidentParticles { first: i, second: j });
            }
            total += lj.force(&image, cutoff);
        }
        Ok(total)
    })
}

/// Spring forces along membrane bonds. Odd slots are the diagonal
/// neighbours and rest at `rest_length * sqrt(2)`.
fn harmonic_bonds<C: ParticleContainer + ?Sized>(
    container: &C,
    stiffness: f64,
    rest_length: f64,
) -> Result<Vec<Contribution>, ForceError> {
    let particles = container.particles();
    let mut forces = Vec::new();
    for i in container.active_ids() {
        let particle = &particles[i.index()];
        for (slot, bond) in particle.bonds().iter().enumerate() {
            let Some(j) = *bond else {
                continue;
            };
            if !container.is_active(j) {
                continue;
            }
            let r0 = if slot % 2 == 1 {
                rest_length * SQRT_2
            } else {
                rest_length
            };
            let d = -separation(particles, i, j)?;
            let norm = d.norm();
            forces.push((i, j, d * (stiffness * (norm - r0) / norm)));
        }
    }
    Ok(forces)
}

fn gravity(
    particles: &[Particle],
    pairs: &[Pair],
    g: f64,
) -> Result<Vec<Contribution>, ForceError> {
    pair_forces(pairs, |i, j| {
        let d = -separation(particles, i, j)?;
        let r = d.norm();
        let (mi, mj) = (particles[i.index()].mass(), particles[j.index()].mass());
        Ok(d * (g * mi * mj / (r * r * r)))
    })
}
