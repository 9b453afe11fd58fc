//! Lattice particle generators.

use crate::container::ParticleContainer;
use crate::error::ConfigError;
use crate::particle::{Particle, ParticleId, BOND_SLOTS};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use tracing::debug;

fn default_lj() -> f64 {
    1.0
}

/// Rectangular block of particles on a simple cubic lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cuboid {
    /// Position of the lattice point (0, 0, 0).
    pub origin: [f64; 3],
    /// Lattice points along x, y and z.
    pub counts: [usize; 3],
    pub spacing: f64,
    pub mass: f64,
    #[serde(default)]
    pub velocity: [f64; 3],
    #[serde(default = "default_lj")]
    pub epsilon: f64,
    #[serde(default = "default_lj")]
    pub sigma: f64,
    #[serde(default)]
    pub type_id: i32,
    #[serde(default)]
    pub immovable: bool,
}

impl Cuboid {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_lattice(self.spacing, self.mass, self.epsilon, self.sigma)
    }

    pub fn len(&self) -> usize {
        self.counts.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lattice point `[x, y, z]` is returned at index `x + nx * (y + ny * z)`.
    pub fn particles(&self) -> Vec<Particle> {
        let [nx, ny, nz] = self.counts;
        let origin = Vector3::from(self.origin);
        let mut out = Vec::with_capacity(self.len());
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let offset = Vector3::new(x as f64, y as f64, z as f64) * self.spacing;
                    out.push(self.particle_at(origin + offset));
                }
            }
        }
        out
    }

    fn particle_at(&self, position: Vector3<f64>) -> Particle {
        let p = Particle::new(position, Vector3::from(self.velocity), self.mass)
            .with_lennard_jones(self.epsilon, self.sigma)
            .with_type(self.type_id);
        if self.immovable {
            p.immovable()
        } else {
            p
        }
    }
}

/// Flat disc of particles in the x-y plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disc {
    pub center: [f64; 3],
    #[serde(default)]
    pub velocity: [f64; 3],
    /// Radius in lattice units.
    pub radius: usize,
    pub spacing: f64,
    pub mass: f64,
    #[serde(default = "default_lj")]
    pub epsilon: f64,
    #[serde(default = "default_lj")]
    pub sigma: f64,
    #[serde(default)]
    pub type_id: i32,
}

impl Disc {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_lattice(self.spacing, self.mass, self.epsilon, self.sigma)
    }

    /// Every square-lattice point within `radius` lattice units of the center.
    pub fn particles(&self) -> Vec<Particle> {
        let r = self.radius as i64;
        let center = Vector3::from(self.center);
        let mut out = Vec::new();
        for j in -r..=r {
            for i in -r..=r {
                if i * i + j * j > r * r {
                    continue;
                }
                let position = center + Vector3::new(i as f64, j as f64, 0.0) * self.spacing;
                out.push(
                    Particle::new(position, Vector3::from(self.velocity), self.mass)
                        .with_lennard_jones(self.epsilon, self.sigma)
                        .with_type(self.type_id),
                );
            }
        }
        out
    }
}

/// Constant force on selected membrane particles, applied while the
/// simulation time is below `until`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullConfig {
    /// Lattice coordinates `[x, y]` of the pulled particles.
    pub targets: Vec<[usize; 2]>,
    pub force: [f64; 3],
    pub until: f64,
}

/// Single-layer cuboid whose lattice neighbours are joined by springs.
/// Spring constants come from the harmonic force kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membrane {
    #[serde(flatten)]
    pub lattice: Cuboid,
    #[serde(default)]
    pub pull: Option<PullConfig>,
}

impl Membrane {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.lattice.validate()?;
        if self.lattice.counts[2] != 1 {
            return Err(ConfigError::InvalidParameter(format!(
                "a membrane is one particle thick, got {} layers",
                self.lattice.counts[2]
            )));
        }
        if let Some(pull) = &self.pull {
            let [nx, ny, _] = self.lattice.counts;
            if let Some(t) = pull.targets.iter().find(|t| t[0] >= nx || t[1] >= ny) {
                return Err(ConfigError::InvalidParameter(format!(
                    "pull target {t:?} is outside the {nx}x{ny} membrane"
                )));
            }
        }
        Ok(())
    }
}

/// Ids of an inserted membrane.
#[derive(Debug, Clone, PartialEq)]
pub struct MembraneIds {
    /// In lattice order, `x + nx * y`.
    pub particles: Vec<ParticleId>,
    /// Resolved pull targets.
    pub pulled: Vec<ParticleId>,
}

/// Insert every particle and return the ids in insertion order.
pub fn insert_all<C: ParticleContainer + ?Sized>(
    container: &mut C,
    particles: Vec<Particle>,
) -> Vec<ParticleId> {
    particles.into_iter().map(|p| container.insert(p)).collect()
}

/// Insert a membrane and bond every particle to its lattice neighbours.
///
/// Bond slots point to `(x+1, y)`, `(x+1, y+1)`, `(x, y+1)` and
/// `(x-1, y+1)`, so every bond is stored once. Odd slots are diagonals.
pub fn insert_membrane<C: ParticleContainer + ?Sized>(
    container: &mut C,
    membrane: &Membrane,
) -> Result<MembraneIds, ConfigError> {
    membrane.validate()?;
    let [nx, ny, _] = membrane.lattice.counts;
    let ids = insert_all(container, membrane.lattice.particles());
    let at = |x: usize, y: usize| ids[x + nx * y];

    for y in 0..ny {
        for x in 0..nx {
            let right = x + 1 < nx;
            let up = y + 1 < ny;
            let bonds: [Option<ParticleId>; BOND_SLOTS] = [
                right.then(|| at(x + 1, y)),
                (right && up).then(|| at(x + 1, y + 1)),
                up.then(|| at(x, y + 1)),
                (x > 0 && up).then(|| at(x - 1, y + 1)),
            ];
            container.particle_mut(at(x, y)).set_bonds(bonds);
        }
    }

    let pulled: Vec<ParticleId> = membrane
        .pull
        .as_ref()
        .map(|pull| pull.targets.iter().map(|t| at(t[0], t[1])).collect())
        .unwrap_or_default();
    debug!("membrane of {}x{} particles inserted", nx, ny);
    Ok(MembraneIds {
        particles: ids,
        pulled,
    })
}

fn check_lattice(spacing: f64, mass: f64, epsilon: f64, sigma: f64) -> Result<(), ConfigError> {
    if !(spacing > 0.0) {
        return Err(ConfigError::InvalidParameter(format!(
            "lattice spacing must be positive, got {spacing}"
        )));
    }
    if !(mass > 0.0) {
        return Err(ConfigError::InvalidParameter(format!(
            "particle mass must be positive, got {mass}"
        )));
    }
    if !(epsilon >= 0.0) || !(sigma > 0.0) {
        return Err(ConfigError::InvalidParameter(format!(
            "invalid Lennard-Jones parameters epsilon = {epsilon}, sigma = {sigma}"
        )));
    }
    Ok(())
}
