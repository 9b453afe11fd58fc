use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bond slots carried by a membrane particle.
pub const BOND_SLOTS: usize = 4;

/// Stable index of a particle in the arena owned by its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleId(pub usize);

impl ParticleId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point particle.
///
/// Mass, Lennard-Jones parameters, type and the immovable flag are fixed once
/// the particle is built. Bonds are set at most once, by the membrane builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub force: Vector3<f64>,
    pub previous_force: Vector3<f64>,
    mass: f64,
    epsilon: f64,
    sigma: f64,
    #[serde(default)]
    type_id: i32,
    #[serde(default)]
    immovable: bool,
    #[serde(skip)]
    bonds: [Option<ParticleId>; BOND_SLOTS],
}

impl Particle {
    /// Create a particle with unit Lennard-Jones parameters and type 0.
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>, mass: f64) -> Self {
        assert!(mass > 0.0, "particle mass must be positive, got {mass}");
        Particle {
            position,
            velocity,
            force: Vector3::zeros(),
            previous_force: Vector3::zeros(),
            mass,
            epsilon: 1.0,
            sigma: 1.0,
            type_id: 0,
            immovable: false,
            bonds: [None; BOND_SLOTS],
        }
    }

    pub fn with_lennard_jones(mut self, epsilon: f64, sigma: f64) -> Self {
        self.epsilon = epsilon;
        self.sigma = sigma;
        self
    }

    pub fn with_type(mut self, type_id: i32) -> Self {
        self.type_id = type_id;
        self
    }

    /// Mark the particle as a fixed wall particle. Its forces stay zero.
    pub fn immovable(mut self) -> Self {
        self.immovable = true;
        self.force = Vector3::zeros();
        self.previous_force = Vector3::zeros();
        self
    }

    #[inline]
    pub fn mass(&self) -> f64 {
        self.mass
    }

    #[inline]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    #[inline]
    pub fn type_id(&self) -> i32 {
        self.type_id
    }

    #[inline]
    pub fn is_immovable(&self) -> bool {
        self.immovable
    }

    pub fn bonds(&self) -> &[Option<ParticleId>; BOND_SLOTS] {
        &self.bonds
    }

    pub fn has_bonds(&self) -> bool {
        self.bonds.iter().any(Option::is_some)
    }

    pub(crate) fn set_bonds(&mut self, bonds: [Option<ParticleId>; BOND_SLOTS]) {
        debug_assert!(!self.has_bonds(), "bonds are established only once");
        self.bonds = bonds;
    }

    /// Add to the force accumulator. No-op for immovable particles.
    #[inline]
    pub fn add_force(&mut self, f: &Vector3<f64>) {
        if !self.immovable {
            self.force += f;
        }
    }

    /// Start a new force evaluation: keep the old force and seed the
    /// accumulator with the uniform gravity field along y.
    pub fn begin_step(&mut self, g_grav: f64) {
        if self.immovable {
            return;
        }
        self.previous_force = self.force;
        self.force = Vector3::new(0.0, self.mass * g_grav, 0.0);
    }

    pub(crate) fn clear_forces(&mut self) {
        self.force = Vector3::zeros();
        self.previous_force = Vector3::zeros();
    }

    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_step_keeps_old_force_and_applies_gravity() {
        let mut p = Particle::new(Vector3::zeros(), Vector3::zeros(), 2.0);
        p.force = Vector3::new(1.0, 2.0, 3.0);
        p.begin_step(-9.0);
        assert_eq!(p.previous_force, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(p.force, Vector3::new(0.0, -18.0, 0.0));
    }

    #[test]
    fn immovable_particle_ignores_forces() {
        let mut wall = Particle::new(Vector3::zeros(), Vector3::zeros(), 1.0).immovable();
        wall.add_force(&Vector3::new(5.0, 0.0, 0.0));
        wall.begin_step(-12.44);
        assert_eq!(wall.force, Vector3::zeros());
        assert_eq!(wall.previous_force, Vector3::zeros());
    }

    #[test]
    #[should_panic]
    fn zero_mass_is_rejected() {
        Particle::new(Vector3::zeros(), Vector3::zeros(), 0.0);
    }

    #[test]
    fn bonds_are_not_serialized() {
        let mut p = Particle::new(Vector3::new(1.0, 2.0, 3.0), Vector3::zeros(), 1.0)
            .with_lennard_jones(5.0, 1.1)
            .with_type(3);
        p.set_bonds([Some(ParticleId(1)), None, None, None]);
        let yaml = serde_yml::to_string(&p).unwrap();
        let back: Particle = serde_yml::from_str(&yaml).unwrap();
        assert_eq!(back.position, p.position);
        assert_eq!(back.epsilon(), 5.0);
        assert_eq!(back.type_id(), 3);
        assert!(!back.has_bonds());
    }
}
