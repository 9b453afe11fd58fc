//! Particle containers.
//!
//! A container owns every particle in an arena and hands out [`ParticleId`]s.
//! Pair enumeration and boundary queries are part of the container interface
//! itself, so force code never needs to know which container it was given:
//! the linked-cell [`Grid`] answers them from its cell decomposition, while
//! [`DirectSum`] pairs everything and has no boundary cells.

mod direct_sum;
mod grid;
mod pairs;

pub use direct_sum::DirectSum;
pub use grid::Grid;
pub use pairs::FORWARD_NEIGHBORS;

use crate::error::ForceError;
use crate::particle::{Particle, ParticleId};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

pub type Pair = (ParticleId, ParticleId);

/// Which container the simulation builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    #[default]
    LinkedCells,
    DirectSum,
}

/// Regular decomposition of the domain `[0, domain_size)` into cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellLattice {
    pub domain_size: [f64; 3],
    pub cell_count: [usize; 3],
    pub cell_size: [f64; 3],
}

impl CellLattice {
    /// `cell_count[d] = max(1, floor(domain_size[d] / cutoff))`, and the
    /// cells exactly tile the domain.
    pub fn new(domain_size: [f64; 3], cutoff: f64) -> Self {
        assert!(
            domain_size.iter().all(|&l| l > 0.0),
            "domain size must be positive, got {domain_size:?}"
        );
        assert!(cutoff > 0.0, "cutoff radius must be positive, got {cutoff}");

        let cell_count = domain_size.map(|l| ((l / cutoff).floor() as usize).max(1));
        let cell_size = [0, 1, 2].map(|d| domain_size[d] / cell_count[d] as f64);
        CellLattice {
            domain_size,
            cell_count,
            cell_size,
        }
    }

    #[inline]
    pub fn total_cells(&self) -> usize {
        self.cell_count.iter().product()
    }

    #[inline]
    pub fn linear_index(&self, coords: [usize; 3]) -> usize {
        coords[0] + self.cell_count[0] * (coords[1] + self.cell_count[1] * coords[2])
    }

    #[inline]
    pub fn coords(&self, index: usize) -> [usize; 3] {
        let [nx, ny, _] = self.cell_count;
        [index % nx, (index / nx) % ny, index / (nx * ny)]
    }

    /// Cell coordinates of a position, or `None` outside `[0, domain_size)`.
    pub fn cell_coords(&self, position: &nalgebra::Vector3<f64>) -> Option<[usize; 3]> {
        let mut coords = [0usize; 3];
        for d in 0..3 {
            let x = position[d];
            // written this way so NaN lands outside as well
            if !(x >= 0.0 && x < self.domain_size[d]) {
                return None;
            }
            let c = (x / self.cell_size[d]).floor() as usize;
            coords[d] = c.min(self.cell_count[d] - 1);
        }
        Some(coords)
    }

    pub fn cell_of(&self, position: &nalgebra::Vector3<f64>) -> Option<usize> {
        self.cell_coords(position).map(|c| self.linear_index(c))
    }

    /// True for cells touching at least one face of the domain.
    pub fn is_boundary_cell(&self, coords: [usize; 3]) -> bool {
        (0..3).any(|d| coords[d] == 0 || coords[d] + 1 == self.cell_count[d])
    }
}

pub trait ParticleContainer {
    /// Take ownership of a particle. Particles outside the domain go straight
    /// to the halo.
    fn insert(&mut self, particle: Particle) -> ParticleId;

    /// The whole arena, halo particles included, indexed by `ParticleId`.
    fn particles(&self) -> &[Particle];

    fn particles_mut(&mut self) -> &mut [Particle];

    fn particle(&self, id: ParticleId) -> &Particle {
        &self.particles()[id.index()]
    }

    fn particle_mut(&mut self, id: ParticleId) -> &mut Particle {
        &mut self.particles_mut()[id.index()]
    }

    /// Ids of every particle that still takes part in the simulation.
    fn active_ids(&self) -> Vec<ParticleId>;

    fn is_active(&self, id: ParticleId) -> bool;

    /// Number of active particles.
    fn len(&self) -> usize {
        self.particles().len() - self.halo().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Particles that have left the domain through an outflow face.
    fn halo(&self) -> &[ParticleId];

    /// Apply boundary policies after a position update and restore the
    /// container's internal invariants.
    ///
    /// Only particles crossing an outflow face end up in the halo. A particle
    /// that cannot be placed inside the domain otherwise is an error and
    /// leaves the cell lists untouched.
    fn relocate_all(&mut self, outflow: [bool; 6], periodic: [bool; 3]) -> Result<(), ForceError>;

    /// Candidate pairs that do not cross a periodic boundary.
    fn pairs(&self) -> Vec<Pair> {
        self.pairs_periodic([false; 3])
    }

    /// Candidate pairs whose cell adjacency wraps around exactly the axes
    /// flagged in `periodic`.
    fn pairs_periodic(&self, periodic: [bool; 3]) -> Vec<Pair>;

    /// Particles in cells adjacent to a domain face.
    fn boundary_particles(&self) -> Vec<ParticleId>;

    /// Cell decomposition, if the container has one.
    fn lattice(&self) -> Option<&CellLattice>;

    /// Interaction cutoff used to filter plain pairs, if any.
    fn cutoff(&self) -> Option<f64>;

    /// Every unordered pair of active particles, regardless of distance.
    fn all_pairs(&self) -> Vec<Pair> {
        self.active_ids().into_iter().tuple_combinations().collect()
    }
}

#[cfg(test)]
mod tests;
