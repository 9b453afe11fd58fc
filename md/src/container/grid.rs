//! Linked-cell container.

use super::{CellLattice, Pair, ParticleContainer};
use crate::error::ForceError;
use crate::particle::{Particle, ParticleId};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Membership {
    Cell(usize),
    Halo,
}

/// Linked-cell grid over the domain `[0, domain_size)`.
///
/// Every particle is either listed in exactly one cell, the one computed from
/// its current position, or in the halo.
#[derive(Debug, Clone)]
pub struct Grid {
    pub(super) lattice: CellLattice,
    pub(super) cutoff: f64,
    pub(super) particles: Vec<Particle>,
    pub(super) cells: Vec<Vec<ParticleId>>,
    pub(super) membership: Vec<Membership>,
    halo: Vec<ParticleId>,
}

impl Grid {
    /// Build an empty grid.
    ///
    /// # Panics
    ///
    /// If any domain extent or the cutoff is not positive.
    pub fn new(domain_size: [f64; 3], cutoff: f64) -> Self {
        let lattice = CellLattice::new(domain_size, cutoff);
        debug!(
            "linked-cell grid: domain {:?}, {:?} cells of size {:?}",
            lattice.domain_size, lattice.cell_count, lattice.cell_size
        );
        Grid {
            cells: vec![Vec::new(); lattice.total_cells()],
            lattice,
            cutoff,
            particles: Vec::new(),
            membership: Vec::new(),
            halo: Vec::new(),
        }
    }

    pub fn domain_size(&self) -> [f64; 3] {
        self.lattice.domain_size
    }

    pub fn cell_count(&self) -> [usize; 3] {
        self.lattice.cell_count
    }

    pub fn cell_size(&self) -> [f64; 3] {
        self.lattice.cell_size
    }

    /// Ids listed in one cell.
    pub fn cell(&self, index: usize) -> &[ParticleId] {
        &self.cells[index]
    }

    /// Index of the cell currently holding `id`, `None` for halo particles.
    pub fn cell_index_of(&self, id: ParticleId) -> Option<usize> {
        match self.membership[id.index()] {
            Membership::Cell(c) => Some(c),
            Membership::Halo => None,
        }
    }
}

/// Where a particle ends up after its boundary policy has been applied.
enum Destination {
    Inside,
    Halo,
}

/// Apply the per-axis boundary policy to one particle, in place.
///
/// Periodic axes are checked first and win over whatever the face flags say.
fn apply_boundaries(
    particle: &mut Particle,
    domain_size: &[f64; 3],
    outflow: &[bool; 6],
    periodic: &[bool; 3],
) -> Destination {
    for d in 0..3 {
        let length = domain_size[d];
        let x = particle.position[d];
        if periodic[d] {
            particle.position[d] = wrap(x, length);
        } else if x < 0.0 {
            if outflow[2 * d] {
                return Destination::Halo;
            }
            particle.position[d] = -x;
            particle.velocity[d] = -particle.velocity[d];
        } else if x >= length {
            if outflow[2 * d + 1] {
                return Destination::Halo;
            }
            let reflected = 2.0 * length - x;
            // a particle sitting exactly on the face would land on it again
            particle.position[d] = if reflected >= length {
                next_down(length)
            } else {
                reflected
            };
            particle.velocity[d] = -particle.velocity[d];
        }
    }
    Destination::Inside
}

/// Fold `x` into `[0, length)`.
fn wrap(x: f64, length: f64) -> f64 {
    let wrapped = x.rem_euclid(length);
    // rem_euclid may round up to `length` for tiny negative inputs
    if wrapped >= length {
        0.0
    } else {
        wrapped
    }
}

/// Largest float below a positive finite `x`.
fn next_down(x: f64) -> f64 {
    debug_assert!(x > 0.0 && x.is_finite());
    f64::from_bits(x.to_bits() - 1)
}

impl ParticleContainer for Grid {
    fn insert(&mut self, particle: Particle) -> ParticleId {
        let id = ParticleId(self.particles.len());
        match self.lattice.cell_of(&particle.position) {
            Some(cell) => {
                self.cells[cell].push(id);
                self.membership.push(Membership::Cell(cell));
            }
            None => {
                info!(
                    "particle {} at {:?} is outside the domain, filed into the halo",
                    id,
                    particle.position.as_slice()
                );
                self.halo.push(id);
                self.membership.push(Membership::Halo);
            }
        }
        self.particles.push(particle);
        id
    }

    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    fn active_ids(&self) -> Vec<ParticleId> {
        self.cells.iter().flatten().copied().collect()
    }

    fn is_active(&self, id: ParticleId) -> bool {
        matches!(self.membership[id.index()], Membership::Cell(_))
    }

    fn halo(&self) -> &[ParticleId] {
        &self.halo
    }

    fn relocate_all(
        &mut self,
        outflow: [bool; 6],
        periodic: [bool; 3],
    ) -> Result<(), ForceError> {
        // Pass 1: move particles by their boundary policy and record every
        // particle whose cell changes. Cell lists are only read here.
        let mut moves: Vec<(ParticleId, usize, Membership)> = Vec::new();
        let mut escaped: Vec<ParticleId> = Vec::new();
        for (cell, ids) in self.cells.iter().enumerate() {
            for &id in ids {
                let particle = &mut self.particles[id.index()];
                let target = match apply_boundaries(
                    particle,
                    &self.lattice.domain_size,
                    &outflow,
                    &periodic,
                ) {
                    Destination::Halo => Membership::Halo,
                    Destination::Inside => match self.lattice.cell_of(&particle.position) {
                        Some(c) => Membership::Cell(c),
                        None => {
                            escaped.push(id);
                            continue;
                        }
                    },
                };
                if target != Membership::Cell(cell) {
                    moves.push((id, cell, target));
                }
            }
        }

        if let Some(&id) = escaped.first() {
            let position = self.particles[id.index()].position;
            warn!(
                "{} particles overshot a reflecting wall, first is {} at {:?}",
                escaped.len(),
                id,
                position.as_slice()
            );
            return Err(ForceError::EscapedParticle {
                particle: id,
                position: [position.x, position.y, position.z],
            });
        }

        if moves.is_empty() {
            return Ok(());
        }

        // Pass 2: apply the worklist.
        let mut emptied: Vec<usize> = moves.iter().map(|&(_, from, _)| from).collect();
        emptied.sort_unstable();
        emptied.dedup();

        for &(id, _, target) in &moves {
            self.membership[id.index()] = target;
        }
        for from in emptied {
            let membership = &self.membership;
            self.cells[from].retain(|id| membership[id.index()] == Membership::Cell(from));
        }
        for (id, _, target) in moves {
            match target {
                Membership::Cell(c) => self.cells[c].push(id),
                Membership::Halo => {
                    debug!("particle {} left the domain", id);
                    self.particles[id.index()].clear_forces();
                    self.halo.push(id);
                }
            }
        }
        Ok(())
    }

    fn pairs_periodic(&self, periodic: [bool; 3]) -> Vec<Pair> {
        self.enumerate_pairs(periodic)
    }

    fn boundary_particles(&self) -> Vec<ParticleId> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(c, _)| self.lattice.is_boundary_cell(self.lattice.coords(*c)))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    fn lattice(&self) -> Option<&CellLattice> {
        Some(&self.lattice)
    }

    fn cutoff(&self) -> Option<f64> {
        Some(self.cutoff)
    }
}
