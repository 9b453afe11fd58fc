//! All-pairs container without spatial decomposition.

use super::{CellLattice, Pair, ParticleContainer};
use crate::error::ForceError;
use crate::particle::{Particle, ParticleId};
use itertools::Itertools;
use tracing::{debug, info};

/// Keeps every particle in one list and pairs all of them.
///
/// An optional domain only matters for outflow faces: particles crossing
/// one are moved to the halo, as are particles inserted outside it. There
/// are no boundary cells and no periodic images.
#[derive(Debug, Clone, Default)]
pub struct DirectSum {
    particles: Vec<Particle>,
    active: Vec<bool>,
    halo: Vec<ParticleId>,
    domain_size: Option<[f64; 3]>,
    cutoff: Option<f64>,
}

impl DirectSum {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evict particles that leave `[0, domain_size)` through an outflow face.
    pub fn with_domain(mut self, domain_size: [f64; 3]) -> Self {
        self.domain_size = Some(domain_size);
        self
    }

    /// Ignore pairs beyond `cutoff` when computing short-range forces.
    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }
}

impl ParticleContainer for DirectSum {
    fn insert(&mut self, particle: Particle) -> ParticleId {
        let id = ParticleId(self.particles.len());
        let inside = self.domain_size.map_or(true, |domain| {
            (0..3).all(|d| (0.0..domain[d]).contains(&particle.position[d]))
        });
        if !inside {
            info!(
                "particle {} at {:?} is outside the domain, filed into the halo",
                id,
                particle.position.as_slice()
            );
            self.halo.push(id);
        }
        self.particles.push(particle);
        self.active.push(inside);
        id
    }

    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    fn active_ids(&self) -> Vec<ParticleId> {
        self.active
            .iter()
            .enumerate()
            .filter(|(_, &a)| a)
            .map(|(i, _)| ParticleId(i))
            .collect()
    }

    fn is_active(&self, id: ParticleId) -> bool {
        self.active[id.index()]
    }

    fn halo(&self) -> &[ParticleId] {
        &self.halo
    }

    fn relocate_all(
        &mut self,
        outflow: [bool; 6],
        _periodic: [bool; 3],
    ) -> Result<(), ForceError> {
        let Some(domain) = self.domain_size else {
            return Ok(());
        };
        for (i, particle) in self.particles.iter_mut().enumerate() {
            if !self.active[i] {
                continue;
            }
            let leaves = (0..3).any(|d| {
                let x = particle.position[d];
                (outflow[2 * d] && x < 0.0) || (outflow[2 * d + 1] && x >= domain[d])
            });
            if leaves {
                debug!("particle #{} left the domain", i);
                particle.clear_forces();
                self.active[i] = false;
                self.halo.push(ParticleId(i));
            }
        }
        Ok(())
    }

    fn pairs(&self) -> Vec<Pair> {
        self.all_pairs()
    }

    fn pairs_periodic(&self, periodic: [bool; 3]) -> Vec<Pair> {
        if periodic.iter().any(|&p| p) {
            Vec::new()
        } else {
            self.all_pairs()
        }
    }

    fn boundary_particles(&self) -> Vec<ParticleId> {
        Vec::new()
    }

    fn lattice(&self) -> Option<&CellLattice> {
        None
    }

    fn cutoff(&self) -> Option<f64> {
        self.cutoff
    }

    fn all_pairs(&self) -> Vec<Pair> {
        self.active_ids().into_iter().tuple_combinations().collect()
    }
}
