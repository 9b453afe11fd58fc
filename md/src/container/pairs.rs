//! Pair enumeration over the linked-cell grid.
//!
//! Plain pairs are found with the half-shell stencil: every cell is paired
//! with itself and with the 13 forward neighbours below, so each adjacent
//! cell pair is visited once across the grid. Pairs are kept when their
//! squared distance is below the squared cutoff.
//!
//! Periodic pairs are those whose cell adjacency wraps around exactly the
//! flagged axes. They are not distance-filtered; the force evaluator folds
//! their separation onto the periodic image and applies the cutoff there.
//! On axes with only one or two cells several stencil offsets can reach the
//! same neighbour cell, so wrapped adjacencies walk the full 26-cell stencil
//! and are emitted only from the lower cell index, once per neighbour cell.

use super::grid::Grid;
use super::Pair;
use crate::particle::ParticleId;
use rayon::prelude::*;

/// Half of the 26-cell neighbourhood; the other half is the mirror image.
pub const FORWARD_NEIGHBORS: [[isize; 3]; 13] = [
    [1, 0, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 1, 0],
    [1, -1, 0],
    [1, 0, 1],
    [1, 0, -1],
    [0, 1, 1],
    [0, 1, -1],
    [1, 1, 1],
    [1, 1, -1],
    [1, -1, 1],
    [1, -1, -1],
];

fn full_stencil() -> impl Iterator<Item = [isize; 3]> {
    (-1..=1isize).flat_map(|dz| {
        (-1..=1isize).flat_map(move |dy| {
            (-1..=1isize)
                .map(move |dx| [dx, dy, dz])
                .filter(|o| *o != [0, 0, 0])
        })
    })
}

impl Grid {
    pub(super) fn enumerate_pairs(&self, periodic: [bool; 3]) -> Vec<Pair> {
        let wrapped = periodic.iter().any(|&p| p);
        (0..self.cells.len())
            .into_par_iter()
            .filter(|&c| !self.cells[c].is_empty())
            .flat_map_iter(|c| {
                if wrapped {
                    self.wrapped_pairs_of(c, periodic)
                } else {
                    self.plain_pairs_of(c)
                }
            })
            .collect()
    }

    /// Index of the cell at `coords + offset`. Axes flagged in `periodic`
    /// wrap around, and the neighbour is returned only when the set of axes
    /// crossed is exactly the flagged set.
    fn neighbor_cell(
        &self,
        coords: [usize; 3],
        offset: [isize; 3],
        periodic: [bool; 3],
    ) -> Option<usize> {
        let mut neighbor = [0usize; 3];
        for d in 0..3 {
            let count = self.lattice.cell_count[d] as isize;
            let n = coords[d] as isize + offset[d];
            let crossed = n < 0 || n >= count;
            if crossed != periodic[d] {
                return None;
            }
            neighbor[d] = n.rem_euclid(count) as usize;
        }
        Some(self.lattice.linear_index(neighbor))
    }

    #[inline]
    fn within_cutoff(&self, a: ParticleId, b: ParticleId) -> bool {
        let pa = &self.particles[a.index()].position;
        let pb = &self.particles[b.index()].position;
        (pa - pb).norm_squared() < self.cutoff * self.cutoff
    }

    fn plain_pairs_of(&self, cell: usize) -> Vec<Pair> {
        let home = &self.cells[cell];
        let coords = self.lattice.coords(cell);
        let mut pairs = Vec::new();

        for (k, &a) in home.iter().enumerate() {
            for &b in &home[k + 1..] {
                if self.within_cutoff(a, b) {
                    pairs.push((a, b));
                }
            }
        }

        for offset in FORWARD_NEIGHBORS {
            let Some(other) = self.neighbor_cell(coords, offset, [false; 3]) else {
                continue;
            };
            for &a in home {
                for &b in &self.cells[other] {
                    if self.within_cutoff(a, b) {
                        pairs.push((a, b));
                    }
                }
            }
        }
        pairs
    }

    fn wrapped_pairs_of(&self, cell: usize, periodic: [bool; 3]) -> Vec<Pair> {
        let home = &self.cells[cell];
        let coords = self.lattice.coords(cell);
        let mut visited: Vec<usize> = Vec::new();
        let mut pairs = Vec::new();

        for offset in full_stencil() {
            let Some(other) = self.neighbor_cell(coords, offset, periodic) else {
                continue;
            };
            if other < cell || visited.contains(&other) {
                continue;
            }
            visited.push(other);

            if other == cell {
                // the cell meets its own image
                for (k, &a) in home.iter().enumerate() {
                    for &b in &home[k + 1..] {
                        pairs.push((a, b));
                    }
                }
            } else {
                for &a in home {
                    for &b in &self.cells[other] {
                        pairs.push((a, b));
                    }
                }
            }
        }
        pairs
    }
}
