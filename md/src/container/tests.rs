use super::*;
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn at(x: f64, y: f64, z: f64) -> Particle {
    Particle::new(Vector3::new(x, y, z), Vector3::zeros(), 1.0)
}

fn normalized(pairs: &[Pair]) -> Vec<Pair> {
    let mut out: Vec<Pair> = pairs
        .iter()
        .map(|&(a, b)| if a < b { (a, b) } else { (b, a) })
        .collect();
    out.sort_unstable();
    out
}

fn brute_force<C: ParticleContainer>(container: &C, cutoff: f64) -> Vec<Pair> {
    let pairs: Vec<Pair> = container
        .all_pairs()
        .into_iter()
        .filter(|&(a, b)| {
            let d = container.particle(a).position - container.particle(b).position;
            d.norm_squared() < cutoff * cutoff
        })
        .collect();
    normalized(&pairs)
}

fn random_grid(seed: u64, domain: [f64; 3], cutoff: f64, n: usize) -> Grid {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut grid = Grid::new(domain, cutoff);
    for _ in 0..n {
        grid.insert(at(
            rng.gen_range(0.0..domain[0]),
            rng.gen_range(0.0..domain[1]),
            rng.gen_range(0.0..domain[2]),
        ));
    }
    grid
}

fn assert_no_duplicates(pairs: &[Pair]) {
    let unique: HashSet<Pair> = normalized(pairs).into_iter().collect();
    assert_eq!(unique.len(), pairs.len(), "duplicate pairs");
    assert!(pairs.iter().all(|(a, b)| a != b), "self pair");
}

#[test]
fn lattice_tiles_the_domain() {
    let lattice = CellLattice::new([10.0, 7.3, 0.5], 2.0);
    assert_eq!(lattice.cell_count, [5, 3, 1]);
    for d in 0..3 {
        let covered = lattice.cell_size[d] * lattice.cell_count[d] as f64;
        approx::assert_relative_eq!(covered, lattice.domain_size[d], epsilon = 1e-12);
    }
    for index in 0..lattice.total_cells() {
        assert_eq!(lattice.linear_index(lattice.coords(index)), index);
    }
}

#[test]
fn cell_lookup_rejects_outside_and_nan() {
    let lattice = CellLattice::new([10.0, 10.0, 10.0], 2.0);
    assert_eq!(lattice.cell_coords(&Vector3::new(9.999, 0.0, 4.0)), Some([4, 0, 2]));
    assert_eq!(lattice.cell_coords(&Vector3::new(10.0, 0.0, 4.0)), None);
    assert_eq!(lattice.cell_coords(&Vector3::new(-1e-300, 0.0, 4.0)), None);
    assert_eq!(lattice.cell_coords(&Vector3::new(f64::NAN, 0.0, 4.0)), None);
}

#[test]
fn grid_pairs_match_brute_force() {
    for (seed, domain, cutoff) in [
        (1, [10.0, 10.0, 10.0], 2.0),
        (2, [10.0, 6.0, 3.0], 1.5),
        (3, [7.0, 7.0, 1.0], 2.5),
        (4, [3.0, 3.0, 3.0], 1.0),
    ] {
        let grid = random_grid(seed, domain, cutoff, 300);
        let pairs = grid.pairs();
        assert_no_duplicates(&pairs);
        assert_eq!(normalized(&pairs), brute_force(&grid, cutoff), "seed {seed}");
    }
}

#[test]
fn single_cell_grid_matches_brute_force_and_fine_grid() {
    let coarse = random_grid(11, [10.0, 10.0, 10.0], 10.0, 200);
    let fine = random_grid(11, [10.0, 10.0, 10.0], 2.0, 200);
    assert_eq!(coarse.cell_count(), [1, 1, 1]);
    assert_eq!(fine.cell_count(), [5, 5, 5]);

    // the coarse grid filters at 10, narrow it down to the fine cutoff
    let short = |pairs: Vec<Pair>, grid: &Grid| -> Vec<Pair> {
        let kept: Vec<Pair> = pairs
            .into_iter()
            .filter(|&(a, b)| {
                (grid.particle(a).position - grid.particle(b).position).norm_squared() < 4.0
            })
            .collect();
        normalized(&kept)
    };
    let from_coarse = short(coarse.pairs(), &coarse);
    let from_fine = normalized(&fine.pairs());
    assert_eq!(from_coarse, from_fine);
    assert_eq!(from_fine, brute_force(&fine, 2.0));
    assert_eq!(normalized(&coarse.pairs()), brute_force(&coarse, 10.0));
}

#[test]
fn direct_sum_pairs_every_active_particle() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut ds = DirectSum::new();
    for _ in 0..40 {
        ds.insert(at(rng.gen(), rng.gen(), rng.gen()));
    }
    let pairs = ds.pairs();
    assert_no_duplicates(&pairs);
    assert_eq!(pairs.len(), 40 * 39 / 2);
    assert_eq!(normalized(&pairs), normalized(&ds.all_pairs()));
}

#[test]
fn relocation_keeps_every_particle_in_its_cell() {
    let mut rng = StdRng::seed_from_u64(9);
    let domain = [10.0, 8.0, 6.0];
    let mut grid = random_grid(9, domain, 2.0, 400);
    let ids: Vec<ParticleId> = grid.active_ids();

    let flag_sets = [
        ([false; 6], [false; 3]),
        ([true; 6], [false; 3]),
        ([false; 6], [true; 3]),
        ([true, false, false, true, true, false], [false, true, false]),
    ];
    for (outflow, periodic) in flag_sets {
        for &id in &ids {
            if !grid.is_active(id) {
                continue;
            }
            let shift = Vector3::new(
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
                rng.gen_range(-1.5..1.5),
            );
            grid.particle_mut(id).position += shift;
        }
        grid.relocate_all(outflow, periodic).unwrap();

        let mut seen = 0;
        for (cell, members) in (0..grid.lattice.total_cells()).map(|c| (c, grid.cell(c))) {
            for &id in members {
                assert_eq!(grid.lattice.cell_of(&grid.particle(id).position), Some(cell));
                assert_eq!(grid.cell_index_of(id), Some(cell));
                seen += 1;
            }
        }
        assert_eq!(seen + grid.halo().len(), grid.particles().len());
        for &id in grid.halo() {
            assert_eq!(grid.cell_index_of(id), None);
        }
    }
}

#[test]
fn interior_particles_ignore_boundary_flags() {
    let mut grid = Grid::new([10.0, 10.0, 10.0], 2.0);
    let ids: Vec<ParticleId> = [(3.0, 4.0, 5.0), (6.5, 2.5, 7.5), (5.0, 5.0, 5.0)]
        .iter()
        .map(|&(x, y, z)| grid.insert(at(x, y, z)))
        .collect();
    let before: Vec<Particle> = grid.particles().to_vec();

    for outflow in [[false; 6], [true; 6]] {
        for periodic in [[false; 3], [true; 3], [true, false, true]] {
            grid.relocate_all(outflow, periodic).unwrap();
            for &id in &ids {
                assert_eq!(grid.particle(id), &before[id.index()]);
                assert!(grid.is_active(id));
            }
        }
    }
}

#[test]
fn wrapped_pairs_only_cross_flagged_axes() {
    let mut grid = Grid::new([10.0, 10.0, 10.0], 2.0);
    let left = grid.insert(at(0.5, 5.0, 5.0));
    let right = grid.insert(at(9.5, 5.0, 5.0));
    let corner = grid.insert(at(9.5, 7.5, 5.0));
    let middle = grid.insert(at(5.0, 5.0, 5.0));

    let x_pairs = normalized(&grid.pairs_periodic([true, false, false]));
    assert!(x_pairs.contains(&(left, right)));
    // corner is one cell over in y without crossing it
    assert!(x_pairs.contains(&(left, corner)));
    assert!(x_pairs.iter().all(|&(a, b)| a != middle && b != middle));

    // nothing is adjacent through both the x and the y faces
    let xy_pairs = normalized(&grid.pairs_periodic([true, true, false]));
    assert!(xy_pairs.is_empty());

    assert!(grid.pairs_periodic([false, true, false]).is_empty());
    assert!(!grid.pairs().contains(&(left, right)));
}

#[test]
fn wrapped_pairs_are_unique_on_thin_axes() {
    for domain in [[2.0, 10.0, 10.0], [4.0, 3.0, 10.0], [1.0, 1.0, 1.0], [4.0, 4.0, 4.0]] {
        let grid = random_grid(21, domain, 2.0, 60);
        for mask in 1u8..8 {
            let flags = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0];
            let pairs = grid.pairs_periodic(flags);
            assert_no_duplicates(&pairs);
        }
    }
}

#[test]
fn wrapped_neighbours_sit_on_opposite_faces() {
    // three cells per axis: a wrapped neighbour is two cells away
    let grid = random_grid(33, [9.0, 9.0, 9.0], 3.0, 80);
    let mut total = 0;
    for mask in 1u8..8 {
        let flags = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0];
        for (a, b) in grid.pairs_periodic(flags) {
            let ca = grid.lattice.coords(grid.cell_index_of(a).unwrap());
            let cb = grid.lattice.coords(grid.cell_index_of(b).unwrap());
            for d in 0..3 {
                let gap = ca[d].abs_diff(cb[d]);
                if flags[d] {
                    assert_eq!(gap, 2, "axis {d} should wrap");
                } else {
                    assert!(gap <= 1);
                }
            }
            total += 1;
        }
    }
    assert!(total > 0);
}
