use crate::container::ParticleContainer;
use crate::error::ForceError;
use crate::forces::ForceEvaluator;

pub trait Integrator {
    /// Advance the system by dt. Fails when forces break down or a particle
    /// cannot be kept inside the domain.
    fn step<C: ParticleContainer + ?Sized>(
        &mut self,
        container: &mut C,
        dt: f64,
    ) -> Result<(), ForceError>;
}

/// Velocity Störmer-Verlet.
///
/// Positions are advanced with the current force, the container relocates
/// particles under its boundary policy, forces are recomputed, and the
/// velocities are advanced with the mean of old and new force.
#[derive(Debug, Clone)]
pub struct StormerVerlet {
    evaluator: ForceEvaluator,
    outflow: [bool; 6],
    periodic: [bool; 3],
}

impl StormerVerlet {
    pub fn new(evaluator: ForceEvaluator) -> Self {
        let boundaries = evaluator.config().boundaries;
        StormerVerlet {
            outflow: boundaries.outflow_flags(),
            periodic: boundaries.periodic_flags(),
            evaluator,
        }
    }

    pub fn evaluator(&self) -> &ForceEvaluator {
        &self.evaluator
    }

    pub fn evaluator_mut(&mut self) -> &mut ForceEvaluator {
        &mut self.evaluator
    }
}

/// `x += dt * v + dt^2 * F / (2m)` for every active, movable particle.
pub fn update_positions<C: ParticleContainer + ?Sized>(container: &mut C, dt: f64) {
    for id in container.active_ids() {
        let p = container.particle_mut(id);
        if p.is_immovable() {
            continue;
        }
        let inv_2m = 0.5 / p.mass();
        p.position += p.velocity * dt + p.force * (dt * dt * inv_2m);
    }
}

/// `v += dt * (F + F_old) / (2m)` for every active, movable particle.
pub fn update_velocities<C: ParticleContainer + ?Sized>(container: &mut C, dt: f64) {
    for id in container.active_ids() {
        let p = container.particle_mut(id);
        if p.is_immovable() {
            continue;
        }
        let inv_2m = 0.5 / p.mass();
        p.velocity += (p.force + p.previous_force) * (dt * inv_2m);
    }
}

impl Integrator for StormerVerlet {
    fn step<C: ParticleContainer + ?Sized>(
        &mut self,
        container: &mut C,
        dt: f64,
    ) -> Result<(), ForceError> {
        update_positions(container, dt);
        container.relocate_all(self.outflow, self.periodic)?;
        self.evaluator.step(container)?;
        update_velocities(container, dt);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{Boundary, BoundaryConditions};
    use crate::container::{DirectSum, Grid};
    use crate::forces::{ForceConfig, ForceKind};
    use crate::particle::Particle;
    use approx::*;
    use nalgebra::Vector3;

    fn verlet(kind: ForceKind, g_grav: f64, boundaries: BoundaryConditions) -> StormerVerlet {
        StormerVerlet::new(ForceEvaluator::new(ForceConfig {
            kind,
            g_grav,
            boundaries,
            ..ForceConfig::default()
        }))
    }

    #[test]
    fn free_fall_is_exact() {
        // constant force: Verlet integrates a parabola without error
        let mut ds = DirectSum::new();
        let id = ds.insert(Particle::new(
            Vector3::zeros(),
            Vector3::new(1.0, 0.0, 0.0),
            2.0,
        ));
        let mut integrator = verlet(ForceKind::LennardJones, -10.0, BoundaryConditions::default());
        integrator.evaluator().step(&mut ds).unwrap();

        let dt = 0.01;
        for _ in 0..100 {
            integrator.step(&mut ds, dt).unwrap();
        }
        let p = ds.particle(id);
        assert_relative_eq!(p.position.x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(p.position.y, -5.0, epsilon = 1e-10);
        assert_relative_eq!(p.velocity.y, -10.0, epsilon = 1e-10);
    }

    #[test]
    fn immovable_particles_stay_put() {
        let mut ds = DirectSum::new();
        let wall = ds.insert(
            Particle::new(Vector3::zeros(), Vector3::new(1.0, 1.0, 1.0), 1.0).immovable(),
        );
        let free = ds.insert(Particle::new(Vector3::new(1.1, 0.0, 0.0), Vector3::zeros(), 1.0));
        let mut integrator = verlet(ForceKind::LennardJones, -1.0, BoundaryConditions::default());
        integrator.evaluator().step(&mut ds).unwrap();
        for _ in 0..10 {
            integrator.step(&mut ds, 0.001).unwrap();
        }
        assert_eq!(ds.particle(wall).position, Vector3::zeros());
        assert!(ds.particle(free).position.x > 1.1);
    }

    #[test]
    fn two_body_orbit_conserves_momentum() {
        let mut ds = DirectSum::new();
        ds.insert(Particle::new(Vector3::zeros(), Vector3::zeros(), 1.0));
        ds.insert(Particle::new(
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            3.0e-6,
        ));
        let mut integrator = verlet(
            ForceKind::Gravitational { g: 1.0 },
            0.0,
            BoundaryConditions::default(),
        );
        integrator.evaluator().step(&mut ds).unwrap();

        let momentum = |ds: &DirectSum| -> Vector3<f64> {
            ds.particles().iter().map(|p| p.velocity * p.mass()).sum()
        };
        let start = momentum(&ds);
        for _ in 0..1000 {
            integrator.step(&mut ds, 0.001).unwrap();
        }
        assert_abs_diff_eq!(momentum(&ds), start, epsilon = 1e-12);
        // near-circular orbit keeps its radius
        let r = (ds.particles()[1].position - ds.particles()[0].position).norm();
        assert_relative_eq!(r, 1.0, epsilon = 1e-3);
    }

    #[test]
    fn outflow_particle_leaves_during_step() {
        let mut grid = Grid::new([10.0, 10.0, 10.0], 2.0);
        let id = grid.insert(Particle::new(
            Vector3::new(9.95, 5.0, 5.0),
            Vector3::new(10.0, 0.0, 0.0),
            1.0,
        ));
        let mut integrator = verlet(
            ForceKind::LennardJones,
            0.0,
            BoundaryConditions::uniform(Boundary::Outflow),
        );
        integrator.step(&mut grid, 0.01).unwrap();
        assert_eq!(grid.halo(), &[id]);
        assert_eq!(grid.particle(id).force, Vector3::zeros());
    }

    #[test]
    fn particle_thrown_through_reflecting_walls_stops_the_step() {
        let mut grid = Grid::new([10.0, 10.0, 10.0], 2.5);
        let id = grid.insert(Particle::new(
            Vector3::new(9.9, 5.0, 5.0),
            Vector3::new(10.1, 0.0, 0.0),
            1.0,
        ));
        let mut integrator = verlet(ForceKind::LennardJones, 0.0, BoundaryConditions::default());
        integrator.evaluator().step(&mut grid).unwrap();
        // the wall image 0.2 away pushes the particle millions of units back
        assert!(grid.particle(id).force.x < -1.0e10);

        let err = integrator.step(&mut grid, 0.01).unwrap_err();
        assert!(matches!(err, ForceError::EscapedParticle { particle, .. } if particle == id));
        assert!(grid.halo().is_empty());
    }
}
