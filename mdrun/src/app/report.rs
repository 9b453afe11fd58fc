use md::{MdConfig, RunSummary, Simulation};
use nalgebra::Vector3;
use tracing::info;

pub fn report_setup(config: &MdConfig, simulation: &Simulation) {
    let sim = &config.simulation;
    let domain = &config.domain;
    info!("\nSimulation setup:");
    info!(
        "  Domain: {} x {} x {} ({:?}, cutoff {})",
        domain.size[0], domain.size[1], domain.size[2], domain.container, domain.cutoff
    );
    info!("  Time: {} -> {} (dt = {})", sim.start_time, sim.end_time, sim.delta_t);
    info!("  Dimensions: {}", sim.dimensions);
    info!("  Forces: {:?} (g_grav = {})", config.forces.kind, config.forces.g_grav);
    info!("  Particles: {}", simulation.container().len());
    info!("  Initial temperature: {:.6}", simulation.temperature());
}

pub fn report_summary(summary: &RunSummary, simulation: &Simulation, frames: usize) {
    info!("\nSimulation finished.");
    info!("  Iterations: {}", summary.iterations);
    info!("  Final time: {:.6}", summary.final_time);
    info!("  Particles in domain: {}", summary.particles);
    info!("  Particles in halo: {}", summary.halo);
    info!("  Final temperature: {:.6}", summary.temperature);
    info!("  Frames written: {}", frames);

    let container = simulation.container();
    let active = container.active_ids();
    if active.is_empty() {
        return;
    }
    let (mass, weighted, momentum) = active.iter().map(|&id| container.particle(id)).fold(
        (0.0, Vector3::zeros(), Vector3::zeros()),
        |(m, r, p): (f64, Vector3<f64>, Vector3<f64>), particle| {
            (
                m + particle.mass(),
                r + particle.position * particle.mass(),
                p + particle.velocity * particle.mass(),
            )
        },
    );
    let centre = weighted / mass;
    info!(
        "  Centre of mass: [{:.6}, {:.6}, {:.6}]",
        centre.x, centre.y, centre.z
    );
    info!(
        "  Total momentum: [{:.6}, {:.6}, {:.6}]",
        momentum.x, momentum.y, momentum.z
    );
}
