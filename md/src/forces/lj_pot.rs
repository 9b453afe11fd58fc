use nalgebra::Vector3;

/// Lennard-Jones parameters of one interacting pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LennardJones {
    pub epsilon: f64,
    pub sigma: f64,
}

impl LennardJones {
    pub fn new(epsilon: f64, sigma: f64) -> Self {
        LennardJones { epsilon, sigma }
    }

    /// Lorentz-Berthelot mixing of two particle types.
    pub fn mixed(eps_i: f64, sigma_i: f64, eps_j: f64, sigma_j: f64) -> Self {
        LennardJones {
            epsilon: (eps_i * eps_j).sqrt(),
            sigma: 0.5 * (sigma_i + sigma_j),
        }
    }

    /// Separation at which the force changes sign.
    pub fn zero_force_distance(&self) -> f64 {
        self.sigma * 2f64.powf(1.0 / 6.0)
    }

    /// Force on particle i for the separation `d = x_i - x_j`. Zero beyond a
    /// positive `cutoff`. `d` must not be the zero vector.
    pub fn force(&self, d: &Vector3<f64>, cutoff: Option<f64>) -> Vector3<f64> {
        let r2 = d.norm_squared();
        if let Some(rc) = cutoff {
            if rc > 0.0 && r2 > rc * rc {
                return Vector3::zeros();
            }
        }
        let s2 = self.sigma * self.sigma / r2;
        let s6 = s2 * s2 * s2;
        let scalar = -24.0 * self.epsilon / r2 * (s6 - 2.0 * s6 * s6);
        d * scalar
    }

    pub fn potential(&self, r2: f64) -> f64 {
        let s2 = self.sigma * self.sigma / r2;
        let s6 = s2 * s2 * s2;
        4.0 * self.epsilon * (s6 * s6 - s6)
    }
}
