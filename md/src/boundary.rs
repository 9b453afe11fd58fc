//! Per-face boundary conditions of the simulation domain.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// Particles bounce back and feel a repulsive wall force.
    #[default]
    Reflecting,
    /// Particles leaving through this face are moved to the halo.
    Outflow,
    /// The face is identified with the opposite one.
    Periodic,
}

/// Boundary condition of each of the six domain faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundaryConditions {
    #[serde(default)]
    pub x_low: Boundary,
    #[serde(default)]
    pub x_high: Boundary,
    #[serde(default)]
    pub y_low: Boundary,
    #[serde(default)]
    pub y_high: Boundary,
    #[serde(default)]
    pub z_low: Boundary,
    #[serde(default)]
    pub z_high: Boundary,
}

impl BoundaryConditions {
    /// Use the same condition on every face.
    pub fn uniform(boundary: Boundary) -> Self {
        Self::from_faces([boundary; 6])
    }

    /// Faces in the order x-low, x-high, y-low, y-high, z-low, z-high.
    pub fn from_faces(faces: [Boundary; 6]) -> Self {
        BoundaryConditions {
            x_low: faces[0],
            x_high: faces[1],
            y_low: faces[2],
            y_high: faces[3],
            z_low: faces[4],
            z_high: faces[5],
        }
    }

    pub fn faces(&self) -> [Boundary; 6] {
        [
            self.x_low,
            self.x_high,
            self.y_low,
            self.y_high,
            self.z_low,
            self.z_high,
        ]
    }

    pub fn outflow_flags(&self) -> [bool; 6] {
        self.faces().map(|b| b == Boundary::Outflow)
    }

    pub fn reflecting_flags(&self) -> [bool; 6] {
        self.faces().map(|b| b == Boundary::Reflecting)
    }

    /// An axis is periodic when both of its faces are.
    pub fn periodic_flags(&self) -> [bool; 3] {
        let faces = self.faces();
        [0, 1, 2].map(|d| {
            faces[2 * d] == Boundary::Periodic && faces[2 * d + 1] == Boundary::Periodic
        })
    }

    pub fn any(&self, boundary: Boundary) -> bool {
        self.faces().contains(&boundary)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let faces = self.faces();
        for (d, axis) in ['x', 'y', 'z'].into_iter().enumerate() {
            let low = faces[2 * d] == Boundary::Periodic;
            let high = faces[2 * d + 1] == Boundary::Periodic;
            if low != high {
                return Err(ConfigError::HalfPeriodic { axis });
            }
        }
        Ok(())
    }
}
