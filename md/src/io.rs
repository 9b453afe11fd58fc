//! Trajectory frames and checkpoints.

use crate::container::ParticleContainer;
use crate::error::{ConfigError, IoError};
use crate::particle::Particle;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes one XYZ file per frame, named `<basename>_<iteration>.xyz`.
#[derive(Debug, Clone)]
pub struct XyzWriter {
    directory: PathBuf,
    basename: String,
}

impl XyzWriter {
    pub fn new(directory: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
        XyzWriter {
            directory: directory.into(),
            basename: basename.into(),
        }
    }

    pub fn frame_path(&self, iteration: usize) -> PathBuf {
        self.directory
            .join(format!("{}_{}.xyz", self.basename, iteration))
    }

    /// Write the active particles as `type x y z` lines.
    pub fn write_frame<C: ParticleContainer + ?Sized>(
        &self,
        container: &C,
        iteration: usize,
        time: f64,
    ) -> Result<PathBuf, IoError> {
        fs::create_dir_all(&self.directory)?;
        let path = self.frame_path(iteration);
        let mut out = BufWriter::new(File::create(&path)?);

        let ids = container.active_ids();
        writeln!(out, "{}", ids.len())?;
        writeln!(out, "iteration {} time {}", iteration, time)?;
        for id in ids {
            let p = container.particle(id);
            writeln!(
                out,
                "{} {:.8} {:.8} {:.8}",
                p.type_id(),
                p.position.x,
                p.position.y,
                p.position.z
            )?;
        }
        out.flush()?;
        debug!("wrote {}", path.display());
        Ok(path)
    }
}

/// Full state of the active particles at one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub time: f64,
    pub particles: Vec<Particle>,
}

impl Checkpoint {
    pub fn capture<C: ParticleContainer + ?Sized>(container: &C, time: f64) -> Self {
        Checkpoint {
            time,
            particles: container
                .active_ids()
                .into_iter()
                .map(|id| container.particle(id).clone())
                .collect(),
        }
    }

    /// Hand out the particles after checking what deserialization could not.
    pub fn into_particles(self) -> Result<Vec<Particle>, ConfigError> {
        if let Some((i, p)) = self
            .particles
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.mass() > 0.0))
        {
            return Err(ConfigError::InvalidParameter(format!(
                "checkpoint particle {} has mass {}",
                i,
                p.mass()
            )));
        }
        Ok(self.particles)
    }
}

pub fn write_checkpoint<P: AsRef<Path>>(path: P, checkpoint: &Checkpoint) -> Result<(), IoError> {
    let content = serde_yml::to_string(checkpoint)?;
    fs::write(path, content)?;
    Ok(())
}

pub fn read_checkpoint<P: AsRef<Path>>(path: P) -> Result<Checkpoint, IoError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_yml::from_str(&content)?)
}
