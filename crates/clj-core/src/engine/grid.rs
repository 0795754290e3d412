use super::config::KernelSettings;
use super::error::EngineError;
use crate::core::atoms::AtomBatch;
use crate::core::kernel::{CljKernel, KernelError};
use nalgebra::Point3;
use thiserror::Error;
use tracing::{info, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Number of grid points handed to one worker at a time.
pub const DEFAULT_GRID_CHUNK: usize = 4096;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error("Grid dimensions must all be non-zero, got {0:?}")]
    EmptyDimensions([usize; 3]),
    #[error("Grid spacing must be positive and finite, got {0}")]
    InvalidSpacing(f64),
    #[error("Grid chunk size must be at least 1")]
    InvalidChunkSize,
}

/// A regular cubic-spaced grid of points. Point `i` has indices
/// `(ix, iy, iz)` with `i = (ix * ny + iy) * nz + iz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridInfo {
    origin: Point3<f64>,
    dimensions: [usize; 3],
    spacing: f64,
}

impl GridInfo {
    pub fn new(
        origin: Point3<f64>,
        dimensions: [usize; 3],
        spacing: f64,
    ) -> Result<Self, GridError> {
        if dimensions.contains(&0) {
            return Err(GridError::EmptyDimensions(dimensions));
        }
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(GridError::InvalidSpacing(spacing));
        }
        Ok(Self {
            origin,
            dimensions,
            spacing,
        })
    }

    /// Smallest grid with the given spacing covering the atoms' bounding box
    /// plus `margin` on every side. `None` for an empty batch.
    pub fn enclosing(
        atoms: &AtomBatch,
        spacing: f64,
        margin: f64,
    ) -> Result<Option<Self>, GridError> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(GridError::InvalidSpacing(spacing));
        }
        let Some(aabb) = atoms.aabb() else {
            return Ok(None);
        };
        let origin = aabb.min.map(|c| c - margin);
        let extent = (aabb.max - aabb.min).map(|c| c + 2.0 * margin);
        let count = |length: f64| (length / spacing).ceil().max(0.0) as usize + 1;
        Self::new(
            origin,
            [count(extent.x), count(extent.y), count(extent.z)],
            spacing,
        )
        .map(Some)
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn dimensions(&self) -> [usize; 3] {
        self.dimensions
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn n_points(&self) -> usize {
        self.dimensions.iter().product()
    }

    pub fn point(&self, index: usize) -> Option<Point3<f64>> {
        if index >= self.n_points() {
            return None;
        }
        let [_, ny, nz] = self.dimensions;
        let iz = index % nz;
        let iy = (index / nz) % ny;
        let ix = index / (ny * nz);
        Some(Point3::new(
            self.origin.x + ix as f64 * self.spacing,
            self.origin.y + iy as f64 * self.spacing,
            self.origin.z + iz as f64 * self.spacing,
        ))
    }

    pub fn points(&self) -> Vec<Point3<f64>> {
        (0..self.n_points()).filter_map(|i| self.point(i)).collect()
    }
}

/// Evaluates the electrostatic potential of a batch over many points, split
/// into fixed-size chunks.
#[derive(Debug, Clone, Copy)]
pub struct CljGrid {
    kernel: CljKernel,
    chunk_size: usize,
}

impl CljGrid {
    pub fn new(kernel: CljKernel, chunk_size: usize) -> Result<Self, GridError> {
        if chunk_size == 0 {
            return Err(GridError::InvalidChunkSize);
        }
        Ok(Self { kernel, chunk_size })
    }

    /// Kernel and chunk size taken from a settings file.
    pub fn from_settings(settings: &KernelSettings) -> Result<Self, EngineError> {
        let kernel = settings.to_kernel()?;
        Ok(Self::new(kernel, settings.parallel.grid_chunk_size)?)
    }

    pub fn with_default_chunk(kernel: CljKernel) -> Self {
        Self {
            kernel,
            chunk_size: DEFAULT_GRID_CHUNK,
        }
    }

    pub fn kernel(&self) -> &CljKernel {
        &self.kernel
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Potential at every point of `grid`, in [`GridInfo::point`] order.
    #[instrument(skip_all, name = "grid_potential_task")]
    pub fn potential(&self, grid: &GridInfo, atoms: &AtomBatch) -> Result<Vec<f64>, EngineError> {
        self.potential_at(&grid.points(), atoms)
    }

    pub fn potential_at(
        &self,
        points: &[Point3<f64>],
        atoms: &AtomBatch,
    ) -> Result<Vec<f64>, EngineError> {
        let mut out = vec![0.0; points.len()];
        let n_chunks = points.len().div_ceil(self.chunk_size);
        info!(
            n_points = points.len(),
            n_atoms = atoms.len(),
            n_chunks,
            "Evaluating potential on grid"
        );

        #[cfg(not(feature = "parallel"))]
        let chunks = out
            .chunks_mut(self.chunk_size)
            .zip(points.chunks(self.chunk_size));

        #[cfg(feature = "parallel")]
        let chunks = out
            .par_chunks_mut(self.chunk_size)
            .zip(points.par_chunks(self.chunk_size));

        chunks
            .map(|(slots, chunk)| self.kernel.potential_into(chunk, atoms, slots))
            .collect::<Result<(), KernelError>>()?;

        Ok(out)
    }
}
