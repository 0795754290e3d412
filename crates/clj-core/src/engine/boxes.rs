use super::config::KernelSettings;
use crate::core::atoms::{AtomBatch, AtomsError};
use crate::core::space::Aabb;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BoxesError {
    #[error("Box length must be positive and finite, got {0}")]
    InvalidBoxLength(f64),
    #[error(transparent)]
    Atoms(#[from] AtomsError),
}

/// One cubic cell of a [`CljBoxes`] partition.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomBox {
    cell: [i64; 3],
    atoms: AtomBatch,
    indices: Vec<usize>,
}

impl AtomBox {
    /// Integer coordinates of the cell, `floor(position / box_length)`.
    pub fn cell(&self) -> [i64; 3] {
        self.cell
    }

    pub fn atoms(&self) -> &AtomBatch {
        &self.atoms
    }

    /// Index in the source batch of each atom in this box, in box order.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn aabb(&self) -> Option<Aabb> {
        self.atoms.aabb()
    }
}

/// A batch split into cubic boxes of side `box_length`.
///
/// Only occupied boxes are stored, ordered by cell coordinates so that the
/// partition (and every sum taken over it) is reproducible.
#[derive(Debug, Clone, PartialEq)]
pub struct CljBoxes {
    box_length: f64,
    boxes: Vec<AtomBox>,
    locations: Vec<(usize, usize)>,
}

impl CljBoxes {
    pub fn new(atoms: &AtomBatch, box_length: f64) -> Result<Self, BoxesError> {
        if !(box_length.is_finite() && box_length > 0.0) {
            return Err(BoxesError::InvalidBoxLength(box_length));
        }

        let mut cells: BTreeMap<[i64; 3], Vec<usize>> = BTreeMap::new();
        for (i, position) in atoms.positions().iter().enumerate() {
            let cell = [
                (position.x / box_length).floor() as i64,
                (position.y / box_length).floor() as i64,
                (position.z / box_length).floor() as i64,
            ];
            cells.entry(cell).or_default().push(i);
        }

        let mut locations = vec![(0, 0); atoms.len()];
        let mut boxes = Vec::with_capacity(cells.len());
        for (box_index, (cell, indices)) in cells.into_iter().enumerate() {
            for (slot, &atom) in indices.iter().enumerate() {
                locations[atom] = (box_index, slot);
            }
            boxes.push(AtomBox {
                cell,
                atoms: atoms.select(&indices)?,
                indices,
            });
        }

        debug!(
            n_atoms = atoms.len(),
            n_boxes = boxes.len(),
            box_length,
            "Partitioned atoms into boxes"
        );
        Ok(Self {
            box_length,
            boxes,
            locations,
        })
    }

    /// Partition with the `box-length` of a settings file.
    pub fn from_settings(atoms: &AtomBatch, settings: &KernelSettings) -> Result<Self, BoxesError> {
        Self::new(atoms, settings.parallel.box_length)
    }

    pub fn box_length(&self) -> f64 {
        self.box_length
    }

    pub fn n_boxes(&self) -> usize {
        self.boxes.len()
    }

    pub fn boxes(&self) -> &[AtomBox] {
        &self.boxes
    }

    pub fn n_atoms(&self) -> usize {
        self.locations.len()
    }

    /// `(box, slot)` holding atom `atom` of the source batch.
    pub fn index_of(&self, atom: usize) -> Option<(usize, usize)> {
        self.locations.get(atom).copied()
    }
}
