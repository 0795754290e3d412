use crate::core::atoms::AtomBatch;
use crate::core::lanes::{FLOAT_WIDTH, FloatLane};
use nalgebra::Vector3;

/// Per-atom force accumulators laid out like the lanes of an [`AtomBatch`],
/// padding slots included. Units are kcal/(mol·Å).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForceTable {
    fx: Vec<f64>,
    fy: Vec<f64>,
    fz: Vec<f64>,
    count: usize,
}

impl ForceTable {
    pub fn for_batch(batch: &AtomBatch) -> Self {
        let slots = batch.n_lanes() * FLOAT_WIDTH;
        Self {
            fx: vec![0.0; slots],
            fy: vec![0.0; slots],
            fz: vec![0.0; slots],
            count: batch.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn n_lanes(&self) -> usize {
        self.fx.len() / FLOAT_WIDTH
    }

    pub fn get(&self, i: usize) -> Option<Vector3<f64>> {
        (i < self.count).then(|| Vector3::new(self.fx[i], self.fy[i], self.fz[i]))
    }

    pub fn to_vectors(&self) -> Vec<Vector3<f64>> {
        (0..self.count)
            .map(|i| Vector3::new(self.fx[i], self.fy[i], self.fz[i]))
            .collect()
    }

    pub fn reset(&mut self) {
        self.fx.fill(0.0);
        self.fy.fill(0.0);
        self.fz.fill(0.0);
    }

    /// Net force over all real atoms.
    pub fn total(&self) -> Vector3<f64> {
        (0..self.count).fold(Vector3::zeros(), |acc, i| {
            acc + Vector3::new(self.fx[i], self.fy[i], self.fz[i])
        })
    }

    pub(crate) fn add_atom(&mut self, i: usize, force: Vector3<f64>) {
        self.fx[i] += force.x;
        self.fy[i] += force.y;
        self.fz[i] += force.z;
    }

    pub(crate) fn add_lanes(&mut self, lane: usize, fx: FloatLane, fy: FloatLane, fz: FloatLane) {
        let start = lane * FLOAT_WIDTH;
        for (slots, values) in [
            (&mut self.fx, fx.to_array()),
            (&mut self.fy, fy.to_array()),
            (&mut self.fz, fz.to_array()),
        ] {
            for (slot, value) in slots[start..start + FLOAT_WIDTH].iter_mut().zip(values) {
                *slot += f64::from(value);
            }
        }
    }
}
