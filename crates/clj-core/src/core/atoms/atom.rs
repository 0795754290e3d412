use crate::core::forcefield::lj_db::LjId;
use crate::core::forcefield::params::LjParameter;
use nalgebra::Point3;

/// A single atom as seen by the non-bonded kernel.
///
/// The `id` carries the scope-dependent identity: the molecule number for
/// intermolecular evaluation (same-id pairs never interact), or the atom's
/// index within its molecule for intramolecular evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CljAtom {
    /// Coordinates in Angstroms.
    pub position: Point3<f64>,
    /// Partial charge in elementary charge units.
    pub charge: f64,
    /// Lennard-Jones σ/ε.
    pub lj: LjParameter,
    /// Molecule or atom identity, see the type docs.
    pub id: i32,
}

impl CljAtom {
    pub fn new(position: Point3<f64>, charge: f64, lj: LjParameter, id: i32) -> Self {
        Self {
            position,
            charge,
            lj,
            id,
        }
    }
}

/// Like [`CljAtom`] but naming its LJ parameter by interned id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CljAtomRef {
    pub position: Point3<f64>,
    pub charge: f64,
    pub lj_id: LjId,
    pub id: i32,
}

impl CljAtomRef {
    pub fn new(position: Point3<f64>, charge: f64, lj_id: LjId, id: i32) -> Self {
        Self {
            position,
            charge,
            lj_id,
            id,
        }
    }
}
