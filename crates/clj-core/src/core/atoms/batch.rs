use super::atom::{CljAtom, CljAtomRef};
use crate::core::forcefield::lj_db::LjSnapshot;
use crate::core::forcefield::params::{LjParameter, LookupError};
use crate::core::lanes::{FLOAT_WIDTH, FloatLane, IntLane, LaneError};
use crate::core::space::{Aabb, Space};
use nalgebra::Point3;
use thiserror::Error;

/// Identity written into padding lanes. No real atom may carry it.
pub const DUMMY_ID: i32 = i32::MIN;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AtomsError {
    #[error("Array '{field}' has {found} entries but {expected} atoms were given")]
    MismatchedLengths {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Atom {0} uses the reserved padding id")]
    ReservedId(usize),
    #[error("Atom index {index} is out of range for a batch of {len} atoms")]
    InvalidIndex { index: usize, len: usize },
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Lane(#[from] LaneError),
}

/// Structure-of-arrays view of a set of atoms, packed into lanes.
///
/// The last lane of every array is padded: coordinates, charge and LJ
/// parameters are zero and the id is [`DUMMY_ID`]. The kernel masks padding
/// by id alone, so real atoms with zero charge or zero ε still count as real.
/// A batch is immutable; any upstream change means building a new one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AtomBatch {
    x: Vec<FloatLane>,
    y: Vec<FloatLane>,
    z: Vec<FloatLane>,
    q: Vec<FloatLane>,
    sigma: Vec<FloatLane>,
    epsilon: Vec<FloatLane>,
    id: Vec<IntLane>,
    count: usize,
    aabb: Option<Aabb>,
}

fn check_len(field: &'static str, expected: usize, found: usize) -> Result<(), AtomsError> {
    if expected == found {
        Ok(())
    } else {
        Err(AtomsError::MismatchedLengths {
            field,
            expected,
            found,
        })
    }
}

fn pack(values: &[f64]) -> Result<Vec<FloatLane>, LaneError> {
    values
        .chunks(FLOAT_WIDTH)
        .map(|chunk| {
            let narrowed: Vec<f32> = chunk.iter().map(|&v| v as f32).collect();
            FloatLane::from_slice(&narrowed)
        })
        .collect()
}

impl AtomBatch {
    pub fn from_arrays(
        x: &[f64],
        y: &[f64],
        z: &[f64],
        q: &[f64],
        sigma: &[f64],
        epsilon: &[f64],
        id: &[i32],
    ) -> Result<Self, AtomsError> {
        let count = x.len();
        check_len("y", count, y.len())?;
        check_len("z", count, z.len())?;
        check_len("q", count, q.len())?;
        check_len("sigma", count, sigma.len())?;
        check_len("epsilon", count, epsilon.len())?;
        check_len("id", count, id.len())?;
        if let Some(index) = id.iter().position(|&i| i == DUMMY_ID) {
            return Err(AtomsError::ReservedId(index));
        }

        let aabb = Aabb::from_points(
            &(0..count)
                .map(|i| Point3::new(x[i], y[i], z[i]))
                .collect::<Vec<_>>(),
        );
        let ids = id
            .chunks(FLOAT_WIDTH)
            .map(|chunk| IntLane::from_slice_padded(chunk, DUMMY_ID))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            x: pack(x)?,
            y: pack(y)?,
            z: pack(z)?,
            q: pack(q)?,
            sigma: pack(sigma)?,
            epsilon: pack(epsilon)?,
            id: ids,
            count,
            aabb,
        })
    }

    pub fn from_atoms(atoms: &[CljAtom]) -> Result<Self, AtomsError> {
        let column = |f: fn(&CljAtom) -> f64| atoms.iter().map(f).collect::<Vec<_>>();
        Self::from_arrays(
            &column(|a| a.position.x),
            &column(|a| a.position.y),
            &column(|a| a.position.z),
            &column(|a| a.charge),
            &column(|a| a.lj.sigma),
            &column(|a| a.lj.epsilon),
            &atoms.iter().map(|a| a.id).collect::<Vec<_>>(),
        )
    }

    /// Resolves interned LJ ids against `snapshot` while packing.
    pub fn from_atoms_with_ids(
        atoms: &[CljAtomRef],
        snapshot: &LjSnapshot,
    ) -> Result<Self, AtomsError> {
        let resolved = atoms
            .iter()
            .map(|a| {
                snapshot
                    .parameter(a.lj_id)
                    .map(|lj| CljAtom::new(a.position, a.charge, lj, a.id))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_atoms(&resolved)
    }

    /// Number of real atoms.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of lanes per component, padding included.
    pub fn n_lanes(&self) -> usize {
        self.x.len()
    }

    pub fn x(&self) -> &[FloatLane] {
        &self.x
    }

    pub fn y(&self) -> &[FloatLane] {
        &self.y
    }

    pub fn z(&self) -> &[FloatLane] {
        &self.z
    }

    pub fn q(&self) -> &[FloatLane] {
        &self.q
    }

    pub fn sigma(&self) -> &[FloatLane] {
        &self.sigma
    }

    pub fn epsilon(&self) -> &[FloatLane] {
        &self.epsilon
    }

    pub fn id(&self) -> &[IntLane] {
        &self.id
    }

    /// Ids of the real atoms, in order.
    pub fn ids(&self) -> impl Iterator<Item = i32> + '_ {
        self.id
            .iter()
            .flat_map(|lane| lane.to_array())
            .take(self.count)
    }

    pub fn dummy_id(&self) -> i32 {
        DUMMY_ID
    }

    /// All-ones for lanes holding a real atom, zero for padding.
    #[inline]
    pub fn real_mask(&self, lane: usize) -> FloatLane {
        self.id[lane]
            .cmp_ne(IntLane::splat(DUMMY_ID))
            .to_float_mask()
    }

    pub fn aabb(&self) -> Option<Aabb> {
        self.aabb
    }

    fn component(lanes: &[FloatLane], index: usize) -> f32 {
        lanes[index / FLOAT_WIDTH].to_array()[index % FLOAT_WIDTH]
    }

    pub fn atom(&self, index: usize) -> Result<CljAtom, AtomsError> {
        if index >= self.count {
            return Err(AtomsError::InvalidIndex {
                index,
                len: self.count,
            });
        }
        let c = |lanes: &[FloatLane]| f64::from(Self::component(lanes, index));
        Ok(CljAtom::new(
            Point3::new(c(&self.x), c(&self.y), c(&self.z)),
            c(&self.q),
            LjParameter::new(c(&self.sigma), c(&self.epsilon)),
            self.id[index / FLOAT_WIDTH].to_array()[index % FLOAT_WIDTH],
        ))
    }

    pub fn atoms(&self) -> Vec<CljAtom> {
        (0..self.count).filter_map(|i| self.atom(i).ok()).collect()
    }

    pub fn positions(&self) -> Vec<Point3<f64>> {
        self.atoms().into_iter().map(|a| a.position).collect()
    }

    /// Net charge of the real atoms.
    pub fn charge(&self) -> f64 {
        self.q.iter().map(|lane| lane.sum_f64()).sum()
    }

    /// New batch holding the atoms at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Result<Self, AtomsError> {
        let atoms = indices
            .iter()
            .map(|&i| self.atom(i))
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_atoms(&atoms)
    }

    pub fn concat(batches: &[&AtomBatch]) -> Result<Self, AtomsError> {
        let atoms: Vec<CljAtom> = batches.iter().flat_map(|b| b.atoms()).collect();
        Self::from_atoms(&atoms)
    }

    /// Same atoms with every position folded into the primary periodic box.
    pub fn wrapped(&self, space: &Space) -> Result<Self, AtomsError> {
        if !space.is_periodic() {
            return Ok(self.clone());
        }
        let atoms: Vec<CljAtom> = self
            .atoms()
            .into_iter()
            .map(|a| CljAtom {
                position: space.wrap_point(&a.position),
                ..a
            })
            .collect();
        Self::from_atoms(&atoms)
    }
}
