//! # Kernel Module
//!
//! Lane-vectorised loops that turn [`AtomBatch`]es into Coulomb and LJ
//! energies, per-atom forces and electrostatic potentials.
//!
//! ## Overview
//!
//! Every loop broadcasts one atom of the first batch against whole lanes of the
//! second. Pair terms are computed in `f32` for all lanes and then masked:
//! padding lanes (dummy id), excluded pairs and pairs beyond the cutoff are
//! cleared bitwise, so a NaN or infinity produced for a masked lane never
//! reaches the `f64` accumulators.
//!
//! Two scopes are supported:
//!
//! - **Intermolecular** ([`CljKernel::inter_energy`], [`CljKernel::self_energy`],
//!   [`CljKernel::inter_group_energy`]) - batch ids are molecule numbers and
//!   pairs sharing an id are skipped.
//! - **Intramolecular** ([`CljKernel::intra_energy`]) - batch ids are atom
//!   indices within one molecule, pairs are scaled through a
//!   [`PairScaleTable`](crate::core::forcefield::pairs::PairScaleTable) and
//!   bonded neighbours closer than [`BONDED_PREFILTER`] are masked out.
//!
//! Under periodic boundaries all coordinates are expected to lie in the
//! primary box (see [`AtomBatch::wrapped`]).

mod field;
mod inter;
mod intra;

use crate::core::atoms::{AtomBatch, AtomsError};
use crate::core::forcefield::cutoff::{CutoffConfig, SwitchingFunction};
use crate::core::forcefield::forces::ForceTable;
use crate::core::forcefield::params::{CombiningRule, LookupError, combine_lanes};
use crate::core::forcefield::potentials::{COULOMB_CONSTANT, CoulombScheme, lennard_jones_lanes};
use crate::core::lanes::{FLOAT_WIDTH, FloatLane, IntLane};
use crate::core::space::Space;
use nalgebra::Vector3;
use thiserror::Error;

/// Pairs closer than this (Å) are checked against the bond graph.
pub const BONDED_PREFILTER: f64 = 5.5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum KernelError {
    #[error("{0} is not available under reaction-field electrostatics")]
    Unsupported(&'static str),
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error(transparent)]
    Atoms(#[from] AtomsError),
    #[error("{groups} atom groups were given for a scale table of {table} groups")]
    GroupCount { groups: usize, table: usize },
    #[error("Group {group} holds {batch} atoms but the scale table expects {table}")]
    GroupMismatch {
        group: usize,
        batch: usize,
        table: usize,
    },
    #[error("Output for {what} has {found} entries, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Electrostatics {
    #[default]
    Shifted,
    ReactionField {
        dielectric: f64,
    },
}

/// Configuration of one non-bonded evaluation: cutoffs, combining rule,
/// boundary conditions and electrostatics scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CljKernel {
    cutoffs: CutoffConfig,
    rule: CombiningRule,
    space: Space,
    electrostatics: Electrostatics,
    coulomb_constant: f64,
}

impl CljKernel {
    pub fn new(cutoffs: CutoffConfig, rule: CombiningRule, space: Space) -> Self {
        Self {
            cutoffs,
            rule,
            space,
            electrostatics: Electrostatics::Shifted,
            coulomb_constant: COULOMB_CONSTANT,
        }
    }

    pub fn with_electrostatics(mut self, electrostatics: Electrostatics) -> Self {
        self.electrostatics = electrostatics;
        self
    }

    pub fn with_coulomb_constant(mut self, coulomb_constant: f64) -> Self {
        self.coulomb_constant = coulomb_constant;
        self
    }

    /// Same kernel under another combining rule; rules may differ between
    /// molecule pairs, so this is a per-call choice.
    pub fn with_rule(mut self, rule: CombiningRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_space(mut self, space: Space) -> Self {
        self.space = space;
        self
    }

    pub fn cutoffs(&self) -> &CutoffConfig {
        &self.cutoffs
    }

    pub fn rule(&self) -> CombiningRule {
        self.rule
    }

    pub fn space(&self) -> &Space {
        &self.space
    }

    pub fn electrostatics(&self) -> Electrostatics {
        self.electrostatics
    }

    pub fn coulomb_constant(&self) -> f64 {
        self.coulomb_constant
    }

    pub fn coulomb_scheme(&self) -> CoulombScheme {
        let cutoff = self.cutoffs.coulomb_cutoff();
        match self.electrostatics {
            Electrostatics::Shifted if self.cutoffs.shift_electrostatics() => {
                CoulombScheme::Shifted { cutoff }
            }
            Electrostatics::Shifted => CoulombScheme::Truncated { cutoff },
            Electrostatics::ReactionField { dielectric } => {
                CoulombScheme::reaction_field(cutoff, dielectric)
            }
        }
    }

    fn require_forces(&self, what: &'static str) -> Result<(), KernelError> {
        if self.coulomb_scheme().has_forces() {
            Ok(())
        } else {
            Err(KernelError::Unsupported(what))
        }
    }

    fn context(&self, switched: bool) -> PairContext {
        PairContext {
            space: self.space,
            rule: self.rule,
            scheme: self.coulomb_scheme(),
            k: self.coulomb_constant as f32,
            lj_cutoff: self.cutoffs.lj_cutoff() as f32,
            switch: (switched && self.cutoffs.switching_active()).then(|| self.cutoffs.switching()),
        }
    }

    /// Whether a pair of bounding boxes can reach into the switching window.
    fn needs_switching(&self, a: &AtomBatch, b: &AtomBatch) -> bool {
        if !self.cutoffs.switching_active() {
            return false;
        }
        match (a.aabb(), b.aabb()) {
            (Some(box_a), Some(box_b)) => {
                self.space.max_distance(&box_a, &box_b) > self.cutoffs.feather()
            }
            _ => false,
        }
    }

    /// Whether no atom of `a` can be within the outer cutoff of any atom of
    /// `b`. Empty batches are always out of reach.
    pub fn out_of_reach(&self, a: &AtomBatch, b: &AtomBatch) -> bool {
        match (a.aabb(), b.aabb()) {
            (Some(box_a), Some(box_b)) => {
                self.space
                    .beyond(self.cutoffs.max_cutoff(), &box_a, &box_b)
            }
            _ => true,
        }
    }
}

fn check_forces(forces: &ForceTable, batch: &AtomBatch) -> Result<(), KernelError> {
    if forces.len() == batch.len() && forces.n_lanes() == batch.n_lanes() {
        Ok(())
    } else {
        Err(KernelError::SizeMismatch {
            what: "forces",
            expected: batch.len(),
            found: forces.len(),
        })
    }
}

/// Where a pass writes its forces, if anywhere.
enum Sink<'a> {
    None,
    Pair(&'a mut ForceTable, &'a mut ForceTable),
    Same(&'a mut ForceTable),
}

impl Sink<'_> {
    fn is_active(&self) -> bool {
        !matches!(self, Sink::None)
    }

    /// Forces on lanes of the second batch.
    fn lanes(&mut self, lane: usize, fx: FloatLane, fy: FloatLane, fz: FloatLane) {
        match self {
            Sink::None => {}
            Sink::Pair(_, b) => b.add_lanes(lane, fx, fy, fz),
            Sink::Same(t) => t.add_lanes(lane, fx, fy, fz),
        }
    }

    /// Force on one atom of the first batch.
    fn atom(&mut self, index: usize, force: Vector3<f64>) {
        match self {
            Sink::None => {}
            Sink::Pair(a, _) => a.add_atom(index, force),
            Sink::Same(t) => t.add_atom(index, force),
        }
    }
}

/// One atom broadcast across a lane, with its charge already multiplied by
/// the Coulomb constant.
#[derive(Debug, Clone, Copy)]
struct Row {
    x: FloatLane,
    y: FloatLane,
    z: FloatLane,
    q: FloatLane,
    sigma: FloatLane,
    epsilon: FloatLane,
    id: i32,
}

impl Row {
    fn of(batch: &AtomBatch, index: usize, k: f32) -> Self {
        let lane = index / FLOAT_WIDTH;
        let slot = index % FLOAT_WIDTH;
        let pick = |lanes: &[FloatLane]| FloatLane::splat(lanes[lane].to_array()[slot]);
        Self {
            x: pick(batch.x()),
            y: pick(batch.y()),
            z: pick(batch.z()),
            q: pick(batch.q()) * FloatLane::splat(k),
            sigma: pick(batch.sigma()),
            epsilon: pick(batch.epsilon()),
            id: batch.id()[lane].to_array()[slot],
        }
    }
}

/// Flat atom indices held by `lane`.
#[inline]
fn index_lane(lane: usize) -> IntLane {
    IntLane::from_array(std::array::from_fn(|l| (lane * FLOAT_WIDTH + l) as i32))
}

/// Unmasked pair terms for one row against one lane.
#[derive(Debug, Clone, Copy)]
struct PairLanes {
    dx: FloatLane,
    dy: FloatLane,
    dz: FloatLane,
    r: FloatLane,
    inv_r: FloatLane,
    coulomb: FloatLane,
    lj: FloatLane,
    f_coulomb: FloatLane,
    f_lj: FloatLane,
}

impl PairLanes {
    /// Masked force components on the second atom of each pair, with the two
    /// terms scaled separately. The first atom receives the opposite force.
    #[inline]
    fn forces(
        &self,
        mask: FloatLane,
        coulomb_scale: FloatLane,
        lj_scale: FloatLane,
    ) -> (FloatLane, FloatLane, FloatLane) {
        let radial = ((self.f_coulomb * coulomb_scale + self.f_lj * lj_scale) * self.inv_r)
            .masked(mask);
        (radial * self.dx, radial * self.dy, radial * self.dz)
    }
}

#[derive(Debug, Clone, Copy)]
struct PairContext {
    space: Space,
    rule: CombiningRule,
    scheme: CoulombScheme,
    k: f32,
    lj_cutoff: f32,
    switch: Option<SwitchingFunction>,
}

impl PairContext {
    #[inline]
    fn evaluate(&self, row: &Row, b: &AtomBatch, lane: usize, with_forces: bool) -> PairLanes {
        let (dx, dy, dz) = self.space.min_image_lanes(
            b.x()[lane] - row.x,
            b.y()[lane] - row.y,
            b.z()[lane] - row.z,
        );
        let r = (dx * dx + dy * dy + dz * dz).sqrt();
        let inv_r = r.recip();
        let qq = row.q * b.q()[lane];
        let (sigma, epsilon) = combine_lanes(
            row.sigma,
            row.epsilon,
            b.sigma()[lane],
            b.epsilon()[lane],
            self.rule,
        );

        let coulomb = self.scheme.energy_lanes(r, inv_r, qq);
        let (mut lj, mut f_lj) = lennard_jones_lanes(r, inv_r, sigma, epsilon, self.lj_cutoff);
        if let Some(switch) = &self.switch {
            let (s, ds) = switch.evaluate_lanes(r);
            f_lj = s * f_lj - ds * lj;
            lj = s * lj;
        }
        let f_coulomb = if with_forces {
            self.scheme.force_lanes(r, inv_r, qq)
        } else {
            FloatLane::zero()
        };

        PairLanes {
            dx,
            dy,
            dz,
            r,
            inv_r,
            coulomb,
            lj,
            f_coulomb,
            f_lj,
        }
    }
}
