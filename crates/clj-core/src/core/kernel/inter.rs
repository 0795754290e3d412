use super::{CljKernel, KernelError, Row, Sink, check_forces, index_lane};
use crate::core::atoms::AtomBatch;
use crate::core::forcefield::forces::ForceTable;
use crate::core::forcefield::term::CljEnergy;
use crate::core::lanes::{FLOAT_WIDTH, FloatLane, IntLane, LaneAccumulator};
use itertools::iproduct;
use nalgebra::Vector3;
use tracing::trace;

impl CljKernel {
    /// Energy of every pair between `a` and `b`. Pairs whose atoms share an id
    /// belong to the same molecule and are skipped.
    pub fn inter_energy(&self, a: &AtomBatch, b: &AtomBatch) -> Result<CljEnergy, KernelError> {
        Ok(self.inter_pass(a, b, false, true, &mut Sink::None))
    }

    /// Energy of every unordered pair within `a`, excluding same-id pairs.
    pub fn self_energy(&self, a: &AtomBatch) -> Result<CljEnergy, KernelError> {
        Ok(self.inter_pass(a, a, true, true, &mut Sink::None))
    }

    /// Energy between two collections of atom groups. Group pairs whose bounding
    /// boxes are out of reach are skipped without touching their atoms; pairs
    /// lying wholly inside the feather skip the switching function.
    pub fn inter_group_energy(
        &self,
        groups_a: &[AtomBatch],
        groups_b: &[AtomBatch],
    ) -> Result<CljEnergy, KernelError> {
        let mut total = CljEnergy::default();
        let mut skipped = 0usize;
        for (a, b) in iproduct!(groups_a, groups_b) {
            if self.out_of_reach(a, b) {
                skipped += 1;
                continue;
            }
            let switched = self.needs_switching(a, b);
            total += self.inter_pass(a, b, false, switched, &mut Sink::None);
        }
        trace!(
            skipped,
            pairs = groups_a.len() * groups_b.len(),
            "Group pairs beyond cutoff"
        );
        Ok(total)
    }

    /// Like [`CljKernel::inter_energy`], adding the pair forces into
    /// `forces_a` and `forces_b`.
    pub fn inter_forces(
        &self,
        a: &AtomBatch,
        b: &AtomBatch,
        forces_a: &mut ForceTable,
        forces_b: &mut ForceTable,
    ) -> Result<CljEnergy, KernelError> {
        self.require_forces("Intermolecular forces")?;
        check_forces(forces_a, a)?;
        check_forces(forces_b, b)?;
        Ok(self.inter_pass(a, b, false, true, &mut Sink::Pair(forces_a, forces_b)))
    }

    pub fn self_forces(
        &self,
        a: &AtomBatch,
        forces: &mut ForceTable,
    ) -> Result<CljEnergy, KernelError> {
        self.require_forces("Intermolecular forces")?;
        check_forces(forces, a)?;
        Ok(self.inter_pass(a, a, true, true, &mut Sink::Same(forces)))
    }

    fn inter_pass(
        &self,
        a: &AtomBatch,
        b: &AtomBatch,
        upper_only: bool,
        switched: bool,
        sink: &mut Sink<'_>,
    ) -> CljEnergy {
        let ctx = self.context(switched);
        let with_forces = sink.is_active();
        let ones = FloatLane::splat(1.0);
        let mut coulomb = LaneAccumulator::new();
        let mut lj = LaneAccumulator::new();

        for i in 0..a.len() {
            let row = Row::of(a, i, ctx.k);
            let own_id = IntLane::splat(row.id);
            let first_lane = if upper_only { i / FLOAT_WIDTH } else { 0 };
            let mut on_i = Vector3::zeros();

            for lane in first_lane..b.n_lanes() {
                let mut mask = b.real_mask(lane) & b.id()[lane].cmp_ne(own_id).to_float_mask();
                if upper_only {
                    mask = mask
                        & index_lane(lane)
                            .cmp_gt(IntLane::splat(i as i32))
                            .to_float_mask();
                }
                if !mask.has_true() {
                    continue;
                }

                let pair = ctx.evaluate(&row, b, lane, with_forces);
                coulomb.add(pair.coulomb.masked(mask));
                lj.add(pair.lj.masked(mask));

                if with_forces {
                    let (fx, fy, fz) = pair.forces(mask, ones, ones);
                    sink.lanes(lane, fx, fy, fz);
                    on_i -= Vector3::new(fx.sum_f64(), fy.sum_f64(), fz.sum_f64());
                }
            }
            if with_forces {
                sink.atom(i, on_i);
            }
        }

        CljEnergy::new(coulomb.sum(), lj.sum())
    }
}
