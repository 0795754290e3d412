use super::{BONDED_PREFILTER, CljKernel, KernelError, Row, Sink, check_forces, index_lane};
use crate::core::atoms::AtomBatch;
use crate::core::forcefield::connectivity::BondedAdjacency;
use crate::core::forcefield::forces::ForceTable;
use crate::core::forcefield::pairs::{PairScaleTable, ScaleBlock};
use crate::core::forcefield::params::LookupError;
use crate::core::forcefield::term::CljEnergy;
use crate::core::lanes::{FLOAT_WIDTH, FloatLane, IntLane, LaneAccumulator};
use nalgebra::Vector3;
use tracing::trace;

impl CljKernel {
    /// Non-bonded energy within one molecule split into `groups`.
    ///
    /// Batch ids must be the atoms' molecule-wide indices, numbered in group
    /// order to match `table`. Every pair `i < j` is scaled by its table entry;
    /// pairs closer than [`BONDED_PREFILTER`] that `adjacency` reports as bonded
    /// are dropped.
    pub fn intra_energy<A>(
        &self,
        groups: &[AtomBatch],
        table: &PairScaleTable,
        adjacency: &A,
    ) -> Result<CljEnergy, KernelError>
    where
        A: BondedAdjacency + ?Sized,
    {
        self.intra_pass(groups, table, adjacency, None)
    }

    /// Like [`CljKernel::intra_energy`], adding forces into one table per group.
    pub fn intra_forces<A>(
        &self,
        groups: &[AtomBatch],
        table: &PairScaleTable,
        adjacency: &A,
        forces: &mut [ForceTable],
    ) -> Result<CljEnergy, KernelError>
    where
        A: BondedAdjacency + ?Sized,
    {
        self.require_forces("Intramolecular forces")?;
        if forces.len() != groups.len() {
            return Err(KernelError::SizeMismatch {
                what: "group force tables",
                expected: groups.len(),
                found: forces.len(),
            });
        }
        for (table, batch) in forces.iter().zip(groups) {
            check_forces(table, batch)?;
        }
        self.intra_pass(groups, table, adjacency, Some(forces))
    }

    fn intra_pass<A>(
        &self,
        groups: &[AtomBatch],
        table: &PairScaleTable,
        adjacency: &A,
        mut forces: Option<&mut [ForceTable]>,
    ) -> Result<CljEnergy, KernelError>
    where
        A: BondedAdjacency + ?Sized,
    {
        check_groups(groups, table)?;

        let mut total = CljEnergy::default();
        let mut skipped = 0usize;
        for ga in 0..groups.len() {
            for gb in ga..groups.len() {
                let block = table.block(ga, gb)?;
                if block.is_fully_excluded() {
                    skipped += 1;
                    continue;
                }
                let (a, b) = (&groups[ga], &groups[gb]);
                if a.is_empty() || b.is_empty() || self.out_of_reach(a, b) {
                    skipped += 1;
                    continue;
                }

                let pass = IntraPass {
                    kernel: self,
                    block: &block,
                    adjacency,
                    same_group: ga == gb,
                    switched: self.needs_switching(a, b),
                };
                total += match forces.as_deref_mut() {
                    None => pass.run(a, b, &mut Sink::None),
                    Some(tables) if ga == gb => pass.run(a, b, &mut Sink::Same(&mut tables[ga])),
                    Some(tables) => {
                        let (left, right) = tables.split_at_mut(gb);
                        pass.run(a, b, &mut Sink::Pair(&mut left[ga], &mut right[0]))
                    }
                };
            }
        }
        trace!(skipped, groups = groups.len(), "Intramolecular group pairs skipped");
        Ok(total)
    }
}

fn check_groups(groups: &[AtomBatch], table: &PairScaleTable) -> Result<(), KernelError> {
    if groups.len() != table.n_groups() {
        return Err(KernelError::GroupCount {
            groups: groups.len(),
            table: table.n_groups(),
        });
    }
    for (group, batch) in groups.iter().enumerate() {
        let size = table.group_size(group)?;
        if batch.len() != size {
            return Err(KernelError::GroupMismatch {
                group,
                batch: batch.len(),
                table: size,
            });
        }
        let offset = table.group_offset(group)?;
        let range = offset..offset + size;
        if let Some(bad) = batch
            .ids()
            .find(|&id| usize::try_from(id).map_or(true, |id| !range.contains(&id)))
        {
            return Err(LookupError::AtomIndex {
                index: bad.max(0) as usize,
                n_atoms: table.n_atoms(),
            }
            .into());
        }
    }
    Ok(())
}

struct IntraPass<'a, A: ?Sized> {
    kernel: &'a CljKernel,
    block: &'a ScaleBlock<'a>,
    adjacency: &'a A,
    same_group: bool,
    switched: bool,
}

impl<A: BondedAdjacency + ?Sized> IntraPass<'_, A> {
    /// Per-lane Coulomb and LJ scale factors between atom `i` and one lane.
    fn scales(&self, i: usize, ids: [i32; FLOAT_WIDTH]) -> (FloatLane, FloatLane) {
        if self.block.is_empty() {
            let default = self.block.default_scale();
            return (
                FloatLane::splat(default.coulomb as f32),
                FloatLane::splat(default.lj as f32),
            );
        }
        let mut coulomb = [0.0f32; FLOAT_WIDTH];
        let mut lj = [0.0f32; FLOAT_WIDTH];
        for (l, &id) in ids.iter().enumerate() {
            if let Ok(j) = usize::try_from(id) {
                let scale = self.block.get(i, j);
                coulomb[l] = scale.coulomb as f32;
                lj[l] = scale.lj as f32;
            }
        }
        (FloatLane::from_array(coulomb), FloatLane::from_array(lj))
    }

    /// Clears lanes whose atom is bonded to atom `i`, checking only lanes in `close`.
    fn drop_bonded(
        &self,
        i: usize,
        ids: [i32; FLOAT_WIDTH],
        close: FloatLane,
        mask: FloatLane,
    ) -> FloatLane {
        let close = close.to_bits();
        let mut bonded = [0u32; FLOAT_WIDTH];
        for (l, &id) in ids.iter().enumerate() {
            if close[l] != 0
                && usize::try_from(id).is_ok_and(|j| self.adjacency.are_bonded(i, j))
            {
                bonded[l] = u32::MAX;
            }
        }
        FloatLane::from_bits(bonded).and_not(mask)
    }

    fn run(&self, a: &AtomBatch, b: &AtomBatch, sink: &mut Sink<'_>) -> CljEnergy {
        let ctx = self.kernel.context(self.switched);
        let with_forces = sink.is_active();
        let prefilter = FloatLane::splat(BONDED_PREFILTER as f32);
        let mut coulomb = LaneAccumulator::new();
        let mut lj = LaneAccumulator::new();

        for i in 0..a.len() {
            let row = Row::of(a, i, ctx.k);
            let atom_i = row.id as usize;
            let first_lane = if self.same_group { i / FLOAT_WIDTH } else { 0 };
            let mut on_i = Vector3::zeros();

            for lane in first_lane..b.n_lanes() {
                let mut mask = b.real_mask(lane);
                if self.same_group {
                    mask = mask
                        & index_lane(lane)
                            .cmp_gt(IntLane::splat(i as i32))
                            .to_float_mask();
                }
                if !mask.has_true() {
                    continue;
                }

                let ids = b.id()[lane].to_array();
                let pair = ctx.evaluate(&row, b, lane, with_forces);
                let close = pair.r.cmp_lt(prefilter) & mask;
                if close.has_true() {
                    mask = self.drop_bonded(atom_i, ids, close, mask);
                }
                let (coulomb_scale, lj_scale) = self.scales(atom_i, ids);

                coulomb.add((pair.coulomb * coulomb_scale).masked(mask));
                lj.add((pair.lj * lj_scale).masked(mask));

                if with_forces {
                    let (fx, fy, fz) = pair.forces(mask, coulomb_scale, lj_scale);
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
