use super::boxes::{AtomBox, CljBoxes};
use super::config::KernelSettings;
use super::error::EngineError;
use crate::core::forcefield::term::CljEnergy;
use crate::core::kernel::CljKernel;
use itertools::{Itertools, iproduct};
use std::slice;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Intermolecular energy of boxed systems, one kernel call per box pair.
///
/// Box pairs are collected up front, pruned on their bounding boxes and then
/// evaluated independently. Per-pair results are summed in pair order, so the
/// total does not depend on how the work was scheduled.
#[derive(Debug, Clone, Copy)]
pub struct CljCalculator {
    kernel: CljKernel,
}

impl CljCalculator {
    pub fn new(kernel: CljKernel) -> Self {
        Self { kernel }
    }

    pub fn from_settings(settings: &KernelSettings) -> Result<Self, EngineError> {
        Ok(Self::new(settings.to_kernel()?))
    }

    pub fn kernel(&self) -> &CljKernel {
        &self.kernel
    }

    /// Energy of every pair of atoms with different ids across all of `boxes`.
    #[instrument(skip_all, name = "total_energy_task")]
    pub fn total_energy(&self, boxes: &CljBoxes) -> Result<CljEnergy, EngineError> {
        let all = boxes.boxes();
        let pairs: Vec<(&AtomBox, &AtomBox)> = all
            .iter()
            .map(|b| (b, b))
            .chain(all.iter().tuple_combinations())
            .collect();
        self.evaluate(pairs)
    }

    /// Energy between the atoms of `a` and those of `b`.
    #[instrument(skip_all, name = "inter_energy_task")]
    pub fn inter_energy(&self, a: &CljBoxes, b: &CljBoxes) -> Result<CljEnergy, EngineError> {
        let pairs: Vec<(&AtomBox, &AtomBox)> = iproduct!(a.boxes(), b.boxes()).collect();
        self.evaluate(pairs)
    }

    fn evaluate(&self, pairs: Vec<(&AtomBox, &AtomBox)>) -> Result<CljEnergy, EngineError> {
        let n_pairs = pairs.len();
        let tasks: Vec<(&AtomBox, &AtomBox)> = pairs
            .into_iter()
            .filter(|(a, b)| !self.kernel.out_of_reach(a.atoms(), b.atoms()))
            .collect();
        debug!(
            pairs = n_pairs,
            evaluated = tasks.len(),
            "Box pairs within cutoff"
        );

        #[cfg(not(feature = "parallel"))]
        let iterator = tasks.iter();

        #[cfg(feature = "parallel")]
        let iterator = tasks.par_iter();

        let energies = iterator
            .map(|&(a, b)| {
                if std::ptr::eq(a, b) {
                    self.kernel.self_energy(a.atoms())
                } else {
                    self.kernel
                        .inter_group_energy(slice::from_ref(a.atoms()), slice::from_ref(b.atoms()))
                }
            })
            .collect::<Result<Vec<CljEnergy>, _>>()?;

        Ok(energies.into_iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::atoms::{AtomBatch, CljAtom};
    use crate::core::forcefield::cutoff::CutoffConfig;
    use crate::core::forcefield::params::{CombiningRule, LjParameter};
    use crate::core::space::Space;
    use nalgebra::Point3;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-4 * a.abs().max(b.abs()).max(1.0)
    }

    /// Three-atom molecules scattered over a 30 Å region.
    fn solvent(n_molecules: usize, offset: f64) -> AtomBatch {
        let mut atoms = Vec::new();
        for m in 0..n_molecules {
            let t = m as f64 + offset;
            let centre = Point3::new(
                15.0 + 12.0 * (1.7 * t).sin(),
                15.0 + 12.0 * (2.3 * t).cos(),
                15.0 + 12.0 * (0.9 * t + 0.4).sin(),
            );
            let sites = [
                ([0.0, 0.0, 0.0], -0.8, LjParameter::new(3.15, 0.15)),
                ([0.96, 0.0, 0.0], 0.4, LjParameter::new(0.4, 0.02)),
                ([-0.24, 0.93, 0.0], 0.4, LjParameter::new(0.4, 0.02)),
            ];
            for (d, q, lj) in sites {
                atoms.push(CljAtom::new(
                    centre + nalgebra::Vector3::new(d[0], d[1], d[2]),
                    q,
                    lj,
                    m as i32,
                ));
            }
        }
        AtomBatch::from_atoms(&atoms).unwrap()
    }

    fn kernel(space: Space) -> CljKernel {
        CljKernel::new(
            CutoffConfig::new(9.0, 9.0, 8.0, true).unwrap(),
            CombiningRule::Arithmetic,
            space,
        )
    }

    #[test]
    fn boxed_total_energy_matches_flat_self_energy() {
        let atoms = solvent(40, 0.0);
        let kernel = kernel(Space::Vacuum);
        let flat = kernel.self_energy(&atoms).unwrap();

        for box_length in [4.0, 7.5, 50.0] {
            let boxes = CljBoxes::new(&atoms, box_length).unwrap();
            let boxed = CljCalculator::new(kernel).total_energy(&boxes).unwrap();
            assert!(close(boxed.coulomb, flat.coulomb), "box {box_length}");
            assert!(close(boxed.lj, flat.lj), "box {box_length}");
        }
    }

    #[test]
    fn boxed_total_energy_matches_flat_under_periodic_boundaries() {
        let space = Space::periodic([30.0, 30.0, 30.0]).unwrap();
        let atoms = solvent(30, 0.5).wrapped(&space).unwrap();
        let kernel = kernel(space);
        let flat = kernel.self_energy(&atoms).unwrap();

        let boxes = CljBoxes::new(&atoms, 6.0).unwrap();
        let boxed = CljCalculator::new(kernel).total_energy(&boxes).unwrap();
        assert!(close(boxed.total(), flat.total()));
    }

    #[test]
    fn boxed_inter_energy_matches_flat_inter_energy() {
        let a = solvent(15, 0.0);
        let b = AtomBatch::from_atoms(
            &solvent(15, 100.0)
                .atoms()
                .into_iter()
                .map(|mut atom| {
                    atom.id += 1000;
                    atom
                })
                .collect::<Vec<_>>(),
        )
        .unwrap();
        let kernel = kernel(Space::Vacuum);
        let flat = kernel.inter_energy(&a, &b).unwrap();

        let calculator = CljCalculator::new(kernel);
        let boxed = calculator
            .inter_energy(
                &CljBoxes::new(&a, 5.0).unwrap(),
                &CljBoxes::new(&b, 5.0).unwrap(),
            )
            .unwrap();
        assert!(close(boxed.coulomb, flat.coulomb));
        assert!(close(boxed.lj, flat.lj));
    }

    #[test]
    fn settings_drive_both_kernel_and_partition() {
        let settings = KernelSettings::from_toml_str(
            r#"
            [cutoff]
            coulomb = 9.0
            lj = 9.0
            feather = 8.0

            [parallel]
            box-length = 6.0
            "#,
        )
        .unwrap();
        let atoms = solvent(20, 0.25);
        let calculator = CljCalculator::from_settings(&settings).unwrap();
        let boxes = CljBoxes::from_settings(&atoms, &settings).unwrap();
        assert_eq!(boxes.box_length(), 6.0);

        let boxed = calculator.total_energy(&boxes).unwrap();
        let flat = kernel(Space::Vacuum).self_energy(&atoms).unwrap();
        assert!(close(boxed.total(), flat.total()));
    }

    #[test]
    fn empty_partition_has_zero_energy() {
        let boxes = CljBoxes::new(&AtomBatch::default(), 5.0).unwrap();
        let energy = CljCalculator::new(kernel(Space::Vacuum))
            .total_energy(&boxes)
            .unwrap();
        assert_eq!(energy, CljEnergy::default());
    }
}
