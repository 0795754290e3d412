use super::{CljKernel, KernelError};
use crate::core::atoms::AtomBatch;
use crate::core::forcefield::potentials::CoulombScheme;
use crate::core::lanes::{FloatLane, LaneAccumulator};
use nalgebra::{Point3, Vector3};

impl CljKernel {
    /// Electrostatic potential (kcal/(mol·e)) of `atoms` at each of `points`,
    /// under the kernel's electrostatics scheme and Coulomb cutoff.
    pub fn potential_at(
        &self,
        points: &[Point3<f64>],
        atoms: &AtomBatch,
    ) -> Result<Vec<f64>, KernelError> {
        let mut out = vec![0.0; points.len()];
        self.potential_into(points, atoms, &mut out)?;
        Ok(out)
    }

    /// Writes the potential at `points` into `out`, which must be the same length.
    pub fn potential_into(
        &self,
        points: &[Point3<f64>],
        atoms: &AtomBatch,
        out: &mut [f64],
    ) -> Result<(), KernelError> {
        if out.len() != points.len() {
            return Err(KernelError::SizeMismatch {
                what: "potential",
                expected: points.len(),
                found: out.len(),
            });
        }
        let scheme = self.coulomb_scheme();
        for (point, slot) in points.iter().zip(out.iter_mut()) {
            *slot = self.point_potential(&scheme, point, atoms);
        }
        Ok(())
    }

    /// Electric field (kcal/(mol·e·Å)) of `atoms` at each of `points`.
    pub fn field_at(
        &self,
        points: &[Point3<f64>],
        atoms: &AtomBatch,
    ) -> Result<Vec<Vector3<f64>>, KernelError> {
        let scheme = self.coulomb_scheme();
        if !scheme.has_forces() {
            return Err(KernelError::Unsupported("Electric field"));
        }
        Ok(points
            .iter()
            .map(|point| self.point_field(&scheme, point, atoms))
            .collect())
    }

    fn point_potential(
        &self,
        scheme: &CoulombScheme,
        point: &Point3<f64>,
        atoms: &AtomBatch,
    ) -> f64 {
        let k = FloatLane::splat(self.coulomb_constant as f32);
        let p = self.space.wrap_point(point);
        let mut potential = LaneAccumulator::new();
        for lane in 0..atoms.n_lanes() {
            let (r, inv_r, _) = self.separation(&p, atoms, lane);
            let energy = scheme.energy_lanes(r, inv_r, k * atoms.q()[lane]);
            potential.add(energy.masked(atoms.real_mask(lane)));
        }
        potential.sum()
    }

    fn point_field(
        &self,
        scheme: &CoulombScheme,
        point: &Point3<f64>,
        atoms: &AtomBatch,
    ) -> Vector3<f64> {
        let k = FloatLane::splat(self.coulomb_constant as f32);
        let p = self.space.wrap_point(point);
        let mut field = Vector3::zeros();
        for lane in 0..atoms.n_lanes() {
            let (r, inv_r, (dx, dy, dz)) = self.separation(&p, atoms, lane);
            let radial = (scheme.force_lanes(r, inv_r, k * atoms.q()[lane]) * inv_r)
                .masked(atoms.real_mask(lane));
            field -= Vector3::new(
                (radial * dx).sum_f64(),
                (radial * dy).sum_f64(),
                (radial * dz).sum_f64(),
            );
        }
        field
    }

    /// Distance, inverse distance and displacement from `p` to each atom of `lane`.
    #[inline]
    fn separation(
        &self,
        p: &Point3<f64>,
        atoms: &AtomBatch,
        lane: usize,
    ) -> (FloatLane, FloatLane, (FloatLane, FloatLane, FloatLane)) {
        let d = self.space.min_image_lanes(
            atoms.x()[lane] - FloatLane::splat(p.x as f32),
            atoms.y()[lane] - FloatLane::splat(p.y as f32),
            atoms.z()[lane] - FloatLane::splat(p.z as f32),
        );
        let r = (d.0 * d.0 + d.1 * d.1 + d.2 * d.2).sqrt();
        (r, r.recip(), d)
    }
}
