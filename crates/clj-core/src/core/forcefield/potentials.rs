use crate::core::lanes::FloatLane;

pub const COULOMB_CONSTANT: f64 = 332.0637; // In kcal·Å/(mol·e²)

/// How the electrostatic pair term is cut off at `cutoff`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoulombScheme {
    Shifted { cutoff: f64 },
    Truncated { cutoff: f64 },
    ReactionField { cutoff: f64, k_rf: f64, c_rf: f64 },
}

impl CoulombScheme {
    pub fn reaction_field(cutoff: f64, dielectric: f64) -> Self {
        let k_rf = (dielectric - 1.0) / ((2.0 * dielectric + 1.0) * cutoff.powi(3));
        let c_rf = 1.0 / cutoff + k_rf * cutoff * cutoff;
        Self::ReactionField { cutoff, k_rf, c_rf }
    }

    pub fn cutoff(&self) -> f64 {
        match *self {
            Self::Shifted { cutoff }
            | Self::Truncated { cutoff }
            | Self::ReactionField { cutoff, .. } => cutoff,
        }
    }

    pub fn has_forces(&self) -> bool {
        !matches!(self, Self::ReactionField { .. })
    }

    /// Pair energy for the charge product `qq` (already multiplied by the
    /// Coulomb constant). Zero at and beyond the cutoff.
    #[inline]
    pub fn energy(&self, r: f64, qq: f64) -> f64 {
        if r >= self.cutoff() {
            return 0.0;
        }
        match *self {
            Self::Shifted { cutoff } => {
                qq * (1.0 / r - 1.0 / cutoff + (r - cutoff) / (cutoff * cutoff))
            }
            Self::Truncated { .. } => qq / r,
            Self::ReactionField { k_rf, c_rf, .. } => qq * (1.0 / r + k_rf * r * r - c_rf),
        }
    }

    /// Radial force magnitude `-dE/dr`; positive is repulsive.
    #[inline]
    pub fn force(&self, r: f64, qq: f64) -> Option<f64> {
        if r >= self.cutoff() {
            return self.has_forces().then_some(0.0);
        }
        match *self {
            Self::Shifted { cutoff } => Some(qq * (1.0 / (r * r) - 1.0 / (cutoff * cutoff))),
            Self::Truncated { .. } => Some(qq / (r * r)),
            Self::ReactionField { .. } => None,
        }
    }

    #[inline]
    pub fn energy_lanes(&self, r: FloatLane, inv_r: FloatLane, qq: FloatLane) -> FloatLane {
        let rc = self.cutoff() as f32;
        let within = r.cmp_lt(FloatLane::splat(rc));
        let energy = match *self {
            Self::Shifted { .. } => {
                let inv_rc = FloatLane::splat(1.0 / rc);
                let inv_rc2 = FloatLane::splat(1.0 / (rc * rc));
                qq * ((inv_r - inv_rc) + (r - FloatLane::splat(rc)) * inv_rc2)
            }
            Self::Truncated { .. } => qq * inv_r,
            Self::ReactionField { k_rf, c_rf, .. } => {
                let k = FloatLane::splat(k_rf as f32);
                let c = FloatLane::splat(c_rf as f32);
                qq * (inv_r + k * r * r - c)
            }
        };
        energy.masked(within)
    }

    /// Lane radial force magnitude. Reaction field yields zero lanes; callers
    /// check [`CoulombScheme::has_forces`] first.
    #[inline]
    pub fn force_lanes(&self, r: FloatLane, inv_r: FloatLane, qq: FloatLane) -> FloatLane {
        let rc = self.cutoff() as f32;
        let within = r.cmp_lt(FloatLane::splat(rc));
        let inv_r2 = inv_r * inv_r;
        let force = match *self {
            Self::Shifted { .. } => qq * (inv_r2 - FloatLane::splat(1.0 / (rc * rc))),
            Self::Truncated { .. } => qq * inv_r2,
            Self::ReactionField { .. } => FloatLane::zero(),
        };
        force.masked(within)
    }
}

#[inline]
pub fn lennard_jones_12_6(r: f64, sigma: f64, epsilon: f64) -> f64 {
    let s2 = (sigma * sigma) / (r * r);
    let s6 = s2 * s2 * s2;
    4.0 * epsilon * (s6 * s6 - s6)
}

/// Radial force magnitude of [`lennard_jones_12_6`]; positive is repulsive.
#[inline]
pub fn lennard_jones_12_6_force(r: f64, sigma: f64, epsilon: f64) -> f64 {
    let s2 = (sigma * sigma) / (r * r);
    let s6 = s2 * s2 * s2;
    24.0 * epsilon * (2.0 * s6 * s6 - s6) / r
}

/// LJ energy and radial force lanes, zero at and beyond `cutoff`.
#[inline]
pub fn lennard_jones_lanes(
    r: FloatLane,
    inv_r: FloatLane,
    sigma: FloatLane,
    epsilon: FloatLane,
    cutoff: f32,
) -> (FloatLane, FloatLane) {
    let within = r.cmp_lt(FloatLane::splat(cutoff));
    let s = sigma * inv_r;
    let s2 = s * s;
    let s6 = s2 * s2 * s2;
    let s12 = s6 * s6;
    let energy = FloatLane::splat(4.0) * epsilon * (s12 - s6);
    let force = FloatLane::splat(24.0) * epsilon * (FloatLane::splat(2.0) * s12 - s6) * inv_r;
    (energy.masked(within), force.masked(within))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    fn lane_close(lane: FloatLane, expected: f64, rel: f64) -> bool {
        let value = f64::from(lane.at(0).unwrap());
        (value - expected).abs() <= rel * expected.abs().max(1.0)
    }

    #[test]
    fn shifted_coulomb_vanishes_at_and_beyond_cutoff() {
        let scheme = CoulombScheme::Shifted { cutoff: 10.0 };
        assert_eq!(scheme.energy(10.0, COULOMB_CONSTANT), 0.0);
        assert_eq!(scheme.energy(12.0, COULOMB_CONSTANT), 0.0);
        assert!(scheme.energy(10.0 - 1e-9, COULOMB_CONSTANT).abs() < 1e-6);
    }

    #[test]
    fn shifted_coulomb_is_weaker_than_bare_coulomb_for_opposite_charges() {
        let scheme = CoulombScheme::Shifted { cutoff: 10.0 };
        let qq = -COULOMB_CONSTANT;
        let shifted = scheme.energy(2.0, qq);
        let bare = qq / 2.0;
        assert!(shifted < 0.0);
        assert!(shifted.abs() < bare.abs());
    }

    #[test]
    fn shifted_coulomb_force_matches_numerical_derivative() {
        let scheme = CoulombScheme::Shifted { cutoff: 9.0 };
        let h = 1e-6;
        for r in [1.5, 4.0, 8.5] {
            let numeric = -(scheme.energy(r + h, 2.0) - scheme.energy(r - h, 2.0)) / (2.0 * h);
            let analytic = scheme.force(r, 2.0).unwrap();
            assert!((numeric - analytic).abs() < 1e-5, "r = {r}");
        }
    }

    #[test]
    fn truncated_coulomb_is_bare_inside_cutoff() {
        let scheme = CoulombScheme::Truncated { cutoff: 10.0 };
        assert!(f64_approx_equal(scheme.energy(2.0, 4.0), 2.0));
        assert!(f64_approx_equal(scheme.force(2.0, 4.0).unwrap(), 1.0));
        assert_eq!(scheme.energy(10.0, 4.0), 0.0);
    }

    #[test]
    fn reaction_field_vanishes_at_cutoff_and_has_no_forces() {
        let scheme = CoulombScheme::reaction_field(12.0, 78.5);
        assert!(scheme.energy(12.0 - 1e-9, 1.0).abs() < 1e-8);
        assert!(!scheme.has_forces());
        assert_eq!(scheme.force(3.0, 1.0), None);
    }

    #[test]
    fn reaction_field_with_unit_dielectric_matches_shift_by_inverse_cutoff() {
        let scheme = CoulombScheme::reaction_field(10.0, 1.0);
        assert!(f64_approx_equal(scheme.energy(2.0, 1.0), 0.5 - 0.1));
    }

    #[test]
    fn lennard_jones_is_zero_at_sigma() {
        assert!(f64_approx_equal(lennard_jones_12_6(3.0, 3.0, 1.0), 0.0));
    }

    #[test]
    fn lennard_jones_minimum_is_minus_epsilon() {
        let r_min = 2f64.powf(1.0 / 6.0) * 3.0;
        assert!(f64_approx_equal(lennard_jones_12_6(r_min, 3.0, 0.5), -0.5));
        assert!(lennard_jones_12_6_force(r_min, 3.0, 0.5).abs() < 1e-9);
    }

    #[test]
    fn lennard_jones_force_matches_numerical_derivative() {
        let h = 1e-6;
        for r in [2.8, 3.4, 6.0] {
            let numeric =
                -(lennard_jones_12_6(r + h, 3.0, 0.2) - lennard_jones_12_6(r - h, 3.0, 0.2))
                    / (2.0 * h);
            let analytic = lennard_jones_12_6_force(r, 3.0, 0.2);
            assert!((numeric - analytic).abs() < 1e-6, "r = {r}");
        }
    }

    #[test]
    fn lane_forms_match_scalar_forms() {
        let r = 3.7f64;
        let r_lane = FloatLane::splat(r as f32);
        let inv = r_lane.recip();
        let qq = FloatLane::splat(-COULOMB_CONSTANT as f32);

        let scheme = CoulombScheme::Shifted { cutoff: 10.0 };
        assert!(lane_close(
            scheme.energy_lanes(r_lane, inv, qq),
            scheme.energy(r, -COULOMB_CONSTANT),
            1e-5
        ));
        assert!(lane_close(
            scheme.force_lanes(r_lane, inv, qq),
            scheme.force(r, -COULOMB_CONSTANT).unwrap(),
            1e-5
        ));

        let (e, f) = lennard_jones_lanes(
            r_lane,
            inv,
            FloatLane::splat(3.2),
            FloatLane::splat(0.15),
            10.0,
        );
        assert!(lane_close(e, lennard_jones_12_6(r, 3.2, 0.15), 1e-5));
        assert!(lane_close(f, lennard_jones_12_6_force(r, 3.2, 0.15), 1e-5));
    }

    #[test]
    fn lane_forms_are_masked_beyond_cutoff() {
        let r = FloatLane::from_array([1.0, 2.0, 5.0, 9.99, 10.0, 10.5, 20.0, 100.0]);
        let inv = r.recip();
        let scheme = CoulombScheme::Shifted { cutoff: 10.0 };
        let energy = scheme.energy_lanes(r, inv, FloatLane::splat(1.0)).to_array();
        let (lj, _) = lennard_jones_lanes(r, inv, FloatLane::splat(3.0), FloatLane::splat(1.0), 10.0);
        for k in 4..8 {
            assert_eq!(energy[k], 0.0);
            assert_eq!(lj.to_array()[k], 0.0);
        }
        assert!(energy[0] > 0.0);
    }
}
