use crate::core::lanes::FloatLane;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CutoffError {
    #[error("The {name} cutoff must be positive and finite, got {value}")]
    InvalidCutoff { name: &'static str, value: f64 },
    #[error("Feather distance {feather} must lie in (0, {cutoff}]")]
    FeatherBeyondCutoff { feather: f64, cutoff: f64 },
}

/// Cutoff radii (Å) shared by one kernel.
///
/// `feather` is where LJ switching starts; it reaches zero at `lj_cutoff`.
/// Electrostatics are never switched, they are shifted when
/// `shift_electrostatics` is set and hard-truncated otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffConfig {
    coulomb_cutoff: f64,
    lj_cutoff: f64,
    feather: f64,
    shift_electrostatics: bool,
}

impl CutoffConfig {
    pub fn new(
        coulomb_cutoff: f64,
        lj_cutoff: f64,
        feather: f64,
        shift_electrostatics: bool,
    ) -> Result<Self, CutoffError> {
        for (name, value) in [("coulomb", coulomb_cutoff), ("lj", lj_cutoff)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CutoffError::InvalidCutoff { name, value });
            }
        }
        if !(feather.is_finite() && feather > 0.0 && feather <= lj_cutoff) {
            return Err(CutoffError::FeatherBeyondCutoff {
                feather,
                cutoff: lj_cutoff,
            });
        }
        Ok(Self {
            coulomb_cutoff,
            lj_cutoff,
            feather,
            shift_electrostatics,
        })
    }

    /// Same cutoff for both terms, no switching, shifted electrostatics.
    pub fn uniform(cutoff: f64) -> Result<Self, CutoffError> {
        Self::new(cutoff, cutoff, cutoff, true)
    }

    pub fn coulomb_cutoff(&self) -> f64 {
        self.coulomb_cutoff
    }

    pub fn lj_cutoff(&self) -> f64 {
        self.lj_cutoff
    }

    pub fn feather(&self) -> f64 {
        self.feather
    }

    pub fn shift_electrostatics(&self) -> bool {
        self.shift_electrostatics
    }

    pub fn max_cutoff(&self) -> f64 {
        self.coulomb_cutoff.max(self.lj_cutoff)
    }

    pub fn switching_active(&self) -> bool {
        self.feather < self.lj_cutoff
    }

    pub fn switching(&self) -> SwitchingFunction {
        SwitchingFunction::new(self.feather, self.lj_cutoff)
    }
}

impl Default for CutoffConfig {
    fn default() -> Self {
        Self {
            coulomb_cutoff: 15.0,
            lj_cutoff: 15.0,
            feather: 14.5,
            shift_electrostatics: true,
        }
    }
}

/// CHARMM-style polynomial switch between `r_on` and `r_off`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchingFunction {
    r_on: f64,
    r_off: f64,
}

impl SwitchingFunction {
    pub fn new(r_on: f64, r_off: f64) -> Self {
        Self { r_on, r_off }
    }

    pub fn r_on(&self) -> f64 {
        self.r_on
    }

    pub fn r_off(&self) -> f64 {
        self.r_off
    }

    /// Returns `(S, dS/dr)` at distance `r`.
    pub fn evaluate(&self, r: f64) -> (f64, f64) {
        if r <= self.r_on {
            return (1.0, 0.0);
        }
        if r >= self.r_off {
            return (0.0, 0.0);
        }
        let r2 = r * r;
        let on2 = self.r_on * self.r_on;
        let off2 = self.r_off * self.r_off;
        let denom = (off2 - on2).powi(3);
        let s = (off2 - r2).powi(2) * (off2 + 2.0 * r2 - 3.0 * on2) / denom;
        let ds = 12.0 * r * (off2 - r2) * (on2 - r2) / denom;
        (s, ds)
    }

    pub fn value(&self, r: f64) -> f64 {
        self.evaluate(r).0
    }

    /// Lane form of [`SwitchingFunction::evaluate`].
    #[inline]
    pub fn evaluate_lanes(&self, r: FloatLane) -> (FloatLane, FloatLane) {
        let on = FloatLane::splat(self.r_on as f32);
        let off = FloatLane::splat(self.r_off as f32);
        let on2 = on * on;
        let off2 = off * off;
        let width = off2 - on2;
        let inv_denom = (width * width * width).recip();
        let r2 = r * r;
        let gap = off2 - r2;

        let s = gap * gap * (off2 + FloatLane::splat(2.0) * r2 - FloatLane::splat(3.0) * on2)
            * inv_denom;
        let ds = FloatLane::splat(12.0) * r * gap * (on2 - r2) * inv_denom;

        let inside = r.cmp_le(on);
        let window = r.cmp_gt(on) & r.cmp_lt(off);
        (
            FloatLane::select(inside, FloatLane::splat(1.0), s.masked(window)),
            ds.masked(window),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn new_rejects_non_positive_cutoffs() {
        assert!(matches!(
            CutoffConfig::new(0.0, 10.0, 5.0, true),
            Err(CutoffError::InvalidCutoff { name: "coulomb", .. })
        ));
        assert!(matches!(
            CutoffConfig::new(10.0, f64::INFINITY, 5.0, true),
            Err(CutoffError::InvalidCutoff { name: "lj", .. })
        ));
    }

    #[test]
    fn new_rejects_feather_beyond_lj_cutoff() {
        assert_eq!(
            CutoffConfig::new(10.0, 8.0, 9.0, true),
            Err(CutoffError::FeatherBeyondCutoff {
                feather: 9.0,
                cutoff: 8.0
            })
        );
        assert!(CutoffConfig::new(10.0, 10.0, 0.0, true).is_err());
    }

    #[test]
    fn feather_may_exceed_a_shorter_coulomb_cutoff() {
        let config = CutoffConfig::new(8.0, 12.0, 10.0, true).unwrap();
        assert!(config.switching_active());
        assert_eq!(config.switching().r_on(), 10.0);
        assert_eq!(config.max_cutoff(), 12.0);
    }

    #[test]
    fn uniform_disables_switching() {
        let config = CutoffConfig::uniform(12.0).unwrap();
        assert!(!config.switching_active());
        assert_eq!(config.max_cutoff(), 12.0);
        assert!(config.shift_electrostatics());
    }

    #[test]
    fn switching_is_one_inside_and_zero_outside_the_window() {
        let switch = SwitchingFunction::new(8.0, 10.0);
        assert_eq!(switch.evaluate(5.0), (1.0, 0.0));
        assert_eq!(switch.evaluate(8.0), (1.0, 0.0));
        assert_eq!(switch.evaluate(10.0), (0.0, 0.0));
        assert_eq!(switch.evaluate(12.0), (0.0, 0.0));
    }

    #[test]
    fn switching_is_continuous_at_both_ends() {
        let switch = SwitchingFunction::new(8.0, 10.0);
        let (s_on, ds_on) = switch.evaluate(8.0 + 1e-7);
        let (s_off, ds_off) = switch.evaluate(10.0 - 1e-7);
        assert!((s_on - 1.0).abs() < 1e-6);
        assert!(ds_on.abs() < 1e-5);
        assert!(s_off.abs() < 1e-6);
        assert!(ds_off.abs() < 1e-5);
    }

    #[test]
    fn switching_derivative_matches_finite_difference() {
        let switch = SwitchingFunction::new(8.0, 10.0);
        let h = 1e-6;
        for r in [8.3, 9.0, 9.7] {
            let numeric = (switch.value(r + h) - switch.value(r - h)) / (2.0 * h);
            let (_, analytic) = switch.evaluate(r);
            assert!((numeric - analytic).abs() < 1e-6, "r = {r}");
        }
    }

    #[test]
    fn switching_midpoint_is_one_half() {
        let switch = SwitchingFunction::new(8.0, 10.0);
        let mid = ((64.0 + 100.0) / 2.0f64).sqrt();
        assert!(f64_approx_equal(switch.value(mid), 0.5));
    }

    #[test]
    fn lane_switching_matches_scalar_switching() {
        let switch = SwitchingFunction::new(8.0, 10.0);
        let rs = [1.0f32, 8.0, 8.25, 8.75, 9.0, 9.5, 9.99, 11.0];
        let (s, ds) = switch.evaluate_lanes(FloatLane::from_array(rs));
        for (k, &r) in rs.iter().enumerate() {
            let (s_ref, ds_ref) = switch.evaluate(f64::from(r));
            assert!((f64::from(s.at(k).unwrap()) - s_ref).abs() < 1e-4, "S at r = {r}");
            assert!((f64::from(ds.at(k).unwrap()) - ds_ref).abs() < 1e-3, "dS at r = {r}");
        }
    }
}
