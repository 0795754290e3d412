use super::{DoubleLane, FloatLane};

/// Running per-lane sums of [`FloatLane`] values held in double precision.
///
/// Pair terms are evaluated in single precision but millions of them are summed
/// per evaluation; widening each batch before adding bounds the rounding error
/// of the total to that of an `f64` sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LaneAccumulator {
    lo: DoubleLane,
    hi: DoubleLane,
}

impl LaneAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&mut self, value: FloatLane) {
        let [lo, hi] = value.widen();
        self.lo += lo;
        self.hi += hi;
    }

    #[inline]
    pub fn add_scalar(&mut self, value: f64) {
        self.lo += DoubleLane::from_array([value, 0.0, 0.0, 0.0]);
    }

    pub fn merge(&mut self, other: &Self) {
        self.lo += other.lo;
        self.hi += other.hi;
    }

    pub fn sum(&self) -> f64 {
        self.lo.sum() + self.hi.sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_in_double_precision() {
        let mut acc = LaneAccumulator::new();
        let tiny = FloatLane::splat(1e-8);
        acc.add(FloatLane::splat(1.0));
        for _ in 0..1000 {
            acc.add(tiny);
        }
        let expected = 8.0 + 8.0 * 1000.0 * f64::from(1e-8f32);
        assert!((acc.sum() - expected).abs() < 1e-10);
    }

    #[test]
    fn merge_and_scalar_addition_combine_totals() {
        let mut a = LaneAccumulator::new();
        let mut b = LaneAccumulator::new();
        a.add(FloatLane::splat(0.5));
        b.add_scalar(2.0);
        a.merge(&b);
        assert_eq!(a.sum(), 6.0);
    }
}
