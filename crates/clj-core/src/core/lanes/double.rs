use super::LaneError;
use std::fmt;
use std::ops::{Add, AddAssign, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Sub};
use wide::{CmpEq, CmpGe, CmpGt, CmpLe, CmpLt, CmpNe, f64x4};

pub const DOUBLE_WIDTH: usize = 4;

#[derive(Clone, Copy, Default)]
pub struct DoubleLane(f64x4);

impl DoubleLane {
    #[inline]
    pub fn splat(value: f64) -> Self {
        Self(f64x4::splat(value))
    }

    #[inline]
    pub fn zero() -> Self {
        Self::splat(0.0)
    }

    #[inline]
    pub fn from_array(values: [f64; DOUBLE_WIDTH]) -> Self {
        Self(f64x4::new(values))
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, LaneError> {
        if values.len() > DOUBLE_WIDTH {
            return Err(LaneError::UnsupportedSize {
                size: values.len(),
                width: DOUBLE_WIDTH,
            });
        }
        let mut lanes = [0.0; DOUBLE_WIDTH];
        lanes[..values.len()].copy_from_slice(values);
        Ok(Self::from_array(lanes))
    }

    #[inline]
    pub fn to_array(self) -> [f64; DOUBLE_WIDTH] {
        self.0.to_array()
    }

    pub fn at(self, index: usize) -> Result<f64, LaneError> {
        self.to_array()
            .get(index)
            .copied()
            .ok_or(LaneError::InvalidIndex {
                index,
                width: DOUBLE_WIDTH,
            })
    }

    pub fn with_lane(self, index: usize, value: f64) -> Result<Self, LaneError> {
        let mut lanes = self.to_array();
        let slot = lanes.get_mut(index).ok_or(LaneError::InvalidIndex {
            index,
            width: DOUBLE_WIDTH,
        })?;
        *slot = value;
        Ok(Self::from_array(lanes))
    }

    #[inline]
    pub fn all_true() -> Self {
        Self::splat(f64::from_bits(u64::MAX))
    }

    #[inline]
    pub fn to_bits(self) -> [u64; DOUBLE_WIDTH] {
        self.to_array().map(f64::to_bits)
    }

    #[inline]
    pub fn mul_add(self, m: Self, a: Self) -> Self {
        Self(self.0.mul_add(m.0, a.0))
    }

    #[inline]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self(self.0.max(other.0))
    }

    #[inline]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    #[inline]
    pub fn sqrt(self) -> Self {
        Self(self.0.sqrt())
    }

    #[inline]
    pub fn recip(self) -> Self {
        Self(f64x4::ONE / self.0)
    }

    /// Single-precision reciprocal estimate promoted back to double.
    pub fn recip_approx(self) -> Self {
        Self::from_array(self.to_array().map(|v| f64::from(1.0f32 / v as f32)))
    }

    pub fn recip_approx_nr(self) -> Self {
        let x0 = self.recip_approx();
        x0 * (Self::splat(2.0) - self * x0)
    }

    pub fn rsqrt_approx(self) -> Self {
        Self::from_array(
            self.to_array()
                .map(|v| f64::from(1.0f32 / (v as f32).sqrt())),
        )
    }

    pub fn sqrt_approx(self) -> Self {
        let zero = Self::zero();
        Self::select(self.cmp_eq(zero), zero, self * self.rsqrt_approx())
    }

    pub fn sqrt_approx_nr(self) -> Self {
        let y0 = self.rsqrt_approx();
        let y1 = y0 * (Self::splat(1.5) - Self::splat(0.5) * self * y0 * y0);
        let zero = Self::zero();
        Self::select(self.cmp_eq(zero), zero, self * y1)
    }

    #[inline]
    pub fn cmp_eq(self, other: Self) -> Self {
        Self(self.0.cmp_eq(other.0))
    }

    #[inline]
    pub fn cmp_ne(self, other: Self) -> Self {
        Self(self.0.cmp_ne(other.0))
    }

    #[inline]
    pub fn cmp_lt(self, other: Self) -> Self {
        Self(self.0.cmp_lt(other.0))
    }

    #[inline]
    pub fn cmp_le(self, other: Self) -> Self {
        Self(self.0.cmp_le(other.0))
    }

    #[inline]
    pub fn cmp_gt(self, other: Self) -> Self {
        Self(self.0.cmp_gt(other.0))
    }

    #[inline]
    pub fn cmp_ge(self, other: Self) -> Self {
        Self(self.0.cmp_ge(other.0))
    }

    #[inline]
    pub fn and_not(self, other: Self) -> Self {
        !self & other
    }

    #[inline]
    pub fn select(mask: Self, if_true: Self, if_false: Self) -> Self {
        Self(mask.0.blend(if_true.0, if_false.0))
    }

    #[inline]
    pub fn rotate(self) -> Self {
        let mut lanes = self.to_array();
        lanes.rotate_left(1);
        Self::from_array(lanes)
    }

    #[inline]
    pub fn sum(self) -> f64 {
        self.to_array().iter().sum()
    }

    pub fn is_all_zero(self) -> bool {
        self.to_bits().iter().all(|&b| b == 0)
    }

    pub fn has_true(self) -> bool {
        !self.is_all_zero()
    }
}

impl fmt::Debug for DoubleLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DoubleLane").field(&self.to_array()).finish()
    }
}

impl PartialEq for DoubleLane {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

impl Add for DoubleLane {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for DoubleLane {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0 + rhs.0;
    }
}

impl Sub for DoubleLane {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul for DoubleLane {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl Div for DoubleLane {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self::Output {
        Self(self.0 / rhs.0)
    }
}

impl Neg for DoubleLane {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl BitAnd for DoubleLane {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for DoubleLane {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitXor for DoubleLane {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for DoubleLane {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        self ^ Self::all_true()
    }
}
