use super::{DoubleLane, LaneError};
use std::fmt;
use std::ops::{
    Add, AddAssign, BitAnd, BitOr, BitXor, Div, Mul, MulAssign, Neg, Not, Sub, SubAssign,
};
use wide::{CmpEq, CmpGe, CmpGt, CmpLe, CmpLt, CmpNe, f32x8};

pub const FLOAT_WIDTH: usize = 8;

const ALL_ONES: u32 = u32::MAX;

#[derive(Clone, Copy, Default)]
pub struct FloatLane(f32x8);

impl FloatLane {
    #[inline]
    pub fn splat(value: f32) -> Self {
        Self(f32x8::splat(value))
    }

    #[inline]
    pub fn zero() -> Self {
        Self::splat(0.0)
    }

    #[inline]
    pub fn from_array(values: [f32; FLOAT_WIDTH]) -> Self {
        Self(f32x8::new(values))
    }

    /// Packs up to [`FLOAT_WIDTH`] values, padding the remaining lanes with zero.
    pub fn from_slice(values: &[f32]) -> Result<Self, LaneError> {
        if values.len() > FLOAT_WIDTH {
            return Err(LaneError::UnsupportedSize {
                size: values.len(),
                width: FLOAT_WIDTH,
            });
        }
        let mut lanes = [0.0; FLOAT_WIDTH];
        lanes[..values.len()].copy_from_slice(values);
        Ok(Self::from_array(lanes))
    }

    #[inline]
    pub fn to_array(self) -> [f32; FLOAT_WIDTH] {
        self.0.to_array()
    }

    pub fn at(self, index: usize) -> Result<f32, LaneError> {
        self.to_array()
            .get(index)
            .copied()
            .ok_or(LaneError::InvalidIndex {
                index,
                width: FLOAT_WIDTH,
            })
    }

    pub fn with_lane(self, index: usize, value: f32) -> Result<Self, LaneError> {
        let mut lanes = self.to_array();
        let slot = lanes.get_mut(index).ok_or(LaneError::InvalidIndex {
            index,
            width: FLOAT_WIDTH,
        })?;
        *slot = value;
        Ok(Self::from_array(lanes))
    }

    /// Mask with every bit of every lane set.
    #[inline]
    pub fn all_true() -> Self {
        Self::splat(f32::from_bits(ALL_ONES))
    }

    #[inline]
    pub fn from_bits(bits: [u32; FLOAT_WIDTH]) -> Self {
        Self::from_array(bits.map(f32::from_bits))
    }

    #[inline]
    pub fn to_bits(self) -> [u32; FLOAT_WIDTH] {
        self.to_array().map(f32::to_bits)
    }

    /// Computes `self * m + a`.
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
        Self(f32x8::ONE / self.0)
    }

    /// Hardware reciprocal estimate, roughly 12 bits of precision.
    #[inline]
    pub fn recip_approx(self) -> Self {
        Self(self.0.recip())
    }

    /// Reciprocal estimate refined with one Newton-Raphson step.
    #[inline]
    pub fn recip_approx_nr(self) -> Self {
        let x0 = self.recip_approx();
        x0 * (Self::splat(2.0) - self * x0)
    }

    #[inline]
    pub fn rsqrt_approx(self) -> Self {
        Self(self.0.recip_sqrt())
    }

    /// `sqrt` through the reciprocal square-root estimate. Zero lanes stay zero.
    #[inline]
    pub fn sqrt_approx(self) -> Self {
        let zero = Self::zero();
        Self::select(self.cmp_eq(zero), zero, self * self.rsqrt_approx())
    }

    #[inline]
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

    /// `!self & other`, matching the x86 `andnot` operand order.
    #[inline]
    pub fn and_not(self, other: Self) -> Self {
        !self & other
    }

    /// Picks `if_true` where `mask` is set and `if_false` elsewhere.
    #[inline]
    pub fn select(mask: Self, if_true: Self, if_false: Self) -> Self {
        Self(mask.0.blend(if_true.0, if_false.0))
    }

    /// Keeps lanes where `mask` is set and zeroes the rest.
    #[inline]
    pub fn masked(self, mask: Self) -> Self {
        self & mask
    }

    /// Cyclic shift left by one lane: lane `i` receives lane `i + 1`.
    #[inline]
    pub fn rotate(self) -> Self {
        let mut lanes = self.to_array();
        lanes.rotate_left(1);
        Self::from_array(lanes)
    }

    #[inline]
    pub fn sum(self) -> f32 {
        self.to_array().iter().sum()
    }

    #[inline]
    pub fn sum_f64(self) -> f64 {
        self.to_array().iter().map(|&v| f64::from(v)).sum()
    }

    pub fn widen(self) -> [DoubleLane; 2] {
        let lanes = self.to_array().map(f64::from);
        [
            DoubleLane::from_array([lanes[0], lanes[1], lanes[2], lanes[3]]),
            DoubleLane::from_array([lanes[4], lanes[5], lanes[6], lanes[7]]),
        ]
    }

    pub fn is_all_zero(self) -> bool {
        self.to_bits().iter().all(|&b| b == 0)
    }

    pub fn has_true(self) -> bool {
        !self.is_all_zero()
    }

    pub fn count_true(self) -> usize {
        self.to_bits().iter().filter(|&&b| b != 0).count()
    }
}

impl From<[f32; FLOAT_WIDTH]> for FloatLane {
    fn from(values: [f32; FLOAT_WIDTH]) -> Self {
        Self::from_array(values)
    }
}

impl fmt::Debug for FloatLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FloatLane").field(&self.to_array()).finish()
    }
}

impl PartialEq for FloatLane {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

impl Add for FloatLane {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for FloatLane {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0 + rhs.0;
    }
}

impl Sub for FloatLane {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for FloatLane {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.0 = self.0 - rhs.0;
    }
}

impl Mul for FloatLane {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl MulAssign for FloatLane {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        self.0 = self.0 * rhs.0;
    }
}

impl Div for FloatLane {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self::Output {
        Self(self.0 / rhs.0)
    }
}

impl Neg for FloatLane {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl BitAnd for FloatLane {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for FloatLane {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitXor for FloatLane {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for FloatLane {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        self ^ Self::all_true()
    }
}
