use super::{FloatLane, LaneError};
use std::fmt;
use std::ops::{Add, BitAnd, BitOr, BitXor, Mul, Not, Sub};
use wide::{CmpEq, CmpGt, CmpLt, i32x8};

pub const INT_WIDTH: usize = 8;

#[derive(Clone, Copy, Default)]
pub struct IntLane(i32x8);

impl IntLane {
    #[inline]
    pub fn splat(value: i32) -> Self {
        Self(i32x8::splat(value))
    }

    #[inline]
    pub fn zero() -> Self {
        Self::splat(0)
    }

    #[inline]
    pub fn from_array(values: [i32; INT_WIDTH]) -> Self {
        Self(i32x8::new(values))
    }

    /// Packs up to [`INT_WIDTH`] values, filling the remaining lanes with `pad`.
    pub fn from_slice_padded(values: &[i32], pad: i32) -> Result<Self, LaneError> {
        if values.len() > INT_WIDTH {
            return Err(LaneError::UnsupportedSize {
                size: values.len(),
                width: INT_WIDTH,
            });
        }
        let mut lanes = [pad; INT_WIDTH];
        lanes[..values.len()].copy_from_slice(values);
        Ok(Self::from_array(lanes))
    }

    pub fn from_slice(values: &[i32]) -> Result<Self, LaneError> {
        Self::from_slice_padded(values, 0)
    }

    #[inline]
    pub fn to_array(self) -> [i32; INT_WIDTH] {
        self.0.to_array()
    }

    pub fn at(self, index: usize) -> Result<i32, LaneError> {
        self.to_array()
            .get(index)
            .copied()
            .ok_or(LaneError::InvalidIndex {
                index,
                width: INT_WIDTH,
            })
    }

    pub fn with_lane(self, index: usize, value: i32) -> Result<Self, LaneError> {
        let mut lanes = self.to_array();
        let slot = lanes.get_mut(index).ok_or(LaneError::InvalidIndex {
            index,
            width: INT_WIDTH,
        })?;
        *slot = value;
        Ok(Self::from_array(lanes))
    }

    #[inline]
    pub fn all_true() -> Self {
        Self::splat(-1)
    }

    #[inline]
    pub fn cmp_eq(self, other: Self) -> Self {
        Self(self.0.cmp_eq(other.0))
    }

    #[inline]
    pub fn cmp_ne(self, other: Self) -> Self {
        !self.cmp_eq(other)
    }

    #[inline]
    pub fn cmp_lt(self, other: Self) -> Self {
        Self(self.0.cmp_lt(other.0))
    }

    #[inline]
    pub fn cmp_le(self, other: Self) -> Self {
        !self.cmp_gt(other)
    }

    #[inline]
    pub fn cmp_gt(self, other: Self) -> Self {
        Self(self.0.cmp_gt(other.0))
    }

    #[inline]
    pub fn cmp_ge(self, other: Self) -> Self {
        !self.cmp_lt(other)
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
    pub fn min(self, other: Self) -> Self {
        Self::select(self.cmp_lt(other), self, other)
    }

    #[inline]
    pub fn max(self, other: Self) -> Self {
        Self::select(self.cmp_gt(other), self, other)
    }

    #[inline]
    pub fn rotate(self) -> Self {
        let mut lanes = self.to_array();
        lanes.rotate_left(1);
        Self::from_array(lanes)
    }

    /// Wrapping horizontal sum.
    pub fn sum(self) -> i32 {
        self.to_array().iter().fold(0i32, |acc, &v| acc.wrapping_add(v))
    }

    pub fn sum_i64(self) -> i64 {
        self.to_array().iter().map(|&v| i64::from(v)).sum()
    }

    /// Reinterprets an integer mask as a [`FloatLane`] mask, bit for bit.
    pub fn to_float_mask(self) -> FloatLane {
        FloatLane::from_bits(self.to_array().map(|v| v as u32))
    }

    pub fn is_all_zero(self) -> bool {
        self.to_array().iter().all(|&v| v == 0)
    }

    pub fn has_true(self) -> bool {
        !self.is_all_zero()
    }
}

impl fmt::Debug for IntLane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IntLane").field(&self.to_array()).finish()
    }
}

impl PartialEq for IntLane {
    fn eq(&self, other: &Self) -> bool {
        self.to_array() == other.to_array()
    }
}

impl Eq for IntLane {}

impl Add for IntLane {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for IntLane {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul for IntLane {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl BitAnd for IntLane {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for IntLane {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitXor for IntLane {
    type Output = Self;

    #[inline]
    fn bitxor(self, rhs: Self) -> Self::Output {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for IntLane {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        self ^ Self::all_true()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_padded_fills_with_requested_sentinel() {
        let lane = IntLane::from_slice_padded(&[4, 5], i32::MIN).unwrap();
        assert_eq!(lane.at(1), Ok(5));
        assert_eq!(lane.at(2), Ok(i32::MIN));
        assert!(IntLane::from_slice(&[0; 9]).is_err());
    }

    #[test]
    fn equality_mask_is_all_ones_where_equal() {
        let lane = IntLane::from_array([1, 2, 3, 1, 2, 3, 1, 2]);
        let mask = lane.cmp_eq(IntLane::splat(1));
        assert_eq!(mask.to_array(), [-1, 0, 0, -1, 0, 0, -1, 0]);
        assert_eq!(lane.cmp_ne(IntLane::splat(1)), !mask);
    }

    #[test]
    fn ordering_masks_are_consistent() {
        let lane = IntLane::from_array([0, 1, 2, 3, 4, 5, 6, 7]);
        let pivot = IntLane::splat(4);
        assert_eq!(lane.cmp_lt(pivot) | lane.cmp_ge(pivot), IntLane::all_true());
        assert!((lane.cmp_le(pivot) & lane.cmp_gt(pivot)).is_all_zero());
        assert_eq!(lane.min(pivot).at(7), Ok(4));
        assert_eq!(lane.max(pivot).at(0), Ok(4));
    }

    #[test]
    fn float_mask_keeps_bit_pattern() {
        let mask = IntLane::from_array([-1, 0, -1, 0, 0, 0, 0, -1]).to_float_mask();
        assert_eq!(mask.count_true(), 3);
        let kept = FloatLane::splat(2.0).masked(mask).to_array();
        assert_eq!(kept, [2.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn sum_and_rotate_behave_like_scalar_loops() {
        let lane = IntLane::splat(3);
        assert_eq!(lane.sum(), 24);
        assert_eq!(IntLane::splat(i32::MAX).sum_i64(), 8 * i64::from(i32::MAX));
        let ramp = IntLane::from_array([0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(ramp.rotate().to_array(), [1, 2, 3, 4, 5, 6, 7, 0]);
        assert_eq!((ramp + ramp - ramp * IntLane::splat(2)), IntLane::zero());
    }
}
