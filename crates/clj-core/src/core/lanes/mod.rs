//! # Numeric Lanes
//!
//! Fixed-width vector types used by every hot loop of the non-bonded kernel.
//!
//! ## Overview
//!
//! Each lane type wraps a `wide` SIMD register and exposes pure value semantics:
//! every operation returns a new lane of the same width. Comparisons produce masks
//! of the same type whose lanes are either all-ones or all-zeros, which are combined
//! with the bitwise operators and consumed by [`FloatLane::select`] so that the
//! kernel never branches per lane.
//!
//! - [`FloatLane`] - 8 × `f32`, the working precision of the pair terms
//! - [`DoubleLane`] - 4 × `f64`, used for widening and accumulation
//! - [`IntLane`] - 8 × `i32`, carries atom identifiers alongside a [`FloatLane`]
//! - [`LaneAccumulator`] - per-lane `f64` running sums of [`FloatLane`] values

mod accumulator;
mod double;
mod float;
mod int;

pub use accumulator::LaneAccumulator;
pub use double::{DOUBLE_WIDTH, DoubleLane};
pub use float::{FLOAT_WIDTH, FloatLane};
pub use int::{INT_WIDTH, IntLane};

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LaneError {
    #[error("Cannot pack {size} values into a lane of width {width}")]
    UnsupportedSize { size: usize, width: usize },
    #[error("Lane index {index} is out of range for width {width}")]
    InvalidIndex { index: usize, width: usize },
}
