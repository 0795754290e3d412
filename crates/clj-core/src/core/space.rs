use super::lanes::FloatLane;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpaceError {
    #[error("Periodic box dimensions must be positive and finite, got {0:?}")]
    InvalidBox([f64; 3]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Aabb {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |acc, p| Self {
            min: acc.min.inf(p),
            max: acc.max.sup(p),
        }))
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn half_extents(&self) -> Vector3<f64> {
        (self.max - self.min) * 0.5
    }

    pub fn contains(&self, point: &Point3<f64>) -> bool {
        (0..3).all(|k| point[k] >= self.min[k] && point[k] <= self.max[k])
    }

    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicBox {
    dimensions: Vector3<f64>,
}

impl PeriodicBox {
    pub fn new(dimensions: [f64; 3]) -> Result<Self, SpaceError> {
        if dimensions.iter().any(|&d| !(d.is_finite() && d > 0.0)) {
            return Err(SpaceError::InvalidBox(dimensions));
        }
        Ok(Self {
            dimensions: Vector3::from(dimensions),
        })
    }

    pub fn cubic(length: f64) -> Result<Self, SpaceError> {
        Self::new([length; 3])
    }

    pub fn dimensions(&self) -> Vector3<f64> {
        self.dimensions
    }

    pub fn volume(&self) -> f64 {
        self.dimensions.product()
    }

    #[inline]
    fn wrap_component(d: f64, length: f64) -> f64 {
        let folded = d - length * (d / length).trunc();
        if folded.abs() > 0.5 * length {
            folded - length * folded.signum()
        } else {
            folded
        }
    }
}

/// Boundary conditions under which pair separations are measured.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Space {
    #[default]
    Vacuum,
    Periodic(PeriodicBox),
}

impl Space {
    pub fn periodic(dimensions: [f64; 3]) -> Result<Self, SpaceError> {
        PeriodicBox::new(dimensions).map(Self::Periodic)
    }

    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic(_))
    }

    /// Shortest displacement equivalent to `delta`. Components already inside
    /// `[-L/2, L/2]` are returned unchanged.
    pub fn min_image(&self, delta: Vector3<f64>) -> Vector3<f64> {
        match self {
            Self::Vacuum => delta,
            Self::Periodic(cell) => Vector3::new(
                PeriodicBox::wrap_component(delta.x, cell.dimensions.x),
                PeriodicBox::wrap_component(delta.y, cell.dimensions.y),
                PeriodicBox::wrap_component(delta.z, cell.dimensions.z),
            ),
        }
    }

    /// Lane form of [`Space::min_image`] for separations of atoms that lie in the
    /// primary box, so that every component is already within `(-L, L)`.
    #[inline]
    pub fn min_image_lanes(
        &self,
        dx: FloatLane,
        dy: FloatLane,
        dz: FloatLane,
    ) -> (FloatLane, FloatLane, FloatLane) {
        match self {
            Self::Vacuum => (dx, dy, dz),
            Self::Periodic(cell) => (
                wrap_lane(dx, cell.dimensions.x as f32),
                wrap_lane(dy, cell.dimensions.y as f32),
                wrap_lane(dz, cell.dimensions.z as f32),
            ),
        }
    }

    pub fn distance(&self, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
        self.min_image(b - a).norm()
    }

    /// Folds a point into the primary box `[0, L)`. Vacuum leaves it unchanged.
    pub fn wrap_point(&self, point: &Point3<f64>) -> Point3<f64> {
        match self {
            Self::Vacuum => *point,
            Self::Periodic(cell) => Point3::new(
                point.x.rem_euclid(cell.dimensions.x),
                point.y.rem_euclid(cell.dimensions.y),
                point.z.rem_euclid(cell.dimensions.z),
            ),
        }
    }

    /// Smallest possible distance between any point of `a` and any point of `b`.
    pub fn min_distance(&self, a: &Aabb, b: &Aabb) -> f64 {
        let separation = self.min_image(b.center() - a.center());
        let reach = a.half_extents() + b.half_extents();
        separation
            .abs()
            .zip_map(&reach, |s, r| (s - r).max(0.0))
            .norm()
    }

    /// Largest distance between any point of `a` and any point of `b`.
    pub fn max_distance(&self, a: &Aabb, b: &Aabb) -> f64 {
        let separation = self.min_image(b.center() - a.center());
        (separation.abs() + a.half_extents() + b.half_extents()).norm()
    }

    /// Bounding-box pre-filter: true when no pair drawn from the two boxes can
    /// be closer than `cutoff`.
    pub fn beyond(&self, cutoff: f64, a: &Aabb, b: &Aabb) -> bool {
        self.min_distance(a, b) >= cutoff
    }
}

#[inline]
fn wrap_lane(d: FloatLane, length: f32) -> FloatLane {
    let half = FloatLane::splat(0.5 * length);
    let box_len = FloatLane::splat(length);
    let zero = FloatLane::zero();
    let too_far = d.abs().cmp_gt(half);
    let shift = FloatLane::select(d.cmp_gt(zero), box_len, -box_len);
    d - shift.masked(too_far)
}
