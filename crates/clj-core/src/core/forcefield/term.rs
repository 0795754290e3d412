use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CljEnergy {
    pub coulomb: f64,
    pub lj: f64,
}

impl CljEnergy {
    pub fn new(coulomb: f64, lj: f64) -> Self {
        Self { coulomb, lj }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.coulomb + self.lj
    }
}

impl Add for CljEnergy {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            coulomb: self.coulomb + rhs.coulomb,
            lj: self.lj + rhs.lj,
        }
    }
}

impl AddAssign for CljEnergy {
    fn add_assign(&mut self, rhs: Self) {
        self.coulomb += rhs.coulomb;
        self.lj += rhs.lj;
    }
}

impl Mul<f64> for CljEnergy {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self {
            coulomb: self.coulomb * rhs,
            lj: self.lj * rhs,
        }
    }
}

impl Sum for CljEnergy {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
