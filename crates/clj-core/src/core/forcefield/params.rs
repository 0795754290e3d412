use crate::core::lanes::FloatLane;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("Atom index {index} is out of range for a table of {n_atoms} atoms")]
    AtomIndex { index: usize, n_atoms: usize },
    #[error("Group index {index} is out of range for a table of {n_groups} groups")]
    GroupIndex { index: usize, n_groups: usize },
    #[error("LJ parameter id {id} is not known to this snapshot ({len} parameters)")]
    InvalidLjId { id: u32, len: usize },
    #[error("Scale table covers {table} atoms but the bond topology has {topology}")]
    AtomCountMismatch { table: usize, topology: usize },
}

/// Lennard-Jones parameters of a single atom: σ in Å and ε in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct LjParameter {
    pub sigma: f64,
    pub epsilon: f64,
}

impl LjParameter {
    pub fn new(sigma: f64, epsilon: f64) -> Self {
        Self { sigma, epsilon }
    }

    pub fn dummy() -> Self {
        Self::default()
    }

    pub fn is_dummy(&self) -> bool {
        self.sigma == 0.0 || self.epsilon == 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CombiningRule {
    #[default]
    Arithmetic,
    Geometric,
}

/// Combined σ/ε for one pair of atoms, always derived from the two source
/// parameters under a given rule.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LjPair {
    pub sigma: f64,
    pub epsilon: f64,
}

impl LjPair {
    pub fn combine(a: &LjParameter, b: &LjParameter, rule: CombiningRule) -> Self {
        let sigma = match rule {
            CombiningRule::Arithmetic => 0.5 * (a.sigma + b.sigma),
            CombiningRule::Geometric => (a.sigma * b.sigma).sqrt(),
        };
        Self {
            sigma,
            epsilon: (a.epsilon * b.epsilon).sqrt(),
        }
    }
}

#[inline]
pub fn combine_lanes(
    sig_i: FloatLane,
    eps_i: FloatLane,
    sig_j: FloatLane,
    eps_j: FloatLane,
    rule: CombiningRule,
) -> (FloatLane, FloatLane) {
    let sigma = match rule {
        CombiningRule::Arithmetic => FloatLane::splat(0.5) * (sig_i + sig_j),
        CombiningRule::Geometric => (sig_i * sig_j).sqrt(),
    };
    (sigma, (eps_i * eps_j).sqrt())
}
