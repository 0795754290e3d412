//! # Force Field Module
//!
//! Parameters, pair bookkeeping and closed-form potentials for the Coulomb plus
//! Lennard-Jones non-bonded model.
//!
//! ## Overview
//!
//! Everything here is evaluated per atom pair and has no notion of batches or
//! loops; the [`kernel`](crate::core::kernel) composes these pieces into lane
//! arithmetic over [`AtomBatch`](crate::core::atoms::AtomBatch)es.
//!
//! ## Key Components
//!
//! - [`params`] - LJ parameters, combining rules and lookup errors
//! - [`lj_db`] - Interning of LJ parameters and immutable pair snapshots
//! - [`pairs`] - Sparse per-molecule table of Coulomb/LJ scale factors
//! - [`connectivity`] - Bond graph used for exclusions and the bonded mask
//! - [`cutoff`] - Cutoff radii and the LJ switching function
//! - [`potentials`] - Shifted, truncated and reaction-field Coulomb, 12-6 LJ
//! - [`term`] - Coulomb/LJ energy pair
//! - [`forces`] - Per-atom force accumulators

pub mod connectivity;
pub mod cutoff;
pub mod forces;
pub mod lj_db;
pub mod pairs;
pub mod params;
pub mod potentials;
pub mod term;
