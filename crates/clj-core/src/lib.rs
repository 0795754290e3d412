//! # cljff
//!
//! A lane-vectorised kernel for the non-bonded Coulomb and Lennard-Jones
//! energy of molecular-mechanics systems, with cutoffs, CHARMM switching,
//! periodic boundaries and scaled intramolecular pairs.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Fixed-width numeric lanes, the
//!   structure-of-arrays [`AtomBatch`](core::atoms::AtomBatch), boundary
//!   conditions, force-field tables (pair scaling, LJ parameters, cutoffs) and
//!   the kernel that turns batches into energies, forces and potentials. All of
//!   it is single-threaded and free of shared mutable state.
//!
//! - **[`engine`]: The Drivers.** TOML configuration, cubic-box spatial
//!   partitioning and the rayon-backed calculators that split large systems
//!   and potential grids into independent kernel calls.

pub mod core;
pub mod engine;
