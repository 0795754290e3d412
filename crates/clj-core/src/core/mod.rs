//! # Core Module
//!
//! Stateless building blocks of the non-bonded Coulomb/Lennard-Jones model and
//! the single-threaded kernel that evaluates it.
//!
//! ## Architecture
//!
//! - **Numeric lanes** ([`lanes`]) - fixed-width SIMD value types and masks
//! - **Geometry** ([`space`]) - vacuum or periodic boundaries, minimum image, bounding boxes
//! - **Atoms** ([`atoms`]) - lane-packed atom batches with padding identified by a dummy id
//! - **Force field** ([`forcefield`]) - parameters, pair scaling, cutoffs and potentials
//! - **Kernel** ([`kernel`]) - inter- and intramolecular energy, force and field loops
//!
//! Nothing in this layer spawns threads or holds locks on the evaluation path;
//! parallel drivers live in [`crate::engine`].

pub mod atoms;
pub mod forcefield;
pub mod kernel;
pub mod lanes;
pub mod space;
