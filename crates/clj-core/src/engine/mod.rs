//! # Engine Module
//!
//! Drivers that sit on top of the kernel: loading a kernel from TOML, binning
//! a large system into cubic boxes and evaluating energies and potential grids
//! across threads.
//!
//! With the `parallel` feature (on by default) box pairs and grid chunks are
//! dispatched through rayon; without it the same work runs sequentially and
//! produces identical results.

pub mod boxes;
pub mod calculator;
pub mod config;
pub mod error;
pub mod grid;
