//! Atom input for the kernel: single atoms and their lane-packed batches.

pub mod atom;
pub mod batch;

pub use atom::{CljAtom, CljAtomRef};
pub use batch::{AtomBatch, AtomsError, DUMMY_ID};
