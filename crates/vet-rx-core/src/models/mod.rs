//! Domain models for the vet-rx system.

mod batch;
mod prescription;

pub use batch::*;
pub use prescription::*;
