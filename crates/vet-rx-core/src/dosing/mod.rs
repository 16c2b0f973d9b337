//! Dosage and quantity reconciliation.
//!
//! Pipeline: Frequency spec → Daily doses → Required quantity → Stock cap
//!
//! Everything here is a pure, total function: malformed input degrades to 0
//! or to one dose per day, never to an error. Required-field checks belong to
//! [`crate::validation`].

mod frequency;
mod quantity;
mod reconcile;

pub use frequency::*;
pub use quantity::*;
pub use reconcile::*;
