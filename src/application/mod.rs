//! Application layer: Use cases and services.
//!
//! This module runs the lattice search over the domain types and wires the
//! input ports to it.

mod anonymizer;
mod best;
mod input;
mod lattice;
mod search;

pub use anonymizer::{Anonymizer, SUPPRESSED_VALUE};
pub use best::{BestRegister, Candidate};
pub use input::{load_dataset, redact_attribute};
pub use lattice::Lattice;
pub use search::{
    CancellationToken, Classification, LatticeSearch, NodeState, SearchOutcome, SearchSettings,
};
