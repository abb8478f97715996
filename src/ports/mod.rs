//! Ports layer: Trait definitions for external inputs.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the anonymization engine and the files or stores its inputs
//! come from.

mod source;

pub use source::{DatasetSource, HierarchyProvider};
