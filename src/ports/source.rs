//! Input ports: where datasets and hierarchies come from.
//!
//! The anonymization engine only sees [`Dataset`] and [`Hierarchy`] values;
//! these traits abstract the storage format they are read from.

use crate::domain::{Dataset, Hierarchy};

/// Source of the population table.
pub trait DatasetSource {
    /// Error type for loading operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the table, header first.
    ///
    /// # Errors
    /// Returns error if the table cannot be read or is malformed.
    fn load_dataset(&self) -> Result<Dataset, Self::Error>;
}

/// Source of generalization hierarchies, one per quasi-identifier.
pub trait HierarchyProvider {
    /// Error type for loading operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load every hierarchy with the attribute it generalizes.
    ///
    /// # Errors
    /// Returns error if a hierarchy cannot be read or is invalid.
    fn load_hierarchies(&self) -> Result<Vec<(String, Hierarchy)>, Self::Error>;
}
