//! Loading inputs through the source ports.

use std::collections::BTreeSet;

use crate::adapters::SourceError;
use crate::domain::{DataError, Dataset, Hierarchy};
use crate::ports::{DatasetSource, HierarchyProvider};
use crate::RiskgenError;

/// Load the population table and attach every hierarchy to its attribute.
///
/// # Errors
/// Returns error if a source fails or a hierarchy names an unknown
/// attribute.
pub fn load_dataset<S, H>(source: &S, hierarchies: &H) -> Result<Dataset, RiskgenError>
where
    S: DatasetSource,
    S::Error: Into<SourceError>,
    H: HierarchyProvider,
    H::Error: Into<SourceError>,
{
    let mut dataset = source
        .load_dataset()
        .map_err(|e| RiskgenError::Source(e.into()))?;

    let hierarchies = hierarchies
        .load_hierarchies()
        .map_err(|e| RiskgenError::Source(e.into()))?;
    for (attribute, hierarchy) in hierarchies {
        dataset = dataset.with_hierarchy(&attribute, hierarchy)?;
    }

    tracing::info!(
        "Loaded {} records with {} quasi-identifiers",
        dataset.len(),
        dataset.quasi_identifiers().count()
    );
    Ok(dataset)
}

/// Declare `attribute` a quasi-identifier that is either kept or fully
/// redacted, using a two-level hierarchy over its distinct values.
///
/// # Errors
/// Returns error if the attribute does not exist or the dataset is empty.
pub fn redact_attribute(dataset: Dataset, attribute: &str) -> Result<Dataset, RiskgenError> {
    let column = dataset
        .column_index(attribute)
        .ok_or_else(|| DataError::UnknownAttribute(attribute.to_string()))?;
    let values: BTreeSet<&str> = dataset.rows().iter().map(|row| row[column].as_str()).collect();
    let hierarchy = Hierarchy::redaction(values)?;
    Ok(dataset.with_hierarchy(attribute, hierarchy)?)
}
