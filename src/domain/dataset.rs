//! Dataset and research subset types.
//!
//! A [`Dataset`] is an immutable table of person-level records. Attributes
//! become quasi-identifiers by attaching a [`Hierarchy`]; every other column
//! is released unchanged.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::hierarchy::Hierarchy;

/// Errors raised while building or validating input data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataError {
    #[error("Dataset contains no records")]
    EmptyDataset,

    #[error("Row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Duplicate attribute name: {0}")]
    DuplicateAttribute(String),

    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    #[error("No quasi-identifying attribute has a hierarchy")]
    NoQuasiIdentifiers,

    #[error("Subset index {index} is outside the dataset (len {len})")]
    SubsetOutOfRange { index: usize, len: usize },

    #[error("Subset is empty")]
    EmptySubset,

    #[error("Subset row {row} does not occur in the dataset")]
    SubsetRowNotFound { row: usize },

    #[error("Hierarchy for {attribute} does not cover value '{value}'")]
    HierarchyMismatch { attribute: String, value: String },

    #[error("Transformation has {found} levels, expected {expected}")]
    TransformationWidth { expected: usize, found: usize },

    #[error("Level {level} exceeds the height {height} of {attribute}")]
    LevelOutOfRange {
        attribute: String,
        level: usize,
        height: usize,
    },
}

/// Immutable table of records with an attribute index.
#[derive(Debug, Clone)]
pub struct Dataset {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
    hierarchies: Vec<Option<Hierarchy>>,
}

impl Dataset {
    /// Create a dataset from a header and its rows.
    ///
    /// # Errors
    /// Returns error on duplicate attribute names or rows whose width does
    /// not match the header.
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, DataError> {
        let mut index = HashMap::with_capacity(header.len());
        for (column, name) in header.iter().enumerate() {
            if index.insert(name.clone(), column).is_some() {
                return Err(DataError::DuplicateAttribute(name.clone()));
            }
        }

        for (row, values) in rows.iter().enumerate() {
            if values.len() != header.len() {
                return Err(DataError::RaggedRow {
                    row,
                    expected: header.len(),
                    found: values.len(),
                });
            }
        }

        let hierarchies = vec![None; header.len()];
        Ok(Self {
            header,
            rows,
            index,
            hierarchies,
        })
    }

    /// Declare `attribute` as a quasi-identifier generalized by `hierarchy`.
    ///
    /// # Errors
    /// Returns `DataError::UnknownAttribute` if the column does not exist.
    pub fn with_hierarchy(
        mut self,
        attribute: &str,
        hierarchy: Hierarchy,
    ) -> Result<Self, DataError> {
        let column = self
            .column_index(attribute)
            .ok_or_else(|| DataError::UnknownAttribute(attribute.to_string()))?;
        self.hierarchies[column] = Some(hierarchy);
        Ok(self)
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the dataset has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    #[must_use]
    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    #[must_use]
    pub fn column_index(&self, attribute: &str) -> Option<usize> {
        self.index.get(attribute).copied()
    }

    /// Hierarchy attached to `column`, if the column is a quasi-identifier.
    #[must_use]
    pub fn hierarchy(&self, column: usize) -> Option<&Hierarchy> {
        self.hierarchies.get(column).and_then(Option::as_ref)
    }

    /// Quasi-identifiers in column order, with their hierarchies.
    pub fn quasi_identifiers(&self) -> impl Iterator<Item = (usize, &str, &Hierarchy)> + '_ {
        self.hierarchies
            .iter()
            .enumerate()
            .filter_map(|(column, h)| h.as_ref().map(|h| (column, self.header[column].as_str(), h)))
    }
}

/// Records known to a journalist-style attacker: the released research sample
/// drawn from the dataset, which itself acts as the population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSubset {
    indices: BTreeSet<usize>,
}

impl DataSubset {
    /// Create a subset from record indices.
    ///
    /// Bounds are checked against the dataset when anonymization starts.
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        Self {
            indices: indices.into_iter().collect(),
        }
    }

    /// Build a subset by locating every row of `subset` in `dataset`.
    ///
    /// Rows are matched as a multiset: duplicates in the subset consume
    /// distinct dataset rows.
    ///
    /// # Errors
    /// Returns `DataError::SubsetRowNotFound` for a subset row with no
    /// remaining match.
    pub fn from_matching_rows(dataset: &Dataset, subset: &Dataset) -> Result<Self, DataError> {
        let mut available: HashMap<&[String], Vec<usize>> = HashMap::new();
        for (index, row) in dataset.rows().iter().enumerate().rev() {
            available.entry(row.as_slice()).or_default().push(index);
        }

        let mut indices = BTreeSet::new();
        for (row, values) in subset.rows().iter().enumerate() {
            let index = available
                .get_mut(values.as_slice())
                .and_then(Vec::pop)
                .ok_or(DataError::SubsetRowNotFound { row })?;
            indices.insert(index);
        }
        Ok(Self { indices })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    /// Check that every index refers to a record of `dataset`.
    ///
    /// # Errors
    /// Returns error if the subset is empty or exceeds the dataset.
    pub fn validate_against(&self, dataset: &Dataset) -> Result<(), DataError> {
        if self.indices.is_empty() {
            return Err(DataError::EmptySubset);
        }
        match self.indices.iter().next_back() {
            Some(&index) if index >= dataset.len() => Err(DataError::SubsetOutOfRange {
                index,
                len: dataset.len(),
            }),
            _ => Ok(()),
        }
    }
}
