//! Dictionary-encoded quasi-identifiers and equivalence-class grouping.
//!
//! Raw values are replaced by leaf ids once per run. Each hierarchy level maps
//! leaf ids to generalized ids, so grouping a transformation only touches
//! integers.

use std::collections::HashMap;

use super::dataset::{DataError, DataSubset, Dataset};
use super::hierarchy::Hierarchy;

/// Row marker for records that are not released.
pub const UNRELEASED: u32 = u32::MAX;

/// Integer form of a single hierarchy.
#[derive(Debug, Clone)]
pub struct EncodedHierarchy {
    height: usize,
    leaf_count: usize,
    /// level -> leaf id -> generalized id
    mapping: Vec<Vec<u32>>,
    /// level -> generalized id -> label
    labels: Vec<Vec<String>>,
    /// level -> generalized id -> number of leaves covered
    coverage: Vec<Vec<u32>>,
}

impl EncodedHierarchy {
    fn encode(hierarchy: &Hierarchy) -> (Self, HashMap<&str, u32>) {
        let height = hierarchy.height();
        let leaf_count = hierarchy.leaf_count();
        let mut mapping = vec![Vec::with_capacity(leaf_count); height + 1];
        let mut labels = vec![Vec::new(); height + 1];
        let mut coverage = vec![Vec::new(); height + 1];
        let mut leaves = HashMap::with_capacity(leaf_count);

        for level in 0..=height {
            let mut ids: HashMap<&str, u32> = HashMap::new();
            for (leaf, row) in hierarchy.rows().iter().enumerate() {
                let value = row[level].as_str();
                let next = labels[level].len() as u32;
                let id = *ids.entry(value).or_insert_with(|| {
                    labels[level].push(value.to_string());
                    coverage[level].push(0);
                    next
                });
                coverage[level][id as usize] += 1;
                mapping[level].push(id);
                if level == 0 {
                    leaves.insert(row[0].as_str(), leaf as u32);
                }
            }
        }

        (
            Self {
                height,
                leaf_count,
                mapping,
                labels,
                coverage,
            },
            leaves,
        )
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Generalized id of `leaf` at `level`.
    #[inline]
    #[must_use]
    pub fn generalize(&self, level: usize, leaf: u32) -> u32 {
        self.mapping[level][leaf as usize]
    }

    #[must_use]
    pub fn label(&self, level: usize, id: u32) -> &str {
        &self.labels[level][id as usize]
    }

    /// Number of generalized values at `level`.
    #[must_use]
    pub fn domain_size(&self, level: usize) -> usize {
        self.labels[level].len()
    }

    /// Fraction of the attribute's domain covered by generalized value `id`.
    #[must_use]
    pub fn share(&self, level: usize, id: u32) -> f64 {
        f64::from(self.coverage[level][id as usize]) / self.leaf_count as f64
    }

    /// Normalized generalization loss of value `id`: 0 for a raw value, 1 for
    /// a value covering the whole domain.
    #[must_use]
    pub fn loss(&self, level: usize, id: u32) -> f64 {
        if self.leaf_count <= 1 {
            return 0.0;
        }
        f64::from(self.coverage[level][id as usize] - 1) / (self.leaf_count - 1) as f64
    }
}

/// Equivalence class of released records sharing a generalized key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquivalenceClass {
    /// Generalized id per quasi-identifier.
    pub key: Vec<u32>,
    /// Released records in the class.
    pub count: usize,
    /// Population records (released or not) sharing the key.
    pub pcount: usize,
}

/// Released equivalence classes of one transformation, sorted by key.
#[derive(Debug, Clone)]
pub struct EquivalenceClasses {
    classes: Vec<EquivalenceClass>,
    /// Class index per dataset row, `UNRELEASED` for rows not released.
    row_class: Vec<u32>,
}

impl EquivalenceClasses {
    #[must_use]
    pub fn classes(&self) -> &[EquivalenceClass] {
        &self.classes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Class of `row`, or `None` for rows outside the release.
    #[must_use]
    pub fn class_of(&self, row: usize) -> Option<usize> {
        match self.row_class[row] {
            UNRELEASED => None,
            class => Some(class as usize),
        }
    }
}

/// Encoded view of a dataset restricted to its quasi-identifiers.
#[derive(Debug, Clone)]
pub struct EncodedData {
    attributes: Vec<String>,
    columns: Vec<usize>,
    hierarchies: Vec<EncodedHierarchy>,
    /// Row-major leaf ids, `rows * width`.
    leaves: Vec<u32>,
    released: Vec<bool>,
    released_count: usize,
    rows: usize,
}

impl EncodedData {
    /// Encode the quasi-identifiers of `dataset`.
    ///
    /// When `released` is given only those rows are published; the rest of
    /// the dataset still counts towards population sizes.
    ///
    /// # Errors
    /// Returns error if the dataset is empty, has no quasi-identifiers, the
    /// subset falls outside the dataset, or a value is missing from its
    /// hierarchy.
    pub fn encode(dataset: &Dataset, released: Option<&DataSubset>) -> Result<Self, DataError> {
        if dataset.is_empty() {
            return Err(DataError::EmptyDataset);
        }
        if let Some(subset) = released {
            subset.validate_against(dataset)?;
        }

        let mut attributes = Vec::new();
        let mut columns = Vec::new();
        let mut hierarchies = Vec::new();
        let mut dictionaries = Vec::new();
        for (column, name, hierarchy) in dataset.quasi_identifiers() {
            let (encoded, leaves) = EncodedHierarchy::encode(hierarchy);
            attributes.push(name.to_string());
            columns.push(column);
            hierarchies.push(encoded);
            dictionaries.push(leaves);
        }
        if attributes.is_empty() {
            return Err(DataError::NoQuasiIdentifiers);
        }

        let rows = dataset.len();
        let mut leaves = Vec::with_capacity(rows * columns.len());
        for record in dataset.rows() {
            for (position, &column) in columns.iter().enumerate() {
                let value = record[column].as_str();
                let leaf = dictionaries[position].get(value).copied().ok_or_else(|| {
                    DataError::HierarchyMismatch {
                        attribute: attributes[position].clone(),
                        value: value.to_string(),
                    }
                })?;
                leaves.push(leaf);
            }
        }

        let released: Vec<bool> = match released {
            Some(subset) => (0..rows).map(|row| subset.contains(row)).collect(),
            None => vec![true; rows],
        };
        let released_count = released.iter().filter(|r| **r).count();

        Ok(Self {
            attributes,
            columns,
            hierarchies,
            leaves,
            released,
            released_count,
            rows,
        })
    }

    /// Quasi-identifier names in column order.
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Dataset column of each quasi-identifier.
    #[must_use]
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    #[must_use]
    pub fn hierarchies(&self) -> &[EncodedHierarchy] {
        &self.hierarchies
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.attributes.len()
    }

    /// Total rows, released or not.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn released_count(&self) -> usize {
        self.released_count
    }

    #[must_use]
    pub fn is_released(&self, row: usize) -> bool {
        self.released[row]
    }

    /// Leaf ids of `row`.
    #[inline]
    #[must_use]
    pub fn record(&self, row: usize) -> &[u32] {
        let width = self.width();
        &self.leaves[row * width..(row + 1) * width]
    }

    /// Group the dataset under the generalization `levels`.
    ///
    /// Only classes with at least one released record are returned; their
    /// `pcount` still includes unreleased rows.
    #[must_use]
    pub fn groupify(&self, levels: &[usize]) -> EquivalenceClasses {
        debug_assert_eq!(levels.len(), self.width());

        let mut index: HashMap<Vec<u32>, u32> = HashMap::new();
        let mut classes: Vec<EquivalenceClass> = Vec::new();
        let mut row_class = Vec::with_capacity(self.rows);

        for row in 0..self.rows {
            let key: Vec<u32> = self
                .record(row)
                .iter()
                .zip(levels)
                .zip(&self.hierarchies)
                .map(|((&leaf, &level), h)| h.generalize(level, leaf))
                .collect();
            let next = classes.len() as u32;
            let class = *index.entry(key).or_insert_with_key(|key| {
                classes.push(EquivalenceClass {
                    key: key.clone(),
                    count: 0,
                    pcount: 0,
                });
                next
            });
            let entry = &mut classes[class as usize];
            entry.pcount += 1;
            if self.released[row] {
                entry.count += 1;
            }
            row_class.push(class);
        }

        // Keep released classes only, in key order, so float sums over the
        // classes do not depend on hashing.
        let mut order: Vec<u32> = (0..classes.len() as u32)
            .filter(|&c| classes[c as usize].count > 0)
            .collect();
        order.sort_unstable_by(|a, b| classes[*a as usize].key.cmp(&classes[*b as usize].key));

        let mut remap = vec![UNRELEASED; classes.len()];
        for (position, &class) in order.iter().enumerate() {
            remap[class as usize] = position as u32;
        }
        for (row, class) in row_class.iter_mut().enumerate() {
            *class = if self.released[row] {
                remap[*class as usize]
            } else {
                UNRELEASED
            };
        }

        let mut slots: Vec<Option<EquivalenceClass>> = classes.into_iter().map(Some).collect();
        let classes = order
            .iter()
            .filter_map(|&class| slots[class as usize].take())
            .collect();

        EquivalenceClasses { classes, row_class }
    }

    /// Number of released records whose value of attribute `position`
    /// generalizes to each id at `level`.
    #[must_use]
    pub fn frequencies(&self, position: usize, level: usize) -> Vec<u32> {
        let hierarchy = &self.hierarchies[position];
        let mut counts = vec![0u32; hierarchy.domain_size(level)];
        for row in (0..self.rows).filter(|&row| self.released[row]) {
            let leaf = self.record(row)[position];
            counts[hierarchy.generalize(level, leaf) as usize] += 1;
        }
        counts
    }
}
