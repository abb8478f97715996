//! Generalization hierarchies.
//!
//! A hierarchy is a table with one row per raw value: column 0 holds the raw
//! value, column `i` its representation at generalization level `i`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Errors in a hierarchy definition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("Hierarchy has no rows")]
    Empty,

    #[error("Hierarchy row {row} has {found} levels, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Raw value '{0}' appears more than once")]
    DuplicateValue(String),

    #[error("Value '{value}' at level {level} generalizes to more than one parent")]
    Inconsistent { value: String, level: usize },
}

/// Ordered generalization function for a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct Hierarchy {
    rows: Vec<Vec<String>>,
}

impl Hierarchy {
    /// Create a hierarchy from its rows.
    ///
    /// # Errors
    /// Returns error if the table is empty, ragged, repeats a raw value, or
    /// maps one value at some level to two different parents.
    pub fn new(rows: Vec<Vec<String>>) -> Result<Self, HierarchyError> {
        let width = rows.first().map(Vec::len).ok_or(HierarchyError::Empty)?;
        if width == 0 {
            return Err(HierarchyError::Empty);
        }

        let mut raw = HashMap::with_capacity(rows.len());
        for (row, values) in rows.iter().enumerate() {
            if values.len() != width {
                return Err(HierarchyError::RaggedRow {
                    row,
                    expected: width,
                    found: values.len(),
                });
            }
            if raw.insert(values[0].as_str(), row).is_some() {
                return Err(HierarchyError::DuplicateValue(values[0].clone()));
            }
        }

        // Each (level, value) must have a single parent at level + 1.
        for level in 1..width.saturating_sub(1) {
            let mut parents: HashMap<&str, &str> = HashMap::new();
            for values in &rows {
                let parent = parents
                    .entry(values[level].as_str())
                    .or_insert(values[level + 1].as_str());
                if *parent != values[level + 1] {
                    return Err(HierarchyError::Inconsistent {
                        value: values[level].clone(),
                        level,
                    });
                }
            }
        }

        Ok(Self { rows })
    }

    /// Two-level hierarchy mapping every value to `*`.
    ///
    /// # Errors
    /// Returns error if `values` is empty or contains duplicates.
    pub fn redaction<I, S>(values: I) -> Result<Self, HierarchyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            values
                .into_iter()
                .map(|v| vec![v.into(), "*".to_string()])
                .collect(),
        )
    }

    /// Highest generalization level.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows[0].len() - 1
    }

    /// Number of raw values covered.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Representation of `value` at `level`, if the value is covered.
    #[must_use]
    pub fn generalize(&self, value: &str, level: usize) -> Option<&str> {
        self.rows
            .iter()
            .find(|row| row[0] == value)
            .and_then(|row| row.get(level))
            .map(String::as_str)
    }
}

impl TryFrom<Vec<Vec<String>>> for Hierarchy {
    type Error = HierarchyError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<Hierarchy> for Vec<Vec<String>> {
    fn from(hierarchy: Hierarchy) -> Self {
        hierarchy.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_height_and_generalize() {
        let h = Hierarchy::new(vec![
            row(&["81667", "8166*", "816**", "*"]),
            row(&["81675", "8167*", "816**", "*"]),
        ])
        .expect("Should build");

        assert_eq!(h.height(), 3);
        assert_eq!(h.leaf_count(), 2);
        assert_eq!(h.generalize("81675", 1), Some("8167*"));
        assert_eq!(h.generalize("81675", 4), None);
        assert_eq!(h.generalize("99999", 0), None);
    }

    #[test]
    fn test_rejects_inconsistent_parent() {
        let result = Hierarchy::new(vec![
            row(&["1", "a", "x"]),
            row(&["2", "a", "y"]),
        ]);
        assert_eq!(
            result,
            Err(HierarchyError::Inconsistent {
                value: "a".to_string(),
                level: 1
            })
        );
    }

    #[test]
    fn test_rejects_duplicates_and_ragged_rows() {
        assert_eq!(
            Hierarchy::new(vec![row(&["1", "*"]), row(&["1", "*"])]),
            Err(HierarchyError::DuplicateValue("1".to_string()))
        );
        assert!(matches!(
            Hierarchy::new(vec![row(&["1", "*"]), row(&["2"])]),
            Err(HierarchyError::RaggedRow { row: 1, .. })
        ));
        assert_eq!(Hierarchy::new(vec![]), Err(HierarchyError::Empty));
    }

    #[test]
    fn test_redaction_hierarchy() {
        let h = Hierarchy::redaction(["male", "female"]).expect("Should build");
        assert_eq!(h.height(), 1);
        assert_eq!(h.generalize("female", 1), Some("*"));
    }

    #[test]
    fn test_serde_validates() {
        let parsed: Result<Hierarchy, _> = serde_json::from_str(r#"[["1","*"],["1","*"]]"#);
        assert!(parsed.is_err());
    }
}
