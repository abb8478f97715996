//! Search results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Generalization level per quasi-identifier plus the suppressed-record count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transformation {
    attributes: Vec<String>,
    levels: Vec<usize>,
    suppressed_records: usize,
}

impl Transformation {
    #[must_use]
    pub fn new(attributes: Vec<String>, levels: Vec<usize>, suppressed_records: usize) -> Self {
        debug_assert_eq!(attributes.len(), levels.len());
        Self {
            attributes,
            levels,
            suppressed_records,
        }
    }

    /// Quasi-identifiers, in the same order as [`Self::levels`].
    #[must_use]
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    #[must_use]
    pub fn levels(&self) -> &[usize] {
        &self.levels
    }

    #[must_use]
    pub fn level_of(&self, attribute: &str) -> Option<usize> {
        self.attributes
            .iter()
            .position(|a| a == attribute)
            .map(|position| self.levels[position])
    }

    /// Total generalization level.
    #[must_use]
    pub fn level_sum(&self) -> usize {
        self.levels.iter().sum()
    }

    #[must_use]
    pub fn suppressed_records(&self) -> usize {
        self.suppressed_records
    }
}

/// Counters collected during one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStatistics {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub workers: usize,
    pub lattice_size: usize,
    /// Nodes grouped and checked against the criteria.
    pub evaluated_nodes: usize,
    /// Nodes whose feasibility followed from a neighbour.
    pub tagged_nodes: usize,
    /// Nodes skipped because their lower bound could not beat the optimum.
    pub pruned_nodes: usize,
    pub cancelled: bool,
}

impl SearchStatistics {
    #[must_use]
    pub fn started(workers: usize, lattice_size: usize) -> Self {
        Self {
            started_at: Utc::now(),
            elapsed_ms: 0,
            workers,
            lattice_size,
            evaluated_nodes: 0,
            tagged_nodes: 0,
            pruned_nodes: 0,
            cancelled: false,
        }
    }

    /// Record the elapsed wall-clock time since `started_at`.
    pub fn finish(&mut self) {
        let elapsed = Utc::now() - self.started_at;
        self.elapsed_ms = u64::try_from(elapsed.num_milliseconds()).unwrap_or(0);
    }
}

/// Outcome of an anonymization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationResult {
    pub transformation: Transformation,
    pub achieved_score: f64,
    pub suppressed_record_count: usize,
    /// The search found no feasible node and returned the fully generalized
    /// transformation, suppressed within the limit.
    pub used_fallback: bool,
    pub statistics: SearchStatistics,
}

/// Evaluation of a single transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub transformation: Transformation,
    /// Every criterion holds after suppression within the limit.
    pub feasible: bool,
    pub score: f64,
    pub lower_bound: f64,
    pub equivalence_classes: usize,
}
