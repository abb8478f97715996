//! Utility metrics. Lower scores are better.
//!
//! A [`Metric`] is a plain configuration value. Scoring happens through a
//! [`MetricContext`], which precomputes per-attribute, per-level tables over
//! the released records once per run so that lower bounds cost `O(width)`.

use serde::{Deserialize, Serialize};

use super::config::ConfigError;
use super::criterion::SuppressionPlan;
use super::encoding::{EncodedData, EquivalenceClass, EquivalenceClasses};
use super::financial::FinancialConfiguration;

const fn default_true() -> bool {
    true
}

const fn default_sampling_fraction() -> f64 {
    0.1
}

/// Registry entry for a metric variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Loss,
    Discernibility,
    EntropyBasedInformationLoss,
    PrecomputedEntropy,
    PublisherPayout,
}

impl MetricKind {
    /// Every registered metric.
    pub const ALL: [MetricKind; 5] = [
        Self::Loss,
        Self::Discernibility,
        Self::EntropyBasedInformationLoss,
        Self::PrecomputedEntropy,
        Self::PublisherPayout,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Loss => "loss",
            Self::Discernibility => "discernibility",
            Self::EntropyBasedInformationLoss => "entropy_based_information_loss",
            Self::PrecomputedEntropy => "precomputed_entropy",
            Self::PublisherPayout => "publisher_payout",
        }
    }

    /// Metric of this kind with default parameters.
    #[must_use]
    pub fn default_metric(self) -> Metric {
        match self {
            Self::Loss => Metric::Loss,
            Self::Discernibility => Metric::Discernibility {
                penalize_suppression: false,
            },
            Self::EntropyBasedInformationLoss => Metric::EntropyBasedInformationLoss,
            Self::PrecomputedEntropy => Metric::PrecomputedEntropy {
                sampling_fraction: default_sampling_fraction(),
                penalize_suppression: default_true(),
            },
            Self::PublisherPayout => Metric::PublisherPayout {
                journalist_model: false,
            },
        }
    }
}

/// Utility metric and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Metric {
    /// Mean normalized generalization loss per cell.
    Loss,
    /// Sum of squared class sizes. Suppressed records form one class, or
    /// with `penalize_suppression` each costs the released record count.
    Discernibility {
        #[serde(default)]
        penalize_suppression: bool,
    },
    /// Entropy-based information loss summed over records.
    EntropyBasedInformationLoss,
    /// Non-uniform entropy over the released value distributions.
    ///
    /// Attributes whose distinct raw values make up at most
    /// `sampling_fraction` of the released records are scored from per-level
    /// tables built up front; the others are scored record by record. Both
    /// give the same score.
    PrecomputedEntropy {
        #[serde(default = "default_sampling_fraction")]
        sampling_fraction: f64,
        #[serde(default = "default_true")]
        penalize_suppression: bool,
    },
    /// Publisher's expected shortfall against the maximum payout.
    PublisherPayout {
        #[serde(default)]
        journalist_model: bool,
    },
}

impl Metric {
    /// Look up a metric by registry name, with default parameters.
    ///
    /// # Errors
    /// Returns `ConfigError::UnknownMetric` for unregistered names.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        MetricKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .map(MetricKind::default_metric)
            .ok_or_else(|| ConfigError::UnknownMetric(name.to_string()))
    }

    #[must_use]
    pub fn kind(&self) -> MetricKind {
        match self {
            Self::Loss => MetricKind::Loss,
            Self::Discernibility { .. } => MetricKind::Discernibility,
            Self::EntropyBasedInformationLoss => MetricKind::EntropyBasedInformationLoss,
            Self::PrecomputedEntropy { .. } => MetricKind::PrecomputedEntropy,
            Self::PublisherPayout { .. } => MetricKind::PublisherPayout,
        }
    }

    /// # Errors
    /// Returns `ConfigError::InvalidMetricParameter` when `sampling_fraction`
    /// is not a finite value in `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::PrecomputedEntropy {
                sampling_fraction, ..
            } if !sampling_fraction.is_finite()
                || sampling_fraction <= 0.0
                || sampling_fraction > 1.0 =>
            {
                Err(ConfigError::InvalidMetricParameter {
                    name: "sampling_fraction",
                    value: sampling_fraction,
                })
            }
            _ => Ok(()),
        }
    }

    /// Whether the score never decreases under generalization when nothing
    /// is suppressed.
    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        !matches!(self, Self::PublisherPayout { .. })
    }

    /// Precompute the tables needed to score transformations of `data`.
    #[must_use]
    pub fn prepare(self, data: &EncodedData, financial: FinancialConfiguration) -> MetricContext<'_> {
        MetricContext::new(self, data, financial)
    }
}

/// A metric bound to one encoded dataset.
#[derive(Debug, Clone)]
pub struct MetricContext<'a> {
    metric: Metric,
    data: &'a EncodedData,
    financial: FinancialConfiguration,
    /// attribute -> level -> summed generalization loss of released records
    loss: Vec<Vec<f64>>,
    /// attribute -> level -> summed `ln(share)` of released records
    log_share: Vec<Vec<f64>>,
    /// `sum ln(1 / leaf_count)` over attributes; 0 when every domain is a
    /// single value
    max_log_share: f64,
    /// attribute -> level -> generalized value -> released records
    frequencies: Vec<Vec<Vec<u32>>>,
    /// attribute -> entropy tables were built up front
    precomputed: Vec<bool>,
    /// attribute -> level -> leaf -> conditional entropy of the cell; empty
    /// for attributes scored record by record
    cell_entropy: Vec<Vec<Vec<f64>>>,
    /// attribute -> level -> summed `cell_entropy` of released records
    entropy: Vec<Vec<f64>>,
}

impl<'a> MetricContext<'a> {
    #[must_use]
    pub fn new(metric: Metric, data: &'a EncodedData, financial: FinancialConfiguration) -> Self {
        let width = data.width();
        let released = data.released_count();
        let sampling_fraction = match metric {
            Metric::PrecomputedEntropy {
                sampling_fraction, ..
            } => Some(sampling_fraction),
            _ => None,
        };
        let mut loss = Vec::with_capacity(width);
        let mut log_share = Vec::with_capacity(width);
        let mut frequencies = Vec::with_capacity(width);
        let mut precomputed = Vec::with_capacity(width);
        let mut max_log_share = 0.0;

        for (position, hierarchy) in data.hierarchies().iter().enumerate() {
            let levels: Vec<Vec<u32>> = (0..=hierarchy.height())
                .map(|level| data.frequencies(position, level))
                .collect();
            let mut loss_levels = Vec::with_capacity(levels.len());
            let mut share_levels = Vec::with_capacity(levels.len());
            for (level, counts) in levels.iter().enumerate() {
                let mut loss_sum = 0.0;
                let mut share_sum = 0.0;
                for (id, &frequency) in counts.iter().enumerate() {
                    if frequency == 0 {
                        continue;
                    }
                    let weight = f64::from(frequency);
                    loss_sum += weight * hierarchy.loss(level, id as u32);
                    share_sum += weight * hierarchy.share(level, id as u32).ln();
                }
                loss_levels.push(loss_sum);
                share_levels.push(share_sum);
            }

            let distinct = levels[0].iter().filter(|&&count| count > 0).count();
            precomputed.push(sampling_fraction.is_some_and(|fraction| {
                released > 0 && distinct as f64 / released as f64 <= fraction
            }));
            max_log_share += (1.0 / hierarchy.leaf_count() as f64).ln();
            loss.push(loss_levels);
            log_share.push(share_levels);
            frequencies.push(levels);
        }

        let mut context = Self {
            metric,
            data,
            financial,
            loss,
            log_share,
            max_log_share,
            frequencies,
            precomputed,
            cell_entropy: Vec::with_capacity(width),
            entropy: Vec::with_capacity(width),
        };
        for position in 0..width {
            let (cells, sums) = if context.precomputed[position] {
                context.entropy_tables(position)
            } else {
                (Vec::new(), Vec::new())
            };
            context.cell_entropy.push(cells);
            context.entropy.push(sums);
        }
        if sampling_fraction.is_some() {
            tracing::debug!(
                "Entropy tables precomputed for {} of {} attributes",
                context.precomputed.iter().filter(|&&p| p).count(),
                width
            );
        }
        context
    }

    /// Per-leaf cell entropies of one attribute at every level, and their
    /// sums over the released records.
    fn entropy_tables(&self, position: usize) -> (Vec<Vec<f64>>, Vec<f64>) {
        let hierarchy = &self.data.hierarchies()[position];
        let raw = &self.frequencies[position][0];
        let mut cells = Vec::with_capacity(hierarchy.height() + 1);
        let mut sums = Vec::with_capacity(hierarchy.height() + 1);
        for level in 0..=hierarchy.height() {
            let level_cells: Vec<f64> = (0..hierarchy.leaf_count() as u32)
                .map(|leaf| self.exact_cell_entropy(position, level, leaf))
                .collect();
            let sum: f64 = level_cells
                .iter()
                .enumerate()
                .map(|(leaf, cost)| f64::from(raw[hierarchy.generalize(0, leaf as u32) as usize]) * cost)
                .sum();
            cells.push(level_cells);
            sums.push(sum);
        }
        (cells, sums)
    }

    /// `log2(freq(generalized) / freq(raw))` of `leaf` at `level`.
    fn exact_cell_entropy(&self, position: usize, level: usize, leaf: u32) -> f64 {
        let hierarchy = &self.data.hierarchies()[position];
        let counts = &self.frequencies[position];
        let own = counts[0][hierarchy.generalize(0, leaf) as usize];
        if own == 0 {
            return 0.0;
        }
        let group = counts[level][hierarchy.generalize(level, leaf) as usize];
        (f64::from(group) / f64::from(own)).log2()
    }

    fn cell_cost(&self, position: usize, level: usize, leaf: u32) -> f64 {
        if self.precomputed[position] {
            self.cell_entropy[position][level][leaf as usize]
        } else {
            self.exact_cell_entropy(position, level, leaf)
        }
    }

    /// Summed cell entropy of one attribute over the released records.
    fn attribute_entropy(&self, position: usize, level: usize) -> f64 {
        if self.precomputed[position] {
            return self.entropy[position][level];
        }
        (0..self.data.rows())
            .filter(|&row| self.data.is_released(row))
            .map(|row| self.exact_cell_entropy(position, level, self.data.record(row)[position]))
            .sum()
    }

    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    fn released(&self) -> f64 {
        self.data.released_count() as f64
    }

    /// Entropy-based information loss of one record with generalized `key`.
    fn information_loss(&self, key: &[u32], levels: &[usize]) -> f64 {
        if self.max_log_share == 0.0 {
            return 0.0;
        }
        let log_share: f64 = key
            .iter()
            .zip(levels)
            .zip(self.data.hierarchies())
            .map(|((&id, &level), h)| h.share(level, id).ln())
            .sum();
        1.0 - log_share / self.max_log_share
    }

    /// Summed entropy-based loss of all released records without suppression.
    fn information_loss_floor(&self, levels: &[usize]) -> f64 {
        if self.max_log_share == 0.0 {
            return 0.0;
        }
        let log_share: f64 = levels
            .iter()
            .enumerate()
            .map(|(position, &level)| self.log_share[position][level])
            .sum();
        self.released() - log_share / self.max_log_share
    }

    fn generalization_entropy(&self, levels: &[usize]) -> f64 {
        levels
            .iter()
            .enumerate()
            .map(|(position, &level)| self.attribute_entropy(position, level))
            .sum()
    }

    /// Lower bound on the score of the node `levels` and of every
    /// generalization of it, whatever gets suppressed.
    #[must_use]
    pub fn lower_bound(&self, levels: &[usize]) -> f64 {
        match self.metric {
            Metric::Loss => {
                let cells = self.released() * self.data.width() as f64;
                let sum: f64 = levels
                    .iter()
                    .enumerate()
                    .map(|(position, &level)| self.loss[position][level])
                    .sum();
                sum / cells
            }
            Metric::Discernibility { .. } => self.released(),
            Metric::EntropyBasedInformationLoss => self.information_loss_floor(levels),
            Metric::PrecomputedEntropy { .. } => self.generalization_entropy(levels),
            Metric::PublisherPayout { .. } => {
                self.financial.max_publisher_payout() * self.information_loss_floor(levels)
            }
        }
    }

    /// Score the node `levels`, grouped into `classes`, with `plan` applied.
    #[must_use]
    pub fn evaluate(
        &self,
        levels: &[usize],
        classes: &EquivalenceClasses,
        plan: &SuppressionPlan,
    ) -> f64 {
        let suppressed = plan.mask(classes.len());
        let released = classes.classes().iter().zip(&suppressed);

        match self.metric {
            Metric::Loss => {
                let width = self.data.width() as f64;
                let mut total = 0.0;
                for (class, &is_suppressed) in released {
                    let cell_loss = if is_suppressed {
                        width
                    } else {
                        class
                            .key
                            .iter()
                            .zip(levels)
                            .zip(self.data.hierarchies())
                            .map(|((&id, &level), h)| h.loss(level, id))
                            .sum()
                    };
                    total += class.count as f64 * cell_loss;
                }
                total / (self.released() * width)
            }
            Metric::Discernibility {
                penalize_suppression,
            } => {
                let mut total = 0.0;
                let mut suppressed_records = 0usize;
                for (class, &is_suppressed) in released {
                    if is_suppressed {
                        suppressed_records += class.count;
                    } else {
                        let count = class.count as f64;
                        total += count * count;
                    }
                }
                let s = suppressed_records as f64;
                if penalize_suppression {
                    total + s * self.released()
                } else {
                    total + s * s
                }
            }
            Metric::EntropyBasedInformationLoss => released
                .map(|(class, &is_suppressed)| {
                    let per_record = if is_suppressed {
                        1.0
                    } else {
                        self.information_loss(&class.key, levels)
                    };
                    class.count as f64 * per_record
                })
                .sum(),
            Metric::PrecomputedEntropy {
                penalize_suppression,
                ..
            } => {
                let total = self.generalization_entropy(levels);
                if plan.suppressed_records == 0 || !penalize_suppression {
                    return total;
                }
                let (at_node, at_top) = self.suppressed_entropy(levels, classes, &suppressed);
                total - at_node + at_top
            }
            Metric::PublisherPayout { journalist_model } => {
                let benefit = self.financial.max_publisher_payout();
                released
                    .map(|(class, &is_suppressed)| {
                        let shortfall = if is_suppressed {
                            benefit
                        } else {
                            let il = self.information_loss(&class.key, levels);
                            let p = self.success_probability(class, journalist_model);
                            benefit - self.financial.publisher_payout(il, p)
                        };
                        class.count as f64 * shortfall
                    })
                    .sum()
            }
        }
    }

    fn success_probability(&self, class: &EquivalenceClass, journalist_model: bool) -> f64 {
        let size = if journalist_model { class.pcount } else { class.count };
        FinancialConfiguration::success_probability(size)
    }

    /// Entropy of suppressed records at the node's levels and at the top.
    fn suppressed_entropy(
        &self,
        levels: &[usize],
        classes: &EquivalenceClasses,
        suppressed: &[bool],
    ) -> (f64, f64) {
        let mut at_node = 0.0;
        let mut at_top = 0.0;
        for row in 0..self.data.rows() {
            let Some(class) = classes.class_of(row) else {
                continue;
            };
            if !suppressed[class] {
                continue;
            }
            for (position, &leaf) in self.data.record(row).iter().enumerate() {
                let top = self.data.hierarchies()[position].height();
                at_node += self.cell_cost(position, levels[position], leaf);
                at_top += self.cell_cost(position, top, leaf);
            }
        }
        (at_node, at_top)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dataset, Hierarchy};
    use approx::assert_relative_eq;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| (*s).to_string()).collect()
    }

    /// Ages 21, 25, 34, 21; the hierarchy also covers 47.
    fn data() -> EncodedData {
        let age = Hierarchy::new(vec![
            strings(&["21", "20-29", "*"]),
            strings(&["25", "20-29", "*"]),
            strings(&["34", "30-39", "*"]),
            strings(&["47", "40-49", "*"]),
        ])
        .expect("Should build");
        let dataset = Dataset::new(
            strings(&["age"]),
            vec![
                strings(&["21"]),
                strings(&["25"]),
                strings(&["34"]),
                strings(&["21"]),
            ],
        )
        .and_then(|d| d.with_hierarchy("age", age))
        .expect("Should build dataset");
        EncodedData::encode(&dataset, None).expect("Should encode")
    }

    fn score(metric: Metric, levels: &[usize], plan: &SuppressionPlan) -> (f64, f64) {
        let data = data();
        let context = metric.prepare(&data, FinancialConfiguration::default());
        let classes = data.groupify(levels);
        (context.evaluate(levels, &classes, plan), context.lower_bound(levels))
    }

    #[test]
    fn test_registry() {
        for kind in MetricKind::ALL {
            let metric = Metric::from_name(kind.name()).expect("Registered");
            assert_eq!(metric.kind(), kind);
            assert!(metric.validate().is_ok());
        }
        assert!(matches!(
            Metric::from_name("ambiguity"),
            Err(ConfigError::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_sampling_fraction_validation() {
        for value in [0.0, -0.1, 1.5, f64::NAN] {
            let metric = Metric::PrecomputedEntropy {
                sampling_fraction: value,
                penalize_suppression: false,
            };
            assert!(matches!(
                metric.validate(),
                Err(ConfigError::InvalidMetricParameter {
                    name: "sampling_fraction",
                    ..
                })
            ));
        }
        let full = Metric::PrecomputedEntropy {
            sampling_fraction: 1.0,
            penalize_suppression: false,
        };
        assert!(full.validate().is_ok());
    }

    #[test]
    fn test_serde_tagged() {
        let metric: Metric = serde_json::from_str(r#"{"kind":"precomputed_entropy","sampling_fraction":0.2}"#)
            .expect("Should parse");
        assert_eq!(
            metric,
            Metric::PrecomputedEntropy {
                sampling_fraction: 0.2,
                penalize_suppression: true
            }
        );
    }

    #[test]
    fn test_discernibility_defaults_to_one_suppressed_class() {
        let expected = Metric::Discernibility {
            penalize_suppression: false,
        };
        assert_eq!(Metric::from_name("discernibility").expect("Registered"), expected);
        let parsed: Metric = serde_json::from_str(r#"{"kind":"discernibility"}"#).expect("Should parse");
        assert_eq!(parsed, expected);

        // Classes at level 0, by key: 21 (2), 25 (1), 34 (1). Suppress 25 and 34.
        let plan = SuppressionPlan {
            feasible: true,
            suppressed_classes: vec![1, 2],
            suppressed_records: 2,
        };
        let (pooled, _) = score(expected, &[0], &plan);
        assert_relative_eq!(pooled, 2.0 * 2.0 + 2.0 * 2.0);
    }

    #[test]
    fn test_loss_bounds() {
        let plan = SuppressionPlan::feasible_without_suppression();
        let (raw, raw_bound) = score(Metric::Loss, &[0], &plan);
        assert_relative_eq!(raw, 0.0);
        assert_relative_eq!(raw_bound, 0.0);

        // Records 21, 25 and 21 lose 1/3 each, 34 loses nothing.
        let (decade, decade_bound) = score(Metric::Loss, &[1], &plan);
        assert_relative_eq!(decade, 0.25);
        assert_relative_eq!(decade_bound, decade);

        let (top, _) = score(Metric::Loss, &[2], &plan);
        assert_relative_eq!(top, 1.0);
    }

    #[test]
    fn test_suppressed_records_cost_one() {
        // Classes at level 1, by key: 20-29 (3), 30-39 (1). Suppress 30-39.
        let plan = SuppressionPlan {
            feasible: true,
            suppressed_classes: vec![1],
            suppressed_records: 1,
        };
        let (loss, bound) = score(Metric::Loss, &[1], &plan);
        assert_relative_eq!(loss, (3.0 / 3.0 + 1.0) / 4.0);
        assert!(bound <= loss);
    }

    #[test]
    fn test_discernibility() {
        let plan = SuppressionPlan::feasible_without_suppression();
        let (raw, bound) = score(Metric::Discernibility { penalize_suppression: true }, &[0], &plan);
        // 21 x2, 25, 34
        assert_relative_eq!(raw, 6.0);
        assert_relative_eq!(bound, 4.0);

        let suppressed = SuppressionPlan {
            feasible: true,
            suppressed_classes: vec![1, 2],
            suppressed_records: 2,
        };
        let (penalized, _) = score(Metric::Discernibility { penalize_suppression: true }, &[0], &suppressed);
        assert_relative_eq!(penalized, 4.0 + 2.0 * 4.0);
        let (pooled, _) = score(Metric::Discernibility { penalize_suppression: false }, &[0], &suppressed);
        assert_relative_eq!(pooled, 4.0 + 4.0);
    }

    #[test]
    fn test_entropy_information_loss_range() {
        let plan = SuppressionPlan::feasible_without_suppression();
        let metric = Metric::EntropyBasedInformationLoss;
        let (raw, raw_bound) = score(metric, &[0], &plan);
        let (top, top_bound) = score(metric, &[2], &plan);
        assert_relative_eq!(raw, 0.0, epsilon = 1e-12);
        assert_relative_eq!(top, 4.0, epsilon = 1e-12);
        assert_relative_eq!(raw_bound, raw, epsilon = 1e-12);
        assert_relative_eq!(top_bound, top, epsilon = 1e-12);
    }

    #[test]
    fn test_precomputed_entropy_monotone() {
        let plan = SuppressionPlan::feasible_without_suppression();
        let metric = Metric::PrecomputedEntropy {
            sampling_fraction: 1.0,
            penalize_suppression: true,
        };
        let scores: Vec<f64> = (0..=2).map(|level| score(metric, &[level], &plan).0).collect();
        assert_relative_eq!(scores[0], 0.0);
        assert!(scores[0] <= scores[1] && scores[1] <= scores[2]);
        // Top: 21 -> log2(4/2) twice, 25 and 34 -> log2(4/1).
        assert_relative_eq!(scores[2], 1.0 + 1.0 + 2.0 + 2.0);
    }

    #[test]
    fn test_sampling_fraction_only_changes_how_entropy_is_computed() {
        let data = data();
        // Three distinct ages over four records.
        let metric = |sampling_fraction| Metric::PrecomputedEntropy {
            sampling_fraction,
            penalize_suppression: true,
        };
        let tables = metric(1.0).prepare(&data, FinancialConfiguration::default());
        let exact = metric(0.5).prepare(&data, FinancialConfiguration::default());
        assert_eq!(tables.precomputed, vec![true]);
        assert_eq!(exact.precomputed, vec![false]);
        assert!(exact.cell_entropy[0].is_empty());

        let none = SuppressionPlan::feasible_without_suppression();
        // Class 1 is 25 at level 0 and 30-39 at level 1.
        let second_class = SuppressionPlan {
            feasible: true,
            suppressed_classes: vec![1],
            suppressed_records: 1,
        };
        let cases = [
            (0, &none),
            (1, &none),
            (2, &none),
            (0, &second_class),
            (1, &second_class),
        ];
        for (level, plan) in cases {
            let classes = data.groupify(&[level]);
            assert_relative_eq!(
                tables.evaluate(&[level], &classes, plan),
                exact.evaluate(&[level], &classes, plan),
                epsilon = 1e-12
            );
            assert_relative_eq!(
                tables.lower_bound(&[level]),
                exact.lower_bound(&[level]),
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_precomputed_entropy_suppression_penalty() {
        // Level 1 classes, by key: 20-29 (3), 30-39 (1). Suppress 30-39.
        let plan = SuppressionPlan {
            feasible: true,
            suppressed_classes: vec![1],
            suppressed_records: 1,
        };
        let metric = |penalize_suppression| Metric::PrecomputedEntropy {
            sampling_fraction: 0.1,
            penalize_suppression,
        };
        // 21 -> log2(3/2) twice, 25 -> log2(3), 34 -> log2(1).
        let generalized = 2.0 * 1.5f64.log2() + 3.0f64.log2();
        let (free, free_bound) = score(metric(false), &[1], &plan);
        assert_relative_eq!(free, generalized, epsilon = 1e-12);
        assert_relative_eq!(free_bound, generalized, epsilon = 1e-12);

        // Suppressed 34 costs log2(4/1) as at the top instead of 0.
        let (penalized, _) = score(metric(true), &[1], &plan);
        assert_relative_eq!(penalized, generalized + 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_publisher_payout_not_monotonic() {
        let metric = Metric::PublisherPayout {
            journalist_model: false,
        };
        assert!(!metric.is_monotonic());
        let plan = SuppressionPlan::feasible_without_suppression();
        let (raw, bound) = score(metric, &[0], &plan);
        // Default financials: attacks on classes below 75 records pay off.
        // Unique records lose 300, the pair loses 150 each.
        assert_relative_eq!(raw, 300.0 + 300.0 + 150.0 * 2.0);
        assert!(bound <= raw);
    }
}
