//! Anonymization configuration.
//!
//! A [`Configuration`] is validated when it is built and is immutable
//! afterwards. It can be assembled with [`configure`], with the fluent
//! [`ConfigurationBuilder`], or parsed from JSON as a [`ConfigurationSpec`].

use serde::{Deserialize, Serialize};

use super::criterion::{CriterionKind, PrivacyCriterion};
use super::dataset::DataSubset;
use super::financial::FinancialConfiguration;
use super::metric::Metric;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Suppression limit must lie in [0, 1], got {0}")]
    SuppressionLimitOutOfRange(f64),

    #[error("No utility metric configured")]
    MissingMetric,

    #[error("No privacy criterion configured")]
    NoCriteria,

    #[error("Conflicting criteria: {0}")]
    ConflictingCriteria(String),

    #[error("Invalid financial parameter {name}: {value}")]
    InvalidFinancialParameter { name: &'static str, value: f64 },

    #[error("Invalid metric parameter {name}: {value}")]
    InvalidMetricParameter { name: &'static str, value: f64 },

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Unknown privacy criterion: {0}")]
    UnknownCriterion(String),

    #[error("Criterion {0} requires a research subset")]
    MissingSubset(&'static str),
}

/// Frozen anonymization settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    suppression_limit: f64,
    metric: Metric,
    criteria: Vec<PrivacyCriterion>,
    financial: FinancialConfiguration,
}

/// Assemble and validate a configuration.
///
/// `financial` falls back to [`FinancialConfiguration::default`].
///
/// # Errors
/// Returns error if the limit is outside `[0, 1]`, the metric is missing or
/// has invalid parameters, there are no criteria, criteria conflict, or a
/// financial parameter is invalid.
pub fn configure(
    suppression_limit: f64,
    metric: Option<Metric>,
    criteria: Vec<PrivacyCriterion>,
    financial: Option<FinancialConfiguration>,
) -> Result<Configuration, ConfigError> {
    if !suppression_limit.is_finite() || !(0.0..=1.0).contains(&suppression_limit) {
        return Err(ConfigError::SuppressionLimitOutOfRange(suppression_limit));
    }

    let metric = metric.ok_or(ConfigError::MissingMetric)?;
    metric.validate()?;

    if criteria.is_empty() {
        return Err(ConfigError::NoCriteria);
    }
    for (position, criterion) in criteria.iter().enumerate() {
        if criteria[..position].iter().any(|c| c.kind() == criterion.kind()) {
            return Err(ConfigError::ConflictingCriteria(format!(
                "{} configured twice",
                criterion.kind().name()
            )));
        }
    }
    let mut subsets = criteria.iter().filter_map(PrivacyCriterion::subset);
    if let Some(first) = subsets.next() {
        if subsets.any(|other| other != first) {
            return Err(ConfigError::ConflictingCriteria(
                "journalist criteria use different research subsets".to_string(),
            ));
        }
    }

    let financial = financial.unwrap_or_default();
    financial.validate()?;

    Ok(Configuration {
        suppression_limit,
        metric,
        criteria,
        financial,
    })
}

impl Configuration {
    #[must_use]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::default()
    }

    /// Maximum fraction of released records that may be suppressed.
    #[must_use]
    pub fn suppression_limit(&self) -> f64 {
        self.suppression_limit
    }

    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    #[must_use]
    pub fn criteria(&self) -> &[PrivacyCriterion] {
        &self.criteria
    }

    #[must_use]
    pub fn financial(&self) -> &FinancialConfiguration {
        &self.financial
    }

    /// Research subset that is released, if a journalist criterion is set.
    #[must_use]
    pub fn released_subset(&self) -> Option<&DataSubset> {
        self.criteria.iter().find_map(PrivacyCriterion::subset)
    }

    /// Whether every criterion is monotone under generalization.
    #[must_use]
    pub fn has_monotonic_criteria(&self) -> bool {
        self.criteria.iter().all(PrivacyCriterion::is_monotonic)
    }

    /// Suppression budget in records for `released` released records.
    #[must_use]
    pub fn suppression_budget(&self, released: usize) -> usize {
        // The epsilon keeps limits like 0.04 * 25 from rounding down to 0.
        (self.suppression_limit * released as f64 + 1e-9).floor() as usize
    }
}

/// Fluent builder for [`Configuration`].
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBuilder {
    suppression_limit: f64,
    metric: Option<Metric>,
    criteria: Vec<PrivacyCriterion>,
    financial: Option<FinancialConfiguration>,
}

impl ConfigurationBuilder {
    #[must_use]
    pub fn suppression_limit(mut self, limit: f64) -> Self {
        self.suppression_limit = limit;
        self
    }

    #[must_use]
    pub fn metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    #[must_use]
    pub fn criterion(mut self, criterion: PrivacyCriterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    #[must_use]
    pub fn financial(mut self, financial: FinancialConfiguration) -> Self {
        self.financial = Some(financial);
        self
    }

    /// # Errors
    /// Same as [`configure`].
    pub fn build(self) -> Result<Configuration, ConfigError> {
        configure(
            self.suppression_limit,
            self.metric,
            self.criteria,
            self.financial,
        )
    }
}

/// Metric given either by registry name or with explicit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricSpec {
    Name(String),
    Parameters(Metric),
}

/// Serializable configuration, as read from a JSON file.
///
/// ```json
/// {
///   "suppression_limit": 0.04,
///   "metric": "loss",
///   "criteria": ["journalist"],
///   "financial": { "adversary_cost": 20, "adversary_gain": 120,
///                  "publisher_loss": 3000, "publisher_benefit": 1200 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationSpec {
    #[serde(default)]
    pub suppression_limit: f64,
    #[serde(default)]
    pub metric: Option<MetricSpec>,
    #[serde(default)]
    pub criteria: Vec<String>,
    #[serde(default)]
    pub financial: Option<FinancialConfiguration>,
}

impl ConfigurationSpec {
    /// Resolve registry names and validate.
    ///
    /// `subset` is attached to every journalist criterion.
    ///
    /// # Errors
    /// Returns error for unknown names, journalist criteria without a
    /// subset, and everything [`configure`] rejects.
    pub fn into_configuration(self, subset: Option<DataSubset>) -> Result<Configuration, ConfigError> {
        let metric = match self.metric {
            Some(MetricSpec::Name(name)) => Some(Metric::from_name(&name)?),
            Some(MetricSpec::Parameters(metric)) => Some(metric),
            None => None,
        };

        let criteria = self
            .criteria
            .iter()
            .map(|name| {
                let kind = CriterionKind::from_name(name)?;
                PrivacyCriterion::from_kind(kind, subset.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;

        configure(self.suppression_limit, metric, criteria, self.financial)
    }
}
