//! Privacy criteria of the re-identification game.
//!
//! Every criterion is a predicate over equivalence classes. A class that a
//! criterion rejects is *offending*; a transformation is acceptable when all
//! offending classes fit into the suppression budget.
//!
//! | kind | success probability | class accepted when |
//! |---|---|---|
//! | prosecutor, no attack | `1 / count` | publisher net under attack `>= 0` |
//! | prosecutor | `1 / count` | adversary payout `<= 0` |
//! | journalist, no attack | `1 / pcount` | publisher net under attack `>= 0` |
//! | journalist | `1 / pcount` | adversary payout `<= 0` |

use std::cmp::Reverse;

use serde::{Deserialize, Serialize};

use super::config::ConfigError;
use super::dataset::DataSubset;
use super::encoding::{EquivalenceClass, EquivalenceClasses};
use super::financial::FinancialConfiguration;

/// Which attacker the criterion models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackerModel {
    /// Knows the target is in the release.
    Prosecutor,
    /// Only knows the target belongs to the population.
    Journalist,
}

/// Registry entry for a criterion variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
    ProsecutorNoAttack,
    Prosecutor,
    JournalistNoAttack,
    Journalist,
}

impl CriterionKind {
    /// Every registered criterion.
    pub const ALL: [CriterionKind; 4] = [
        Self::ProsecutorNoAttack,
        Self::Prosecutor,
        Self::JournalistNoAttack,
        Self::Journalist,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ProsecutorNoAttack => "prosecutor_no_attack",
            Self::Prosecutor => "prosecutor",
            Self::JournalistNoAttack => "journalist_no_attack",
            Self::Journalist => "journalist",
        }
    }

    /// Look up a criterion by its registry name.
    ///
    /// # Errors
    /// Returns `ConfigError::UnknownCriterion` for unregistered names.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ConfigError::UnknownCriterion(name.to_string()))
    }

    #[must_use]
    pub fn attacker(self) -> AttackerModel {
        match self {
            Self::ProsecutorNoAttack | Self::Prosecutor => AttackerModel::Prosecutor,
            Self::JournalistNoAttack | Self::Journalist => AttackerModel::Journalist,
        }
    }

    /// Whether the adversary decides rationally whether to attack.
    #[must_use]
    pub fn is_attack_aware(self) -> bool {
        matches!(self, Self::Prosecutor | Self::Journalist)
    }

    /// Accepted transformations stay accepted under further generalization.
    ///
    /// All registered kinds only depend on class sizes, which never shrink
    /// when classes merge.
    #[must_use]
    pub fn is_monotonic(self) -> bool {
        true
    }
}

/// A privacy criterion attached to a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivacyCriterion {
    ProsecutorNoAttack,
    Prosecutor,
    JournalistNoAttack(DataSubset),
    Journalist(DataSubset),
}

impl PrivacyCriterion {
    /// Build a criterion from its registry kind.
    ///
    /// # Errors
    /// Returns `ConfigError::MissingSubset` for journalist kinds without a
    /// subset.
    pub fn from_kind(kind: CriterionKind, subset: Option<DataSubset>) -> Result<Self, ConfigError> {
        match kind {
            CriterionKind::ProsecutorNoAttack => Ok(Self::ProsecutorNoAttack),
            CriterionKind::Prosecutor => Ok(Self::Prosecutor),
            CriterionKind::JournalistNoAttack => subset
                .map(Self::JournalistNoAttack)
                .ok_or(ConfigError::MissingSubset(kind.name())),
            CriterionKind::Journalist => subset
                .map(Self::Journalist)
                .ok_or(ConfigError::MissingSubset(kind.name())),
        }
    }

    #[must_use]
    pub fn kind(&self) -> CriterionKind {
        match self {
            Self::ProsecutorNoAttack => CriterionKind::ProsecutorNoAttack,
            Self::Prosecutor => CriterionKind::Prosecutor,
            Self::JournalistNoAttack(_) => CriterionKind::JournalistNoAttack,
            Self::Journalist(_) => CriterionKind::Journalist,
        }
    }

    /// Research subset of journalist criteria.
    #[must_use]
    pub fn subset(&self) -> Option<&DataSubset> {
        match self {
            Self::JournalistNoAttack(subset) | Self::Journalist(subset) => Some(subset),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_monotonic(&self) -> bool {
        self.kind().is_monotonic()
    }

    /// Re-identification probability of a record in `class` for this
    /// criterion's attacker.
    #[must_use]
    pub fn success_probability(&self, class: &EquivalenceClass) -> f64 {
        match self.kind().attacker() {
            AttackerModel::Prosecutor => FinancialConfiguration::success_probability(class.count),
            AttackerModel::Journalist => FinancialConfiguration::success_probability(class.pcount),
        }
    }

    /// Whether `class` may be released unsuppressed.
    #[must_use]
    pub fn accepts(&self, class: &EquivalenceClass, financial: &FinancialConfiguration) -> bool {
        let p = self.success_probability(class);
        if self.kind().is_attack_aware() {
            !financial.is_attack_profitable(p)
        } else {
            financial.publisher_net_under_attack(p) >= 0.0
        }
    }
}

/// Suppression decided for one transformation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SuppressionPlan {
    /// Whether every criterion holds after suppression.
    pub feasible: bool,
    /// Indices of suppressed classes, in suppression order.
    pub suppressed_classes: Vec<usize>,
    /// Records removed by suppression.
    pub suppressed_records: usize,
}

impl SuppressionPlan {
    /// Plan for a transformation known to satisfy every criterion.
    #[must_use]
    pub fn feasible_without_suppression() -> Self {
        Self {
            feasible: true,
            ..Self::default()
        }
    }

    /// Whether the class at `index` is suppressed.
    #[must_use]
    pub fn is_suppressed(&self, index: usize) -> bool {
        self.suppressed_classes.contains(&index)
    }

    /// Per-class suppression flags for `len` classes.
    #[must_use]
    pub fn mask(&self, len: usize) -> Vec<bool> {
        let mut mask = vec![false; len];
        for &class in &self.suppressed_classes {
            mask[class] = true;
        }
        mask
    }
}

/// Evaluate `criteria` (AND semantics) over `classes`, suppressing offending
/// classes greedily, largest first, within `budget` records.
///
/// Criteria are checked in order and evaluation stops as soon as the
/// offending records exceed the budget. With `exhaustive` set, the greedy
/// suppression is carried out even then, which is what the fallback needs.
#[must_use]
pub fn plan_suppression(
    criteria: &[PrivacyCriterion],
    financial: &FinancialConfiguration,
    classes: &EquivalenceClasses,
    budget: usize,
    exhaustive: bool,
) -> SuppressionPlan {
    let mut offending = vec![false; classes.len()];
    let mut offending_records = 0usize;

    for criterion in criteria {
        for (index, class) in classes.classes().iter().enumerate() {
            if !offending[index] && !criterion.accepts(class, financial) {
                offending[index] = true;
                offending_records += class.count;
            }
        }
        if offending_records > budget && !exhaustive {
            return SuppressionPlan::default();
        }
    }

    if offending_records == 0 {
        return SuppressionPlan::feasible_without_suppression();
    }

    let mut candidates: Vec<usize> = (0..classes.len()).filter(|&i| offending[i]).collect();
    candidates.sort_by_key(|&i| (Reverse(classes.classes()[i].count), i));

    let mut plan = SuppressionPlan::default();
    for index in candidates {
        let count = classes.classes()[index].count;
        if plan.suppressed_records + count <= budget {
            plan.suppressed_records += count;
            plan.suppressed_classes.push(index);
            offending[index] = false;
        }
    }

    // Re-check: anything still offending makes the transformation infeasible.
    plan.feasible = !offending.iter().any(|o| *o);
    plan
}
