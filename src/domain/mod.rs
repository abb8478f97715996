//! Domain layer: Core anonymization types and logic.
//!
//! Everything here is pure and synchronous: datasets and hierarchies, the
//! financial model, privacy criteria, utility metrics and the validated
//! configuration tying them together.

mod config;
mod criterion;
mod dataset;
mod encoding;
mod financial;
mod hierarchy;
mod metric;
mod transformation;

pub use config::{configure, ConfigError, Configuration, ConfigurationBuilder, ConfigurationSpec, MetricSpec};
pub use criterion::{plan_suppression, AttackerModel, CriterionKind, PrivacyCriterion, SuppressionPlan};
pub use dataset::{DataError, DataSubset, Dataset};
pub use encoding::{EncodedData, EncodedHierarchy, EquivalenceClass, EquivalenceClasses};
pub use financial::FinancialConfiguration;
pub use hierarchy::{Hierarchy, HierarchyError};
pub use metric::{Metric, MetricContext, MetricKind};
pub use transformation::{AnonymizationResult, Assessment, SearchStatistics, Transformation};
