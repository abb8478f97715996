//! # riskgen
//!
//! Risk-based anonymization of person-level tables.
//!
//! This crate provides:
//! - Privacy criteria derived from a financial re-identification game
//!   (prosecutor and journalist attackers, attack-aware or not)
//! - Utility metrics with monotone lower bounds
//! - A parallel search over the generalization lattice with record
//!   suppression
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core types (Dataset, Hierarchy, criteria, metrics, configuration)
//! - `ports`: Trait definitions for loading inputs
//! - `adapters`: Concrete implementations (delimited files, JSON configuration)
//! - `application`: Lattice search and the anonymizer service

pub mod adapters;
pub mod application;
pub mod domain;
pub mod ports;

pub use application::{Anonymizer, CancellationToken, SearchSettings};
pub use domain::{
    configure, AnonymizationResult, Configuration, DataSubset, Dataset, FinancialConfiguration,
    Hierarchy, Metric, PrivacyCriterion, Transformation,
};

/// Result type for riskgen operations
pub type Result<T> = std::result::Result<T, RiskgenError>;

/// Main error type for riskgen
#[derive(Debug, thiserror::Error)]
pub enum RiskgenError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] domain::ConfigError),

    #[error("Invalid data: {0}")]
    Data(#[from] domain::DataError),

    #[error("Invalid hierarchy: {0}")]
    Hierarchy(#[from] domain::HierarchyError),

    #[error("Input error: {0}")]
    Source(#[from] adapters::SourceError),

    #[error("Worker pool unavailable: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Anonymize `dataset` with an [`Anonymizer`] configured from the
/// environment.
///
/// # Errors
/// Returns error if the worker pool cannot be started or the inputs are
/// invalid.
pub fn anonymize(dataset: &Dataset, configuration: &Configuration) -> Result<AnonymizationResult> {
    Anonymizer::new()?.anonymize(dataset, configuration)
}
