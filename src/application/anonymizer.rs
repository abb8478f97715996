//! Anonymizer service: entry point for searching, assessing and applying
//! transformations.

use rayon::{ThreadPool, ThreadPoolBuilder};

use super::search::{CancellationToken, LatticeSearch, SearchSettings};
use crate::domain::{
    AnonymizationResult, Assessment, Configuration, DataError, Dataset, EncodedData, Transformation,
};
use crate::Result;

/// Label written for quasi-identifiers of suppressed records.
pub const SUPPRESSED_VALUE: &str = "*";

/// Runs lattice searches on a dedicated worker pool.
pub struct Anonymizer {
    settings: SearchSettings,
    pool: ThreadPool,
}

impl Anonymizer {
    /// Create an anonymizer with settings from the environment.
    ///
    /// # Errors
    /// Returns error if the worker pool cannot be started.
    pub fn new() -> Result<Self> {
        Self::with_settings(SearchSettings::from_env_or_default())
    }

    /// Create an anonymizer with explicit settings.
    ///
    /// # Errors
    /// Returns error if the worker pool cannot be started.
    pub fn with_settings(settings: SearchSettings) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(settings.resolved_workers())
            .thread_name(|index| format!("riskgen-worker-{index}"))
            .build()?;
        Ok(Self { settings, pool })
    }

    #[must_use]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Number of worker threads.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Find the optimal feasible transformation of `dataset`.
    ///
    /// # Errors
    /// Returns error if the dataset, its hierarchies or the research subset
    /// are invalid. An exhausted search is not an error; see
    /// [`AnonymizationResult::used_fallback`].
    pub fn anonymize(
        &self,
        dataset: &Dataset,
        configuration: &Configuration,
    ) -> Result<AnonymizationResult> {
        self.anonymize_with_cancellation(dataset, configuration, &CancellationToken::new())
    }

    /// Like [`Self::anonymize`], stopping early once `token` is cancelled.
    ///
    /// # Errors
    /// Same as [`Self::anonymize`].
    pub fn anonymize_with_cancellation(
        &self,
        dataset: &Dataset,
        configuration: &Configuration,
        token: &CancellationToken,
    ) -> Result<AnonymizationResult> {
        let data = EncodedData::encode(dataset, configuration.released_subset())?;
        let search = LatticeSearch::new(&data, configuration);

        tracing::info!(
            "Anonymizing {} records ({} released): {} quasi-identifiers, {} nodes, suppression budget {}",
            data.rows(),
            data.released_count(),
            data.width(),
            search.lattice().size(),
            search.budget()
        );

        let outcome = search.run(&self.pool, &self.settings, token);
        let transformation = Transformation::new(
            data.attributes().to_vec(),
            outcome.levels,
            outcome.best.plan.suppressed_records,
        );

        if outcome.used_fallback {
            tracing::warn!(
                "Search ended without a feasible transformation; released the top node with {} records suppressed",
                transformation.suppressed_records()
            );
        }
        tracing::info!(
            "Best transformation {:?}: score {}, {} suppressed, {} nodes evaluated in {} ms",
            transformation.levels(),
            outcome.best.score,
            transformation.suppressed_records(),
            outcome.statistics.evaluated_nodes,
            outcome.statistics.elapsed_ms
        );

        Ok(AnonymizationResult {
            suppressed_record_count: transformation.suppressed_records(),
            transformation,
            achieved_score: outcome.best.score,
            used_fallback: outcome.used_fallback,
            statistics: outcome.statistics,
        })
    }

    /// Evaluate a single transformation given as one level per
    /// quasi-identifier, in column order.
    ///
    /// # Errors
    /// Returns error for invalid input data or levels outside the lattice.
    pub fn assess(
        &self,
        dataset: &Dataset,
        configuration: &Configuration,
        levels: &[usize],
    ) -> Result<Assessment> {
        let data = EncodedData::encode(dataset, configuration.released_subset())?;
        let search = LatticeSearch::new(&data, configuration);
        let node = node_of(&data, &search, levels)?;

        let (candidate, equivalence_classes) = search.assess(node);
        tracing::debug!(
            "Assessed {:?}: feasible={}, score {}",
            levels,
            candidate.plan.feasible,
            candidate.score
        );

        Ok(Assessment {
            transformation: Transformation::new(
                data.attributes().to_vec(),
                levels.to_vec(),
                candidate.plan.suppressed_records,
            ),
            feasible: candidate.plan.feasible,
            score: candidate.score,
            lower_bound: search.metric().lower_bound(levels),
            equivalence_classes,
        })
    }

    /// Render the released records under `transformation`: quasi-identifiers
    /// are generalized, suppressed records get [`SUPPRESSED_VALUE`], other
    /// attributes are copied.
    ///
    /// # Errors
    /// Returns error for invalid input data or a transformation that does
    /// not match the dataset's quasi-identifiers.
    pub fn apply(
        &self,
        dataset: &Dataset,
        configuration: &Configuration,
        transformation: &Transformation,
    ) -> Result<Dataset> {
        let data = EncodedData::encode(dataset, configuration.released_subset())?;
        let levels = data
            .attributes()
            .iter()
            .map(|attribute| {
                transformation
                    .level_of(attribute)
                    .ok_or_else(|| DataError::UnknownAttribute(attribute.clone()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let search = LatticeSearch::new(&data, configuration);
        let node = node_of(&data, &search, &levels)?;
        let classes = data.groupify(&levels);
        let (candidate, _) = search.assess(node);

        let mut rows = Vec::with_capacity(data.released_count());
        for (index, record) in dataset.rows().iter().enumerate() {
            let Some(class) = classes.class_of(index) else {
                continue;
            };
            let mut row = record.clone();
            for (position, &column) in data.columns().iter().enumerate() {
                row[column] = if candidate.plan.is_suppressed(class) {
                    SUPPRESSED_VALUE.to_string()
                } else {
                    let hierarchy = &data.hierarchies()[position];
                    let id = classes.classes()[class].key[position];
                    hierarchy.label(levels[position], id).to_string()
                };
            }
            rows.push(row);
        }

        tracing::info!(
            "Released {} records, {} suppressed",
            rows.len(),
            candidate.plan.suppressed_records
        );
        Ok(Dataset::new(dataset.header().to_vec(), rows)?)
    }
}

fn node_of(data: &EncodedData, search: &LatticeSearch<'_>, levels: &[usize]) -> Result<usize> {
    if levels.len() != data.width() {
        return Err(DataError::TransformationWidth {
            expected: data.width(),
            found: levels.len(),
        }
        .into());
    }
    for ((attribute, hierarchy), &level) in data.attributes().iter().zip(data.hierarchies()).zip(levels) {
        if level > hierarchy.height() {
            return Err(DataError::LevelOutOfRange {
                attribute: attribute.clone(),
                level,
                height: hierarchy.height(),
            }
            .into());
        }
    }
    search.lattice().node_of(levels).ok_or_else(|| {
        DataError::TransformationWidth {
            expected: data.width(),
            found: levels.len(),
        }
        .into()
    })
}
