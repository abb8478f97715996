//! Parallel lattice search for the optimal feasible transformation.
//!
//! The top node is classified first. Levels are then processed bottom-up;
//! the pending nodes of a level are classified in parallel on a rayon pool
//! while node states are only updated on the calling thread between levels.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use super::best::{BestRegister, Candidate};
use super::lattice::Lattice;
use crate::domain::{
    plan_suppression, Configuration, EncodedData, MetricContext, SearchStatistics, SuppressionPlan,
};

/// Relative slack for lower-bound pruning, so rounding never prunes a tie.
const PRUNE_TOLERANCE: f64 = 1e-9;

/// Classification state of a lattice node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Unvisited,
    /// Feasible because a specialization is; not scored yet.
    PredictedFeasible,
    Feasible,
    Infeasible,
    /// Cannot improve on the best node.
    Pruned,
}

/// Cooperative cancellation handle shared with the caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Resource settings of a search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Worker threads; 0 uses every available core.
    pub workers: usize,
    /// Maximum number of node classifications.
    pub max_nodes: Option<usize>,
    /// Wall-clock budget in milliseconds.
    pub time_limit_ms: Option<u64>,
}

impl SearchSettings {
    /// Load settings from environment variables, falling back to defaults.
    ///
    /// Unparseable values are ignored.
    #[must_use]
    pub fn from_env_or_default() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("RISKGEN_WORKERS") {
            if let Ok(x) = v.trim().parse::<usize>() {
                cfg.workers = x;
            }
        }

        if let Ok(v) = std::env::var("RISKGEN_MAX_NODES") {
            if let Ok(x) = v.trim().parse::<usize>() {
                cfg.max_nodes = Some(x);
            }
        }

        if let Ok(v) = std::env::var("RISKGEN_TIME_LIMIT_MS") {
            if let Ok(x) = v.trim().parse::<u64>() {
                if x > 0 {
                    cfg.time_limit_ms = Some(x);
                }
            }
        }

        cfg
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = Some(max_nodes);
        self
    }

    #[must_use]
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_ms = Some(u64::try_from(limit.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Worker count with 0 resolved to the available parallelism.
    #[must_use]
    pub fn resolved_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            self.workers
        }
    }
}

/// Stop condition checked before every node classification.
struct StopSignal<'a> {
    token: &'a CancellationToken,
    stopped: AtomicBool,
    admitted: AtomicUsize,
    max_nodes: Option<usize>,
    deadline: Option<Instant>,
}

impl<'a> StopSignal<'a> {
    fn new(token: &'a CancellationToken, settings: &SearchSettings) -> Self {
        Self {
            token,
            stopped: AtomicBool::new(false),
            admitted: AtomicUsize::new(0),
            max_nodes: settings.max_nodes,
            deadline: settings
                .time_limit_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
        }
    }

    /// Whether one more node may be classified.
    fn admit(&self) -> bool {
        if self.stopped.load(Ordering::SeqCst) {
            return false;
        }
        let over_budget = self
            .max_nodes
            .is_some_and(|max| self.admitted.fetch_add(1, Ordering::SeqCst) >= max);
        let expired = self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if over_budget || expired || self.token.is_cancelled() {
            self.stopped.store(true, Ordering::SeqCst);
            return false;
        }
        true
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// Result of classifying one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Feasible(Candidate),
    Infeasible,
}

/// Best node of a finished search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    pub best: Candidate,
    pub levels: Vec<usize>,
    pub used_fallback: bool,
    pub statistics: SearchStatistics,
}

/// Search over the generalization lattice of one encoded dataset.
pub struct LatticeSearch<'a> {
    data: &'a EncodedData,
    configuration: &'a Configuration,
    metric: MetricContext<'a>,
    lattice: Lattice,
    budget: usize,
}

impl<'a> LatticeSearch<'a> {
    #[must_use]
    pub fn new(data: &'a EncodedData, configuration: &'a Configuration) -> Self {
        let heights = data.hierarchies().iter().map(|h| h.height()).collect();
        Self {
            data,
            configuration,
            metric: configuration.metric().prepare(data, *configuration.financial()),
            lattice: Lattice::new(heights),
            budget: configuration.suppression_budget(data.released_count()),
        }
    }

    #[must_use]
    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    #[must_use]
    pub fn metric(&self) -> &MetricContext<'a> {
        &self.metric
    }

    /// Suppression budget in records.
    #[must_use]
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Group `node`, check the criteria and score it.
    ///
    /// A node predicted feasible skips the criteria when nothing may be
    /// suppressed anyway.
    #[must_use]
    pub fn classify(&self, node: usize, predicted: bool) -> Classification {
        let levels = self.lattice.levels_of(node);
        let classes = self.data.groupify(&levels);
        let plan = if predicted && self.budget == 0 {
            SuppressionPlan::feasible_without_suppression()
        } else {
            plan_suppression(
                self.configuration.criteria(),
                self.configuration.financial(),
                &classes,
                self.budget,
                false,
            )
        };
        if !plan.feasible {
            return Classification::Infeasible;
        }
        let score = self.metric.evaluate(&levels, &classes, &plan);
        Classification::Feasible(Candidate {
            node,
            level_sum: self.lattice.level_sum(node),
            score,
            plan,
        })
    }

    /// Score `node` after greedy suppression within the budget, whether or
    /// not the criteria can be met.
    #[must_use]
    pub fn assess(&self, node: usize) -> (Candidate, usize) {
        let levels = self.lattice.levels_of(node);
        let classes = self.data.groupify(&levels);
        let plan = plan_suppression(
            self.configuration.criteria(),
            self.configuration.financial(),
            &classes,
            self.budget,
            true,
        );
        let score = self.metric.evaluate(&levels, &classes, &plan);
        let candidate = Candidate {
            node,
            level_sum: self.lattice.level_sum(node),
            score,
            plan,
        };
        (candidate, classes.len())
    }

    /// Run the search on `pool` until the lattice is exhausted or the search
    /// is stopped.
    #[must_use]
    pub fn run(
        &self,
        pool: &ThreadPool,
        settings: &SearchSettings,
        token: &CancellationToken,
    ) -> SearchOutcome {
        let mut statistics =
            SearchStatistics::started(pool.current_num_threads(), self.lattice.size());
        let mut states = vec![NodeState::Unvisited; self.lattice.size()];
        let register = BestRegister::new(self.lattice.size());
        let stop = StopSignal::new(token, settings);
        let monotonic_criteria = self.configuration.has_monotonic_criteria();
        let prune_generalizations = self.configuration.metric().is_monotonic() && self.budget == 0;

        let top = self.lattice.top();
        if stop.admit() {
            statistics.evaluated_nodes += 1;
            match self.classify(top, false) {
                Classification::Feasible(candidate) => {
                    states[top] = NodeState::Feasible;
                    register.offer(candidate);
                }
                Classification::Infeasible => {
                    states[top] = NodeState::Infeasible;
                    if monotonic_criteria {
                        // Nothing below an infeasible top can be feasible.
                        statistics.tagged_nodes += self.propagate(
                            &mut states,
                            top,
                            false,
                            &[NodeState::Unvisited],
                            NodeState::Infeasible,
                        );
                    }
                }
            }
        }

        for level in 0..self.lattice.level_count() {
            if stop.is_stopped() {
                break;
            }

            let best = register.score();
            let threshold = best + PRUNE_TOLERANCE * best.abs().max(1.0);
            let mut pending = Vec::new();
            for &node in self.lattice.level(level) {
                if !matches!(states[node], NodeState::Unvisited | NodeState::PredictedFeasible) {
                    continue;
                }
                let bound = self.metric.lower_bound(&self.lattice.levels_of(node));
                if bound > threshold {
                    states[node] = NodeState::Pruned;
                    statistics.pruned_nodes += 1
                        + self.propagate(
                            &mut states,
                            node,
                            true,
                            &[NodeState::Unvisited, NodeState::PredictedFeasible],
                            NodeState::Pruned,
                        );
                    continue;
                }
                pending.push((node, states[node] == NodeState::PredictedFeasible));
            }
            if pending.is_empty() {
                continue;
            }

            tracing::debug!(
                "Level {}: classifying {} nodes (best score {})",
                level,
                pending.len(),
                best
            );

            let results: Vec<(usize, Option<Classification>)> = pool.install(|| {
                pending
                    .par_iter()
                    .map(|&(node, predicted)| {
                        if !stop.admit() {
                            return (node, None);
                        }
                        let classification = self.classify(node, predicted);
                        if let Classification::Feasible(candidate) = &classification {
                            register.offer(candidate.clone());
                        }
                        (node, Some(classification))
                    })
                    .collect()
            });

            for (node, classification) in results {
                let Some(classification) = classification else {
                    continue;
                };
                statistics.evaluated_nodes += 1;
                match classification {
                    Classification::Feasible(_) => {
                        states[node] = NodeState::Feasible;
                        if !monotonic_criteria {
                            continue;
                        }
                        if prune_generalizations {
                            statistics.pruned_nodes += self.propagate(
                                &mut states,
                                node,
                                true,
                                &[NodeState::Unvisited, NodeState::PredictedFeasible],
                                NodeState::Pruned,
                            );
                        } else {
                            statistics.tagged_nodes += self.propagate(
                                &mut states,
                                node,
                                true,
                                &[NodeState::Unvisited],
                                NodeState::PredictedFeasible,
                            );
                        }
                    }
                    Classification::Infeasible => {
                        states[node] = NodeState::Infeasible;
                        if monotonic_criteria {
                            statistics.tagged_nodes += self.propagate(
                                &mut states,
                                node,
                                false,
                                &[NodeState::Unvisited],
                                NodeState::Infeasible,
                            );
                        }
                    }
                }
            }
        }

        statistics.cancelled = stop.is_stopped();
        let (best, used_fallback) = match register.get() {
            Some(candidate) => (candidate.clone(), false),
            None => {
                tracing::warn!("No feasible transformation found, using the top node");
                (self.assess(top).0, true)
            }
        };
        statistics.finish();

        SearchOutcome {
            levels: self.lattice.levels_of(best.node),
            best,
            used_fallback,
            statistics,
        }
    }

    /// Breadth-first relabelling from `start` towards generalizations
    /// (`upwards`) or specializations. Only nodes in one of the `from` states
    /// are relabelled, and the walk only continues through those.
    fn propagate(
        &self,
        states: &mut [NodeState],
        start: usize,
        upwards: bool,
        from: &[NodeState],
        to: NodeState,
    ) -> usize {
        let mut queue = VecDeque::from([start]);
        let mut marked = 0;
        while let Some(node) = queue.pop_front() {
            let neighbours: Vec<usize> = if upwards {
                self.lattice.successors(node).collect()
            } else {
                self.lattice.predecessors(node).collect()
            };
            for neighbour in neighbours {
                if from.contains(&states[neighbour]) {
                    states[neighbour] = to;
                    marked += 1;
                    queue.push_back(neighbour);
                }
            }
        }
        marked
    }
}
