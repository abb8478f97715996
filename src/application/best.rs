//! Lock-free register of the best feasible node found so far.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::domain::SuppressionPlan;

/// A feasible node and its score.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub node: usize,
    pub level_sum: usize,
    pub score: f64,
    pub plan: SuppressionPlan,
}

impl Candidate {
    /// Total order: score, then total level, then suppressed records, then
    /// node id.
    #[must_use]
    pub fn cmp_quality(&self, other: &Self) -> CmpOrdering {
        self.score
            .total_cmp(&other.score)
            .then(self.level_sum.cmp(&other.level_sum))
            .then(self.plan.suppressed_records.cmp(&other.plan.suppressed_records))
            .then(self.node.cmp(&other.node))
    }

    #[must_use]
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.cmp_quality(other) == CmpOrdering::Less
    }
}

/// Shared best-so-far slot.
///
/// Candidates live in a per-node arena; the register itself is a single
/// atomic holding `node + 1` (0 = empty). A candidate is only installed if it
/// is strictly better than the incumbent, so the final value does not depend
/// on the order in which workers finish.
#[derive(Debug)]
pub struct BestRegister {
    arena: Vec<OnceLock<Candidate>>,
    best: AtomicUsize,
}

impl BestRegister {
    #[must_use]
    pub fn new(lattice_size: usize) -> Self {
        Self {
            arena: (0..lattice_size).map(|_| OnceLock::new()).collect(),
            best: AtomicUsize::new(0),
        }
    }

    /// Offer a candidate. Returns `true` if it became the new best.
    ///
    /// Each node can be offered once; later offers for the same node are
    /// ignored.
    pub fn offer(&self, candidate: Candidate) -> bool {
        let node = candidate.node;
        let Some(slot) = self.arena.get(node) else {
            return false;
        };
        if slot.set(candidate).is_err() {
            return false;
        }
        let Some(offered) = slot.get() else {
            return false;
        };

        loop {
            let current = self.best.load(Ordering::SeqCst);
            if let Some(incumbent) = self.lookup(current) {
                if !offered.is_better_than(incumbent) {
                    return false;
                }
            }
            match self.best.compare_exchange_weak(
                current,
                node + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return true,
                Err(_) => continue,
            }
        }
    }

    fn lookup(&self, tagged: usize) -> Option<&Candidate> {
        tagged
            .checked_sub(1)
            .and_then(|node| self.arena.get(node))
            .and_then(OnceLock::get)
    }

    /// Current best candidate.
    #[must_use]
    pub fn get(&self) -> Option<&Candidate> {
        self.lookup(self.best.load(Ordering::SeqCst))
    }

    /// Score of the current best, `+inf` when empty.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.get().map_or(f64::INFINITY, |c| c.score)
    }
}
