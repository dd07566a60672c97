//! Ward's minimum-variance linkage.
//!
//! The cost of joining two clusters is the increase in error sum of squares
//! (see [`ess_increase`](super::ess_increase)). Unlike single or complete
//! linkage it cannot be derived from the children's old costs, so every
//! candidate touching a merged node is re-costed against the new centroid.
//!
//! Two seedings and two recomputation modes are available:
//!
//! | Builder | Seeds | After a merge |
//! |---------|-------|---------------|
//! | [`WardLinkage::neighbors`] | adjacent cells | relabel + re-cost touched candidates |
//! | [`WardLinkage::all_pairs`] with [`WardMode::Eager`] | all pairs | relabel + re-cost touched candidates |
//! | [`WardLinkage::all_pairs`] with [`WardMode::Lazy`] | all pairs | nothing; stale candidates are fixed when popped |
//!
//! # Lazy recomputation
//!
//! In lazy mode merged nodes keep a forwarding pointer to their parent. A
//! popped candidate is resolved to the current roots of its endpoints:
//!
//! - both endpoints already current: merge
//! - both resolve to the same root: stale duplicate, discard
//! - otherwise: re-cost against the roots and push back
//!
//! Ward's cost is reducible (joining `A` and `B` never brings the union
//! closer to `X` than the nearer of `A` and `B`), so a stale entry never
//! overstates the current cost of the pair it resolves to. Lazy mode thus
//! produces the same merge sequence as eager mode with O(n²) queue work
//! instead of O(n³).

use super::agglomerate::{dedup_pairs, Agglomeration};
use super::queue::MergeCandidate;
use super::seed::Neighborhood;
use super::traits::LinkageBuilder;
use crate::distance::Distance;
use crate::error::Result;
use crate::grid::ItemGrid;
use crate::hierarchy::Dendrogram;
use crate::progress::Progress;

/// Recomputation strategy for all-pairs Ward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WardMode {
    /// Re-cost every candidate touching the merged node right away.
    #[default]
    Eager,
    /// Re-cost candidates only when they reach the front of the queue.
    Lazy,
}

/// Ward's linkage builder.
#[derive(Debug, Clone, Copy)]
pub struct WardLinkage {
    neighborhood: Neighborhood,
    mode: WardMode,
}

impl WardLinkage {
    /// Seed only grid-adjacent pairs.
    pub fn neighbors() -> Self {
        Self {
            neighborhood: Neighborhood::Adjacent,
            mode: WardMode::Eager,
        }
    }

    /// Seed all pairs, recomputing per `mode`.
    pub fn all_pairs(mode: WardMode) -> Self {
        Self {
            neighborhood: Neighborhood::AllPairs,
            mode,
        }
    }

    /// Which pairs are seeded.
    pub fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }

    /// Recomputation strategy.
    pub fn mode(&self) -> WardMode {
        self.mode
    }

    fn run_eager<D: Distance + ?Sized>(&self, run: &mut Agglomeration<'_, D>) -> Result<()> {
        while let Some(candidate) = run.queue.pop_min() {
            run.checkpoint()?;
            let (a, b) = candidate.endpoints();
            let merged = run.merge(candidate);
            let moved = run.queue.relabel(&[a, b], merged);
            for stale in dedup_pairs(moved, |cur, _| cur) {
                let (p, q) = stale.endpoints();
                let cost = run.ess_increase(p, q)?;
                run.queue.push(stale.with_cost(cost));
            }
        }
        Ok(())
    }

    fn run_lazy<D: Distance + ?Sized>(&self, run: &mut Agglomeration<'_, D>) -> Result<()> {
        let mut requeued = 0usize;
        let mut discarded = 0usize;
        while let Some(candidate) = run.queue.pop_min() {
            let (a, b) = candidate.endpoints();
            let (ra, rb) = (run.arena.find_root(a), run.arena.find_root(b));
            if ra == rb {
                discarded += 1;
                continue;
            }
            if (ra, rb) != (a, b) {
                let fresh = MergeCandidate::new(ra, rb, 0.0);
                let (p, q) = fresh.endpoints();
                let cost = run.ess_increase(p, q)?;
                run.queue.push(fresh.with_cost(cost));
                requeued += 1;
                continue;
            }
            run.checkpoint()?;
            run.merge(candidate);
            if run.is_complete() {
                break;
            }
        }
        log::debug!("ward-linkage: lazy mode requeued {requeued}, discarded {discarded}");
        Ok(())
    }
}

impl Default for WardLinkage {
    fn default() -> Self {
        Self::neighbors()
    }
}

impl LinkageBuilder for WardLinkage {
    fn build<G, D>(&self, grid: &G, distance: &D, progress: &dyn Progress) -> Result<Dendrogram>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized,
    {
        let mut run = Agglomeration::start(self.name(), grid, distance, progress)?;
        run.seed(self.neighborhood, |run, a, b| run.ess_increase(a, b))?;
        match (self.neighborhood, self.mode) {
            (Neighborhood::AllPairs, WardMode::Lazy) => self.run_lazy(&mut run)?,
            _ => self.run_eager(&mut run)?,
        }
        run.finish()
    }

    fn name(&self) -> &'static str {
        "ward-linkage"
    }
}
