//! State shared by every agglomerative builder run.
//!
//! One [`Agglomeration`] owns the node arena and the merge queue for a single
//! run. Builders differ only in how they seed the queue, how they cost a pair
//! and what they do with the candidates touching a freshly merged node.

use std::collections::BTreeMap;

use crate::cluster::queue::{MergeCandidate, MergeQueue};
use crate::cluster::seed::Neighborhood;
use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::grid::{GridItems, ItemGrid};
use crate::hierarchy::{ClusterNode, Dendrogram, NodeArena, NodeId};
use crate::progress::Progress;

pub(crate) struct Agglomeration<'a, D: ?Sized> {
    pub(crate) arena: NodeArena,
    pub(crate) queue: MergeQueue,
    items: GridItems,
    distance: &'a D,
    progress: &'a dyn Progress,
    total: usize,
    builder: &'static str,
}

impl<'a, D: Distance + ?Sized> Agglomeration<'a, D> {
    /// Snapshot the grid and create one leaf per cell.
    pub(crate) fn start<G: ItemGrid + ?Sized>(
        builder: &'static str,
        grid: &G,
        distance: &'a D,
        progress: &'a dyn Progress,
    ) -> Result<Self> {
        let items = GridItems::collect(grid)?;
        let arena = NodeArena::from_items(&items);
        log::debug!(
            "{builder}: clustering {}x{} grid ({} items, dim {})",
            items.width(),
            items.height(),
            items.len(),
            items.dim()
        );
        Ok(Self {
            total: items.len() - 1,
            arena,
            queue: MergeQueue::new(),
            items,
            distance,
            progress,
            builder,
        })
    }

    /// Queue one candidate per seeded pair, costed by `cost`.
    pub(crate) fn seed(
        &mut self,
        neighborhood: Neighborhood,
        cost: impl Fn(&Self, NodeId, NodeId) -> Result<f64>,
    ) -> Result<()> {
        let pairs = neighborhood.pairs(self.items.width(), self.items.height());
        self.queue = MergeQueue::with_capacity(pairs.len());
        for (i, j) in pairs {
            let (a, b) = (self.arena.leaf_id(i), self.arena.leaf_id(j));
            let c = cost(self, a, b)?;
            self.queue.push(MergeCandidate::new(a, b, c));
        }
        log::debug!(
            "{}: seeded {} candidates ({neighborhood:?})",
            self.builder,
            self.queue.len()
        );
        Ok(())
    }

    /// Distance between the centroids of two nodes.
    pub(crate) fn centroid_distance(&self, a: NodeId, b: NodeId) -> Result<f64> {
        self.distance
            .distance(self.arena[a].centroid(), self.arena[b].centroid())
    }

    /// Increase in error sum of squares when `a` and `b` are joined.
    pub(crate) fn ess_increase(&self, a: NodeId, b: NodeId) -> Result<f64> {
        ess_increase(&self.arena[a], &self.arena[b], self.distance)
    }

    /// Fail with [`Error::ClusteringAborted`] if the caller asked to stop.
    pub(crate) fn checkpoint(&self) -> Result<()> {
        if self.progress.is_cancelled() {
            log::debug!(
                "{}: aborted after {} of {} merges",
                self.builder,
                self.arena.n_merges(),
                self.total
            );
            return Err(Error::ClusteringAborted);
        }
        Ok(())
    }

    /// Join the two endpoints of `candidate` and report progress.
    pub(crate) fn merge(&mut self, candidate: MergeCandidate) -> NodeId {
        let (a, b) = candidate.endpoints();
        let id = self.arena.merge(a, b, Some(candidate.cost()));
        log::trace!(
            "{}: merge {a} + {b} -> {id} at {:.6}",
            self.builder,
            candidate.cost()
        );
        self.progress.report(self.arena.n_merges(), self.total);
        id
    }

    /// All merges done?
    pub(crate) fn is_complete(&self) -> bool {
        self.arena.n_merges() == self.total
    }

    pub(crate) fn finish(self) -> Result<Dendrogram> {
        if !self.is_complete() {
            log::debug!(
                "{}: queue exhausted after {} of {} merges",
                self.builder,
                self.arena.n_merges(),
                self.total
            );
        }
        let dendrogram = Dendrogram::from_arena(self.arena)?;
        log::debug!(
            "{}: done, {} merges",
            self.builder,
            dendrogram.n_merges()
        );
        Ok(dendrogram)
    }
}

/// Ward's merge cost: `n_a n_b / (n_a + n_b) * d(μ_a, μ_b)²`.
pub fn ess_increase<D: Distance + ?Sized>(
    a: &ClusterNode,
    b: &ClusterNode,
    distance: &D,
) -> Result<f64> {
    let (na, nb) = (a.size() as f64, b.size() as f64);
    let d = distance.distance(a.centroid(), b.centroid())?;
    Ok(na * nb / (na + nb) * d * d)
}

/// Collapse candidates for the same unordered pair into one entry per pair.
///
/// `keep(current, incoming)` picks the survivor. Output is in pair order.
pub(crate) fn dedup_pairs(
    candidates: Vec<MergeCandidate>,
    keep: impl Fn(MergeCandidate, MergeCandidate) -> MergeCandidate,
) -> Vec<MergeCandidate> {
    let mut by_pair: BTreeMap<(NodeId, NodeId), MergeCandidate> = BTreeMap::new();
    for c in candidates {
        by_pair
            .entry(c.endpoints())
            .and_modify(|cur| *cur = keep(*cur, c))
            .or_insert(c);
    }
    by_pair.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Euclidean;
    use crate::grid::WeightGrid;
    use crate::progress::NoProgress;

    #[test]
    fn ess_of_two_points_is_half_squared_distance() {
        let grid = WeightGrid::from_fn(2, 1, |_, c| vec![0.0, 2.0 * c as f64]);
        let run = Agglomeration::start("test", &grid, &Euclidean, &NoProgress).unwrap();
        let (a, b) = (run.arena.leaf_id(0), run.arena.leaf_id(1));
        assert!((run.ess_increase(a, b).unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn ess_weights_by_cluster_size() {
        // {0, 2} has centroid 1 and size 2; joining 4 costs 2*1/3 * 3^2 = 6.
        let grid = WeightGrid::from_fn(3, 1, |_, c| vec![2.0 * c as f64]);
        let mut run = Agglomeration::start("test", &grid, &Euclidean, &NoProgress).unwrap();
        let pair = run.arena.merge(run.arena.leaf_id(0), run.arena.leaf_id(1), None);
        let cost = run.ess_increase(pair, run.arena.leaf_id(2)).unwrap();
        assert!((cost - 6.0).abs() < 1e-12);
    }

    #[test]
    fn dedup_keeps_one_per_pair() {
        let grid = WeightGrid::from_fn(3, 1, |_, _| vec![0.0]);
        let run = Agglomeration::start("test", &grid, &Euclidean, &NoProgress).unwrap();
        let id: Vec<_> = (0..3).map(|i| run.arena.leaf_id(i)).collect();
        let out = dedup_pairs(
            vec![
                MergeCandidate::new(id[0], id[1], 2.0),
                MergeCandidate::new(id[1], id[0], 5.0),
                MergeCandidate::new(id[1], id[2], 1.0),
            ],
            |a, b| if b.cost() > a.cost() { b } else { a },
        );
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].cost(), 5.0);
    }
}
