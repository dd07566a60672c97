//! Flat (partitional) clustering results.

use crate::error::Result;
use crate::grid::{GridItems, GridPos};
use crate::hierarchy::{Dendrogram, NodeArena};

/// One cluster of a flat partition.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatCluster {
    pub(crate) centroid: Vec<f64>,
    pub(crate) members: Vec<usize>,
    pub(crate) sse: f64,
}

impl FlatCluster {
    /// Final centroid.
    pub fn centroid(&self) -> &[f64] {
        &self.centroid
    }

    /// Row-major item indices, ascending.
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Never true after training; empty clusters are dropped.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Sum of squared distances from members to the centroid.
    pub fn sse(&self) -> f64 {
        self.sse
    }
}

/// A flat clustering of a grid, as produced by [`KMeans`](super::KMeans).
#[derive(Debug, Clone)]
pub struct FlatPartition {
    pub(crate) items: GridItems,
    pub(crate) clusters: Vec<FlatCluster>,
    pub(crate) assignments: Vec<usize>,
    pub(crate) sse_history: Vec<f64>,
    pub(crate) steps: usize,
    pub(crate) converged: bool,
}

impl FlatPartition {
    /// Non-empty clusters.
    pub fn clusters(&self) -> &[FlatCluster] {
        &self.clusters
    }

    /// Number of non-empty clusters (may be below the requested k).
    pub fn n_clusters(&self) -> usize {
        self.clusters.len()
    }

    /// Cluster index of each item, row-major.
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Cluster index per cell, `grid[row][col]`.
    pub fn assignment_grid(&self) -> Vec<Vec<usize>> {
        self.assignments
            .chunks(self.items.width())
            .map(<[usize]>::to_vec)
            .collect()
    }

    /// Cluster index of the cell at `pos`.
    pub fn cluster_at(&self, pos: GridPos) -> Option<usize> {
        self.items.index_of(pos).map(|i| self.assignments[i])
    }

    /// Total within-cluster sum of squares of the final partition.
    pub fn total_sse(&self) -> f64 {
        self.clusters.iter().map(FlatCluster::sse).sum()
    }

    /// Total SSE after each training step.
    pub fn sse_history(&self) -> &[f64] {
        &self.sse_history
    }

    /// Training steps run.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Whether training stopped on its convergence rule rather than the step
    /// budget.
    pub fn converged(&self) -> bool {
        self.converged
    }

    /// Wrap the partition into a dendrogram so renderers can treat it like a
    /// hierarchical result.
    ///
    /// The members of each cluster are chained left-deep in ascending item
    /// order, then the clusters are chained the same way (`0 + 1`, then
    /// `+ 2`, ...). `cut(n_clusters())` therefore returns exactly the flat
    /// clusters in index order. None of these joins is a linkage distance:
    /// every inserted node has `merge_cost() == None`, and cuts at other
    /// levels have no statistical meaning.
    pub fn to_dendrogram(&self) -> Result<Dendrogram> {
        let mut arena = NodeArena::from_items(&self.items);
        let mut roots = Vec::with_capacity(self.clusters.len());
        for cluster in &self.clusters {
            let leaves: Vec<_> = cluster.members.iter().map(|&i| arena.leaf_id(i)).collect();
            let Some((&first, rest)) = leaves.split_first() else {
                continue;
            };
            let mut acc = first;
            for &leaf in rest {
                acc = arena.merge(acc, leaf, None);
            }
            roots.push(acc);
        }

        let mut roots = roots.into_iter();
        if let Some(mut acc) = roots.next() {
            for root in roots {
                acc = arena.merge(acc, root, None);
            }
        }
        Dendrogram::from_arena(arena)
    }
}
