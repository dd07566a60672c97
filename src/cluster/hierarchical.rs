//! Hierarchical (agglomerative) clustering front end.
//!
//! Picks one of the linkage builders by [`Linkage`] and cuts the resulting
//! dendrogram into a fixed number of groups.
//!
//! | Linkage | Seeds | Cluster distance |
//! |---------|-------|------------------|
//! | Single | grid neighbors | min(pairwise) |
//! | Complete | all pairs | max(pairwise) |
//! | WardNeighbors | grid neighbors | Δ ESS |
//! | WardAllPairs | all pairs | Δ ESS |
//!
//! Neighbor-restricted linkages keep clusters spatially connected on the map
//! and cost O(n) candidates instead of O(n²).

use super::complete::{CollisionPolicy, CompleteLinkage};
use super::single::SingleLinkage;
use super::traits::{Clustering, LinkageBuilder};
use super::ward::{WardLinkage, WardMode};
use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::grid::ItemGrid;
use crate::hierarchy::Dendrogram;
use crate::progress::{NoProgress, Progress};

/// Linkage method for hierarchical clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Linkage {
    /// Single linkage over grid neighbors.
    Single,
    /// Complete linkage over all pairs.
    Complete(CollisionPolicy),
    /// Ward's method over grid neighbors.
    #[default]
    WardNeighbors,
    /// Ward's method over all pairs.
    WardAllPairs(WardMode),
}

/// Hierarchical (agglomerative) clustering.
#[derive(Debug, Clone)]
pub struct HierarchicalClustering {
    /// Number of clusters to produce.
    n_clusters: usize,
    /// Linkage method.
    linkage: Linkage,
}

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer.
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            linkage: Linkage::default(),
        }
    }

    /// Set linkage method.
    pub fn with_linkage(mut self, linkage: Linkage) -> Self {
        self.linkage = linkage;
        self
    }

    /// Configured linkage.
    pub fn linkage(&self) -> Linkage {
        self.linkage
    }

    /// Fit and return the full dendrogram.
    pub fn fit_dendrogram<G, D>(
        &self,
        grid: &G,
        distance: &D,
        progress: &dyn Progress,
    ) -> Result<Dendrogram>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized,
    {
        match self.linkage {
            Linkage::Single => SingleLinkage::new().build(grid, distance, progress),
            Linkage::Complete(policy) => CompleteLinkage::new()
                .with_policy(policy)
                .build(grid, distance, progress),
            Linkage::WardNeighbors => WardLinkage::neighbors().build(grid, distance, progress),
            Linkage::WardAllPairs(mode) => {
                WardLinkage::all_pairs(mode).build(grid, distance, progress)
            }
        }
    }
}

impl Clustering for HierarchicalClustering {
    fn fit_predict<G, D>(&self, grid: &G, distance: &D) -> Result<Vec<usize>>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized,
    {
        let n_items = grid.width() * grid.height();
        if self.n_clusters == 0 || self.n_clusters > n_items {
            return Err(Error::InvalidClusterCount {
                requested: self.n_clusters,
                n_items,
            });
        }
        let dendro = self.fit_dendrogram(grid, distance, &NoProgress)?;
        dendro.labels_at(self.n_clusters)
    }

    fn n_clusters(&self) -> usize {
        self.n_clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Euclidean;
    use crate::grid::WeightGrid;

    fn two_blobs() -> WeightGrid {
        WeightGrid::from_fn(4, 2, |_, c| {
            if c < 2 {
                vec![0.0 + 0.1 * c as f64, 0.0]
            } else {
                vec![10.0 + 0.1 * c as f64, 10.0]
            }
        })
    }

    #[test]
    fn test_hierarchical_basic() {
        let grid = two_blobs();
        for linkage in [
            Linkage::Single,
            Linkage::Complete(CollisionPolicy::Max),
            Linkage::Complete(CollisionPolicy::LastWriteWins),
            Linkage::WardNeighbors,
            Linkage::WardAllPairs(WardMode::Eager),
            Linkage::WardAllPairs(WardMode::Lazy),
        ] {
            let hc = HierarchicalClustering::new(2).with_linkage(linkage);
            let labels = hc.fit_predict(&grid, &Euclidean).unwrap();
            assert_eq!(labels[0], labels[1], "{linkage:?}");
            assert_eq!(labels[0], labels[5], "{linkage:?}");
            assert_eq!(labels[2], labels[7], "{linkage:?}");
            assert_ne!(labels[0], labels[2], "{linkage:?}");
        }
    }

    #[test]
    fn test_dendrogram() {
        let grid = WeightGrid::from_fn(3, 1, |_, c| vec![[0.0, 1.0, 10.0][c]]);
        let hc = HierarchicalClustering::new(2).with_linkage(Linkage::Single);
        let dendro = hc.fit_dendrogram(&grid, &Euclidean, &NoProgress).unwrap();

        assert_eq!(dendro.n_items(), 3);
        assert_eq!(dendro.n_merges(), 2);
    }

    #[test]
    fn cluster_count_out_of_range() {
        let grid = two_blobs();
        let err = HierarchicalClustering::new(9)
            .fit_predict(&grid, &Euclidean)
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidClusterCount {
                requested: 9,
                n_items: 8
            }
        );
        assert!(HierarchicalClustering::new(0)
            .fit_predict(&grid, &Euclidean)
            .is_err());
    }
}
