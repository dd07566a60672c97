//! Clustering traits.

use crate::distance::Distance;
use crate::error::Result;
use crate::grid::ItemGrid;
use crate::hierarchy::Dendrogram;
use crate::progress::Progress;

/// Builds a full dendrogram over a grid.
pub trait LinkageBuilder {
    /// Run the builder to completion.
    ///
    /// Polls `progress` before every merge and returns
    /// [`Error::ClusteringAborted`](crate::Error::ClusteringAborted) if it
    /// reports cancellation.
    fn build<G, D>(&self, grid: &G, distance: &D, progress: &dyn Progress) -> Result<Dendrogram>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Trait for clustering algorithms that produce a flat labeling.
pub trait Clustering {
    /// Cluster the grid and return one label per item, row-major.
    fn fit_predict<G, D>(&self, grid: &G, distance: &D) -> Result<Vec<usize>>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized;

    /// Get the number of clusters.
    fn n_clusters(&self) -> usize;
}
