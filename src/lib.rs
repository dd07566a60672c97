//! # somcluster
//!
//! Clustering for the cells of a trained self-organizing map: agglomerative
//! dendrograms (single, complete and Ward linkage) and k-means partitions over
//! a rectangular lattice of prototype vectors.
//!
//! The crate consumes the lattice through [`ItemGrid`] and distances through
//! [`Distance`]; it never trains a map or renders one. Builders poll a
//! [`Progress`] port and stop with [`Error::ClusteringAborted`] when asked.
//!
//! ```rust
//! use somcluster::cluster::{LinkageBuilder, SingleLinkage};
//! use somcluster::{Euclidean, NoProgress, WeightGrid};
//!
//! let grid = WeightGrid::from_rows(vec![
//!     vec![vec![0.0, 0.0], vec![10.0, 0.0]],
//!     vec![vec![0.0, 1.0], vec![10.0, 1.0]],
//! ])
//! .unwrap();
//!
//! let dendrogram = SingleLinkage::new().build(&grid, &Euclidean, &NoProgress).unwrap();
//! let groups = dendrogram.cut(2).unwrap();
//! assert_eq!(groups.len(), 2);
//! assert_eq!(dendrogram.labels_at(2).unwrap(), vec![0, 1, 0, 1]);
//! ```

pub mod cluster;
pub mod distance;
/// Error types used across `somcluster`.
pub mod error;
pub mod grid;
pub mod hierarchy;
pub mod progress;

#[cfg(test)]
mod scenario_tests;

pub use distance::{Distance, Euclidean, FnDistance, SquaredEuclidean};
pub use error::{Error, Result};
pub use grid::{GridBounds, GridItems, GridPos, ItemGrid, WeightGrid};
pub use hierarchy::{ClusterSubtree, Dendrogram};
pub use progress::{CancelFlag, NoProgress, Progress};

pub use cluster::{
    Clustering, CompleteLinkage, FlatPartition, HierarchicalClustering, KMeans, Linkage,
    LinkageBuilder, SingleLinkage, WardLinkage,
};
