//! Clustering algorithms over the cells of a trained map.
//!
//! Every algorithm reads an [`ItemGrid`](crate::grid::ItemGrid) and a
//! [`Distance`](crate::distance::Distance). The agglomerative builders return a
//! [`Dendrogram`](crate::hierarchy::Dendrogram) that can be cut at any level;
//! k-means returns a [`FlatPartition`].
//!
//! ## Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each cell as its own cluster, repeatedly merge the
//! two cheapest clusters until one remains. Candidates sit in a [`MergeQueue`]
//! ordered by cost, ties broken by node id, so runs are deterministic.
//!
//! **Linkage methods** determine "distance between clusters":
//!
//! | Builder | Seeds | Cost | Effect |
//! |---------|-------|------|--------|
//! | [`SingleLinkage`] | grid neighbors | min(pairwise) | Chaining; follows map ridges |
//! | [`CompleteLinkage`] | all pairs | max(pairwise) | Compact clusters |
//! | [`WardLinkage`] | neighbors or all pairs | ESS increase | Minimizes within-cluster variance |
//!
//! ## K-means
//!
//! Lloyd's algorithm with five initialization strategies and empty-cluster
//! re-seeding. See [`KMeans`].
//!
//! ## Usage
//!
//! ```rust
//! use somcluster::cluster::{Clustering, HierarchicalClustering, KMeans, Linkage};
//! use somcluster::{Euclidean, WeightGrid};
//!
//! let grid = WeightGrid::from_fn(4, 1, |_, c| vec![if c < 2 { 0.0 } else { 10.0 }]);
//!
//! let labels = HierarchicalClustering::new(2)
//!     .with_linkage(Linkage::Single)
//!     .fit_predict(&grid, &Euclidean)
//!     .unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[2]);
//!
//! let labels = KMeans::new(2).with_seed(3).fit_predict(&grid, &Euclidean).unwrap();
//! assert_eq!(labels[2], labels[3]);
//! assert_ne!(labels[1], labels[2]);
//! ```

mod agglomerate;
mod complete;
mod hierarchical;
mod kmeans;
mod partition;
mod queue;
mod seed;
mod single;
mod traits;
mod ward;

pub use agglomerate::ess_increase;
pub use complete::{CollisionPolicy, CompleteLinkage};
pub use hierarchical::{HierarchicalClustering, Linkage};
pub use kmeans::{Convergence, InitType, KMeans, QUIESCENT_WINDOW};
pub use partition::{FlatCluster, FlatPartition};
pub use queue::{MergeCandidate, MergeQueue};
pub use seed::Neighborhood;
pub use single::SingleLinkage;
pub use traits::{Clustering, LinkageBuilder};
pub use ward::{WardLinkage, WardMode};
